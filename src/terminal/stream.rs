//! Output streams the display engine can own.
//!
//! A stream is a blocking byte sink that can tell whether it is an
//! interactive terminal and, if so, how big that terminal is right now.

use crossterm::tty::IsTty;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSize {
    /// Number of rows.
    pub rows: u16,
    /// Number of columns.
    pub columns: u16,
}

impl TermSize {
    /// Create a new size.
    pub const fn new(rows: u16, columns: u16) -> Self {
        Self { rows, columns }
    }
}

/// Identity of a process-wide stream, used to refuse a second display
/// engine on the same stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamId {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// Any other shared sink, by name.
    Named(&'static str),
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// A synchronous byte sink with terminal capability queries.
pub trait TermStream: Send {
    /// Write all bytes and flush. Must block until the bytes are handed off.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Whether this stream is an interactive terminal.
    fn is_terminal(&self) -> bool;

    /// Current terminal size, queried fresh on every call.
    ///
    /// `None` when the size is unknown.
    fn size(&self) -> Option<TermSize>;

    /// Process-wide identity, if this stream has one.
    fn id(&self) -> Option<StreamId> {
        None
    }
}

/// One of the process's standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdStream {
    /// Standard output.
    Stdout,
    /// Standard error (the usual home of log output).
    #[default]
    Stderr,
}

impl TermStream for StdStream {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(bytes)?;
                out.flush()
            }
            Self::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(bytes)?;
                err.flush()
            }
        }
    }

    fn is_terminal(&self) -> bool {
        match self {
            Self::Stdout => io::stdout().is_tty(),
            Self::Stderr => io::stderr().is_tty(),
        }
    }

    /// Size of the controlling terminal, which need not be this stream.
    fn size(&self) -> Option<TermSize> {
        match crossterm::terminal::size() {
            Ok((columns, rows)) if rows > 0 && columns > 0 => Some(TermSize { rows, columns }),
            _ => None,
        }
    }

    fn id(&self) -> Option<StreamId> {
        Some(match self {
            Self::Stdout => StreamId::Stdout,
            Self::Stderr => StreamId::Stderr,
        })
    }
}

/// In-memory stream that records everything written to it.
///
/// Clones share the same buffer, so a test can hand one clone to the display
/// engine and inspect the output through another.
#[derive(Clone)]
pub struct CaptureStream {
    data: Arc<Mutex<Vec<u8>>>,
    size: Arc<Mutex<Option<TermSize>>>,
    terminal: bool,
    id: Option<StreamId>,
}

impl CaptureStream {
    /// A capture that claims to be an interactive terminal of the given size.
    pub fn terminal(rows: u16, columns: u16) -> Self {
        Self {
            data: Arc::default(),
            size: Arc::new(Mutex::new(Some(TermSize { rows, columns }))),
            terminal: true,
            id: None,
        }
    }

    /// A capture that behaves like a pipe or file.
    pub fn plain() -> Self {
        Self {
            data: Arc::default(),
            size: Arc::default(),
            terminal: false,
            id: None,
        }
    }

    /// Give the capture a process-wide identity, so that only one display
    /// engine may own it at a time.
    #[must_use]
    pub fn with_id(mut self, id: StreamId) -> Self {
        self.id = Some(id);
        self
    }

    /// Change the reported size; the next redraw picks it up.
    pub fn resize(&self, rows: u16, columns: u16) {
        *self.size.lock() = Some(TermSize { rows, columns });
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    /// Everything written so far, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data.lock()).into_owned()
    }

    /// Take and clear the recorded output.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.data.lock())
    }
}

impl fmt::Debug for CaptureStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureStream")
            .field("bytes", &self.data.lock().len())
            .field("size", &*self.size.lock())
            .field("terminal", &self.terminal)
            .finish()
    }
}

impl TermStream for CaptureStream {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.data.lock().extend_from_slice(bytes);
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn size(&self) -> Option<TermSize> {
        if self.terminal {
            *self.size.lock()
        } else {
            None
        }
    }

    fn id(&self) -> Option<StreamId> {
        self.id
    }
}
