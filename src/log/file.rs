//! JSON-lines log file writer.
//!
//! Every event becomes one self-contained JSON object on its own line.
//! Paths ending in `.zst` are written as a zstd stream, finished when the
//! writer is closed.

use super::console::MessageVisitor;
use crate::terminal::ansi::strip_ansi;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Compression level for `.zst` log files.
const ZSTD_LEVEL: i32 = 3;

/// One line of a log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Lowercase level name.
    pub level: String,
    /// RFC 3339 timestamp, millisecond precision, UTC.
    pub ts: String,
    /// Event target.
    pub name: String,
    /// Logging context, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Message with styling removed.
    pub message: String,
}

enum Sink {
    Plain(BufWriter<File>),
    Zstd(zstd::stream::write::Encoder<'static, BufWriter<File>>),
}

impl Sink {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Plain(w) => w,
            Self::Zstd(w) => w,
        }
    }

    fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut w) => w.flush(),
            Self::Zstd(w) => w.finish()?.flush(),
        }
    }
}

/// Shared handle to an open log file.
pub struct FileWriter {
    path: PathBuf,
    sink: Mutex<Option<Sink>>,
}

impl FileWriter {
    /// Create or truncate the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = BufWriter::new(File::create(&path)?);
        let sink = if path.extension().is_some_and(|ext| ext == "zst") {
            Sink::Zstd(zstd::stream::write::Encoder::new(file, ZSTD_LEVEL)?)
        } else {
            Sink::Plain(file)
        };
        Ok(Self {
            path,
            sink: Mutex::new(Some(sink)),
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Records written after [`close`](Self::close) are
    /// dropped.
    pub fn write(&self, record: &FileRecord) -> io::Result<()> {
        let line = serde_json::to_string(record).map_err(io::Error::from)?;
        let mut sink = self.sink.lock();
        match sink.as_mut() {
            Some(sink) => writeln!(sink.writer(), "{line}"),
            None => Ok(()),
        }
    }

    /// Flush and close the file, finishing the compressed stream.
    pub fn close(&self) -> io::Result<()> {
        match self.sink.lock().take() {
            Some(sink) => sink.finish(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FileWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileWriter").field("path", &self.path).finish_non_exhaustive()
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// A `tracing` layer that writes events to a [`FileWriter`].
#[derive(Debug)]
pub struct FileLayer {
    writer: Arc<FileWriter>,
}

impl FileLayer {
    /// Open `path` and create a layer writing to it.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            writer: Arc::new(FileWriter::create(path)?),
        })
    }

    /// Handle to the underlying writer, for closing it later.
    pub fn writer(&self) -> Arc<FileWriter> {
        self.writer.clone()
    }
}

impl<S> Layer<S> for FileLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let record = FileRecord {
            level: metadata.level().as_str().to_lowercase(),
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            name: metadata.target().to_string(),
            context: visitor.context.clone(),
            message: strip_ansi(&visitor.message()).into_owned(),
        };
        let _ = self.writer.write(&record);
    }
}
