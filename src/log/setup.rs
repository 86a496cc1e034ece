//! Logging setup: display engine, console layer, optional file layer.

use super::config::LogConfig;
use super::console::ConsoleLayer;
use super::file::{FileLayer, FileWriter};
use super::level::filter_for_verbosity;
use crate::display::{self, Display, DisplayConfig};
use crate::error::SetupError;
use crate::terminal::TermStream;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Keeps logging alive. Dropping it (or calling
/// [`shutdown`](Self::shutdown)) closes the log file, clears the gauges and
/// uninstalls the process-wide display.
#[derive(Debug)]
#[must_use = "dropping the guard shuts logging down"]
pub struct LoggingGuard {
    display: Display,
    file: Option<Arc<FileWriter>>,
    done: bool,
}

impl LoggingGuard {
    /// The display engine logging writes through.
    pub const fn display(&self) -> &Display {
        &self.display
    }

    /// Path of the log file, if one is open.
    pub fn log_file(&self) -> Option<&Path> {
        self.file.as_deref().map(FileWriter::path)
    }

    /// Shut logging down. Later calls do nothing.
    pub fn shutdown(&mut self) -> Result<(), SetupError> {
        if self.done {
            return Ok(());
        }
        self.done = true;

        let closed = match self.file.take() {
            Some(file) => file.close().map_err(|source| SetupError::Io {
                context: format!("closing log file {}", file.path().display()),
                source,
            }),
            None => Ok(()),
        };
        display::uninstall_if(&self.display);
        self.display.shutdown()?;
        closed
    }
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Set up process-wide logging.
///
/// Creates the display engine on the configured stream, installs it, and
/// sets the global `tracing` subscriber.
///
/// # Errors
///
/// Fails if the stream already has a display engine, if the log file or
/// start marker cannot be read, or if a global subscriber is already set.
pub fn init(config: LogConfig) -> Result<LoggingGuard, SetupError> {
    let log_file = config.log_file.clone();
    let stream = config.stream;
    let (subscriber, guard) = build(config, stream)?;
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(path) = log_file {
        tracing::info!("writing log output to {}", path.display());
    }
    tracing::debug!("logging initialized");
    Ok(guard)
}

/// Build the subscriber for `config` writing console output to `stream`,
/// without installing it globally.
///
/// The display engine is installed process-wide.
pub fn build(
    config: LogConfig,
    stream: impl TermStream + 'static,
) -> Result<
    (
        impl Subscriber + Send + Sync + for<'a> LookupSpan<'a> + 'static,
        LoggingGuard,
    ),
    SetupError,
> {
    let global_start = match &config.start_marker {
        Some(path) => read_start_marker(path)?,
        None => None,
    };

    // Claim the stream before touching the log file, so a refused setup
    // leaves a running logger's file alone.
    let display = Display::with_config(
        stream,
        DisplayConfig {
            refresh_interval: config.refresh_interval,
            force_color: config.force_color,
        },
    )?;

    let file_layer = match &config.log_file {
        Some(path) => Some(FileLayer::create(path).map_err(|source| SetupError::Io {
            context: format!("opening log file {}", path.display()),
            source,
        })?),
        None => None,
    };
    let file = file_layer.as_ref().map(FileLayer::writer);
    display::install(display.clone());

    let mut console = ConsoleLayer::new(display.clone(), config.verbosity);
    if let Some(process) = &config.process {
        console = console.with_process(process.clone());
    }
    if let Some(start) = global_start {
        console = console.with_global_start(start);
    }

    let file_filter = filter_for_verbosity(config.effective_file_verbosity());
    let subscriber = tracing_subscriber::registry()
        .with(console.with_filter(filter_for_verbosity(config.verbosity)))
        .with(file_layer.map(|layer| layer.with_filter(file_filter)));

    let guard = LoggingGuard {
        display,
        file,
        done: false,
    };
    Ok((subscriber, guard))
}

/// Modification time of the start marker. A missing marker is not an error.
fn read_start_marker(path: &Path) -> Result<Option<SystemTime>, SetupError> {
    let modified = std::fs::metadata(path).and_then(|meta| meta.modified());
    match modified {
        Ok(time) => Ok(Some(time)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SetupError::Io {
            context: format!("reading start marker {}", path.display()),
            source,
        }),
    }
}
