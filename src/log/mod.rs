//! Logging through the display engine.
//!
//! [`init`] wires a `tracing` subscriber whose console layer writes each
//! event as a styled line above the gauges, plus an optional JSON-lines
//! file layer.
//!
//! ```rust,ignore
//! let _guard = gaugeline::log::init(LogConfig::from_env().verbosity(1))?;
//! tracing::info!("starting");
//! ```

mod config;
mod console;
mod file;
mod level;
mod setup;

pub use config::{LogArgs, LogConfig, ENV_FILE, ENV_FILE_VERBOSE, ENV_START_MARKER, ENV_VERBOSE};
pub use console::{format_elapsed, ConsoleLayer, CONTEXT_FIELD};
pub use file::{FileLayer, FileRecord, FileWriter};
pub use level::{filter_for_verbosity, level_for_verbosity, level_style, LevelStyle};
pub use setup::{build, init, LoggingGuard};
