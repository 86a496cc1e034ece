//! Logging configuration: programmatic, from the environment, and from
//! command-line flags.

use crate::display::DEFAULT_REFRESH_INTERVAL;
use crate::terminal::StdStream;
use clap::ArgAction;
use std::path::PathBuf;
use std::time::Duration;

/// Console verbosity.
pub const ENV_VERBOSE: &str = "GAUGELINE_LOG_VERBOSE";
/// Log file path.
pub const ENV_FILE: &str = "GAUGELINE_LOG_FILE";
/// Log file verbosity.
pub const ENV_FILE_VERBOSE: &str = "GAUGELINE_LOG_FILE_VERBOSE";
/// File whose modification time marks the global start.
pub const ENV_START_MARKER: &str = "GAUGELINE_LOG_STARTMARKER";

/// Logging setup options.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Console verbosity: 0 is INFO, positive is more verbose.
    pub verbosity: i32,
    /// Process label shown on every console line.
    pub process: Option<String>,
    /// Also write JSON lines to this file.
    pub log_file: Option<PathBuf>,
    /// File verbosity; defaults to `verbosity`.
    pub file_verbosity: Option<i32>,
    /// Force styling on or off; `None` decides by terminal detection.
    pub force_color: Option<bool>,
    /// Stream the display engine owns.
    pub stream: StdStream,
    /// Gauge refresh interval.
    pub refresh_interval: Duration,
    /// File whose modification time is the global start time.
    pub start_marker: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            process: None,
            log_file: None,
            file_verbosity: None,
            force_color: None,
            stream: StdStream::Stderr,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            start_marker: None,
        }
    }
}

impl LogConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by variables from `var`. Unparseable numbers are
    /// ignored.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let int = |name: &str| var(name).and_then(|v| v.trim().parse::<i32>().ok());
        let path = |name: &str| var(name).filter(|v| !v.is_empty()).map(PathBuf::from);

        let mut config = Self::default();
        if let Some(verbosity) = int(ENV_VERBOSE) {
            config.verbosity = verbosity;
        }
        config.log_file = path(ENV_FILE);
        config.file_verbosity = int(ENV_FILE_VERBOSE);
        config.start_marker = path(ENV_START_MARKER);

        if int("FORCE_COLOR").is_some_and(|n| n > 0) {
            config.force_color = Some(true);
        } else if var("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            config.force_color = Some(false);
        }
        config
    }

    /// Set the console verbosity.
    #[must_use]
    pub fn verbosity(mut self, verbosity: i32) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the process label.
    #[must_use]
    pub fn process(mut self, process: impl Into<String>) -> Self {
        self.process = Some(process.into());
        self
    }

    /// Also log to `path`.
    #[must_use]
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Effective verbosity of the log file.
    pub fn effective_file_verbosity(&self) -> i32 {
        self.file_verbosity.unwrap_or(self.verbosity)
    }
}

/// Logging flags for a clap command line.
///
/// ```rust,ignore
/// #[derive(clap::Parser)]
/// struct Cli {
///     #[command(flatten)]
///     log: gaugeline::log::LogArgs,
/// }
/// ```
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LogArgs {
    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write a JSON-lines log to PATH (`.zst` to compress)
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Verbosity of the log file
    #[arg(long, value_name = "N", allow_negative_numbers = true, global = true)]
    pub log_file_level: Option<i32>,
}

impl LogArgs {
    /// Combine the flags with the environment.
    pub fn into_config(self) -> LogConfig {
        self.apply(LogConfig::from_env())
    }

    /// Combine the flags with `base`. Explicit flags win.
    pub fn apply(self, mut base: LogConfig) -> LogConfig {
        if self.verbose > 0 {
            base.verbosity = i32::from(self.verbose);
        } else if self.quiet {
            base.verbosity = -1;
        }
        if let Some(path) = self.log_file {
            base.log_file = Some(path);
            base.file_verbosity = None;
        }
        if self.log_file_level.is_some() {
            base.file_verbosity = self.log_file_level;
        }
        base
    }
}
