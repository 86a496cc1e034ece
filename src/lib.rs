//! # Gaugeline
//!
//! Leveled terminal logging with live progress gauges pinned below the
//! scrolling output.
//!
//! Log lines scroll in the upper part of the terminal while one row per
//! active gauge stays fixed at the bottom, redrawn every 40 ms. When the
//! output is not a terminal, gauges are tracked but never drawn and log
//! text is written plain.
//!
//! ## Core Concepts
//!
//! - **Scroll region**: gauge rows sit outside the terminal's scroll region,
//!   so log text scrolls without disturbing them
//! - **Single flush**: every display operation builds its control codes and
//!   text in one buffer and writes it once
//! - **Gauges**: anything that can render itself into one line and signal
//!   when it changed or finished
//! - **tracing integration**: the console layer routes log events through
//!   the display engine
//!
//! ## Example
//!
//! ```rust,ignore
//! use gaugeline::log::{self, LogConfig};
//! use gaugeline::gauge::{progress_bar, ProgressOptions};
//!
//! let _guard = log::init(LogConfig::from_env())?;
//! let bar = progress_bar(ProgressOptions::new("files").total(100))?;
//! for _ in 0..100 {
//!     tracing::debug!("working");
//!     bar.advance(1);
//! }
//! bar.finish();
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod display;
pub mod error;
pub mod gauge;
pub mod log;
pub mod style;
pub mod terminal;

// Re-exports for convenience
pub use display::{Display, DisplayConfig, RefreshMode};
pub use error::{DisplayError, MeterError, SetupError};
pub use gauge::{progress_bar, Gauge, GaugeEvent, MeterBar, ProgressBar, ProgressOptions};
pub use log::{LogArgs, LogConfig, LoggingGuard};
pub use style::{Style, TermColor};
pub use terminal::{CaptureStream, StdStream, TermStream};
