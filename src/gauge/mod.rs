//! Gauges: live single-line widgets pinned below the log output.
//!
//! This module defines the [`Gauge`] trait the display engine draws, the
//! [`GaugeEvents`] channel gauges notify it through, and the stock gauges.
//!
//! # Example
//!
//! ```rust,ignore
//! use gaugeline::gauge::{ProgressBar, ProgressOptions};
//!
//! let bar = Arc::new(ProgressBar::new(ProgressOptions::new("files").total(100)));
//! display.add_gauge(bar.clone())?;
//! for _ in 0..100 {
//!     bar.advance(1);
//! }
//! bar.finish();
//! ```

pub mod meter;
mod progress_bar;
mod traits;

pub use meter::MeterBar;
pub use progress_bar::{progress_bar, FinishGuard, ProgressBar, ProgressOptions};
pub use traits::{Gauge, GaugeEvent, GaugeEvents, SubscriptionId};
