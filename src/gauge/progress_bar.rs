//! Progress Bar Gauge: counts completed work against a total.
//!
//! Renders as `label: ` followed by a two-segment meter, the completed part
//! in the bar's color and the rest in gray, always exactly the requested
//! width.

use super::meter::MeterBar;
use super::traits::{Gauge, GaugeEvent, GaugeEvents};
use crate::display;
use crate::error::DisplayError;
use crate::style::{Style, TermColor};
use crate::terminal::ansi::{fit_width, visible_width};
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::Arc;

/// Options for a new progress bar.
#[derive(Debug, Clone)]
pub struct ProgressOptions {
    /// Label shown before the bar. May carry styling codes.
    pub label: String,
    /// Initial total.
    pub total: u64,
    /// Style of the completed segment.
    pub style: Style,
}

impl ProgressOptions {
    /// Options with the given label, zero total and white bar.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            total: 0,
            style: Style::fg(TermColor::White),
        }
    }

    /// Set the initial total.
    #[must_use]
    pub fn total(mut self, total: u64) -> Self {
        self.total = total;
        self
    }

    /// Set the completed segment's color.
    #[must_use]
    pub fn color(mut self, color: TermColor) -> Self {
        self.style = Style::fg(color);
        self
    }

    /// Set the completed segment's style.
    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    completed: u64,
    total: u64,
    finished: bool,
}

/// A progress bar gauge.
#[derive(Debug)]
pub struct ProgressBar {
    label: String,
    style: Style,
    counts: Mutex<Counts>,
    events: GaugeEvents,
}

impl ProgressBar {
    /// Create an unattached progress bar.
    pub fn new(options: ProgressOptions) -> Self {
        Self {
            label: options.label,
            style: options.style,
            counts: Mutex::new(Counts {
                total: options.total,
                ..Counts::default()
            }),
            events: GaugeEvents::new(),
        }
    }

    /// The bar's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Units completed so far.
    pub fn completed(&self) -> u64 {
        self.counts.lock().completed
    }

    /// Total units.
    pub fn total(&self) -> u64 {
        self.counts.lock().total
    }

    /// Whether [`finish`](Self::finish) has been called.
    pub fn is_finished(&self) -> bool {
        self.counts.lock().finished
    }

    /// Grow the total by `n`.
    pub fn add_to_total(&self, n: u64) {
        {
            let mut counts = self.counts.lock();
            counts.total = counts.total.saturating_add(n);
        }
        self.events.emit(GaugeEvent::Refresh);
    }

    /// Advance the completed count by `n`, which may be negative.
    ///
    /// A step that would take the count below zero clamps it to zero and
    /// logs a warning. Ignored once the bar is finished.
    pub fn advance(&self, n: i64) {
        let clamped = {
            let mut counts = self.counts.lock();
            if counts.finished {
                return;
            }
            match counts.completed.checked_add_signed(n) {
                Some(completed) => {
                    counts.completed = completed;
                    false
                }
                None if n < 0 => {
                    counts.completed = 0;
                    true
                }
                None => {
                    counts.completed = u64::MAX;
                    false
                }
            }
        };

        // The warning goes through the console, which redraws this bar,
        // so the counts lock must be released first.
        if clamped {
            tracing::warn!(
                "{}: negative update made completed negative, clamping to 0",
                self.label
            );
        }
        self.events.emit(GaugeEvent::Refresh);
    }

    /// Mark the bar done. Emits [`GaugeEvent::Finish`] the first time only.
    pub fn finish(&self) {
        {
            let mut counts = self.counts.lock();
            if counts.finished {
                return;
            }
            counts.finished = true;
        }
        self.events.emit(GaugeEvent::Finish);
    }

    /// Wrap the bar so that it finishes when the guard goes out of scope.
    pub fn finish_on_drop(self: &Arc<Self>) -> FinishGuard {
        FinishGuard(self.clone())
    }
}

impl Gauge for ProgressBar {
    fn render(&self, width: usize) -> String {
        let counts = *self.counts.lock();

        let prefix = format!("{}: ", self.label);
        let bar_width = width.saturating_sub(visible_width(&prefix));

        let mut meter = MeterBar::new();
        meter.add_segment(counts.completed, self.style.clone());
        // An over-advanced bar renders full rather than failing.
        let total = counts.total.max(counts.completed);
        if meter.add_remaining(total, Style::fg(TermColor::Gray)).is_err() {
            return fit_width(&prefix, width);
        }

        fit_width(&(prefix + &meter.render(bar_width)), width)
    }

    fn events(&self) -> &GaugeEvents {
        &self.events
    }
}

/// Create a progress bar and add it to the installed display.
///
/// Without an installed display the bar works but is never drawn.
pub fn progress_bar(options: ProgressOptions) -> Result<Arc<ProgressBar>, DisplayError> {
    let bar = Arc::new(ProgressBar::new(options));
    display::add_gauge(bar.clone())?;
    Ok(bar)
}

/// Finishes its progress bar on drop.
#[derive(Debug)]
pub struct FinishGuard(Arc<ProgressBar>);

impl Deref for FinishGuard {
    type Target = ProgressBar;

    fn deref(&self) -> &ProgressBar {
        &self.0
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}
