//! Meter bars: proportionally segmented block-character bars.
//!
//! A meter is a list of weighted segments. At render time each segment gets
//! `round(size / total * width)` columns of full blocks, in insertion order,
//! drawn from a shared budget of `width` columns so rounding can never make
//! the bar wider than requested.

use crate::error::MeterError;
use crate::style::Style;

/// The character meters are drawn with.
pub const FULL_BLOCK: char = '\u{2588}';

#[derive(Debug, Clone)]
struct Segment {
    size: u64,
    style: Style,
}

/// A meter bar under construction.
#[derive(Debug, Clone, Default)]
pub struct MeterBar {
    segments: Vec<Segment>,
    total: u64,
}

impl MeterBar {
    /// Create an empty meter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment of weight `size`.
    pub fn add_segment(&mut self, size: u64, style: Style) {
        self.segments.push(Segment { size, style });
        self.total = self.total.saturating_add(size);
    }

    /// Append whatever weight brings the meter's total to `total`.
    ///
    /// Fails, leaving the meter untouched, if `total` is below the weight
    /// already accumulated.
    pub fn add_remaining(&mut self, total: u64, style: Style) -> Result<(), MeterError> {
        if total < self.total {
            return Err(MeterError::TotalBelowAccumulated {
                total,
                accumulated: self.total,
            });
        }
        self.segments.push(Segment {
            size: total - self.total,
            style,
        });
        self.total = total;
        Ok(())
    }

    /// Sum of all segment weights.
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether no segments have been added.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Columns each segment gets at `width`, in insertion order.
    ///
    /// A zero total yields all zeros.
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    #[allow(clippy::cast_precision_loss)]
    pub fn segment_widths(&self, width: usize) -> Vec<usize> {
        if self.total == 0 {
            return vec![0; self.segments.len()];
        }

        let mut remaining = width;
        self.segments
            .iter()
            .map(|seg| {
                let fraction = seg.size as f64 / self.total as f64;
                // f64::round rounds half away from zero
                let n = ((fraction * width as f64).round() as usize).min(remaining);
                remaining -= n;
                n
            })
            .collect()
    }

    /// Render the bar at `width` columns.
    pub fn render(&self, width: usize) -> String {
        let widths = self.segment_widths(width);
        let mut bar = String::with_capacity(width * FULL_BLOCK.len_utf8());
        for (seg, n) in self.segments.iter().zip(widths) {
            if n == 0 {
                continue;
            }
            let blocks: String = std::iter::repeat(FULL_BLOCK).take(n).collect();
            bar.push_str(&seg.style.apply(&blocks));
        }
        bar
    }
}
