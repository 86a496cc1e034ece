//! `OutputBuffer`: Single-write output buffer for ANSI sequences.

use super::ansi;
use std::fmt::Write as _;

/// Pre-allocated buffer for building one display operation.
///
/// All control codes and text for an operation are accumulated here, then
/// handed to the stream in a single blocking write so that nothing else can
/// land between a cursor save and its restore.
pub struct OutputBuffer {
    data: String,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: String::with_capacity(capacity),
        }
    }

    /// Create a buffer sized for a typical gauge stack (4KB).
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Clear the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Get the buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a string.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.push_str(s);
    }

    /// Write `n` newlines.
    #[inline]
    pub fn newlines(&mut self, n: usize) {
        for _ in 0..n {
            self.data.push('\n');
        }
    }

    /// Move cursor to (row, col), 1-indexed.
    #[inline]
    pub fn cursor_to(&mut self, row: usize, col: usize) {
        // CSI row ; col H
        let _ = write!(self.data, "{}{row};{col}H", ansi::CSI);
    }

    /// Move cursor up `n` rows. Zero is a no-op.
    #[inline]
    pub fn cursor_up(&mut self, n: usize) {
        if n > 0 {
            let _ = write!(self.data, "{}{n}A", ansi::CSI);
        }
    }

    /// Save cursor position.
    #[inline]
    pub fn save_cursor(&mut self) {
        self.data.push_str(ansi::save_cursor());
    }

    /// Restore cursor position.
    #[inline]
    pub fn restore_cursor(&mut self) {
        self.data.push_str(ansi::restore_cursor());
    }

    /// Erase to end of line.
    #[inline]
    pub fn erase_line(&mut self) {
        let _ = write!(self.data, "{}0K", ansi::CSI);
    }

    /// Set the scroll region to rows `top..=bottom`.
    #[inline]
    pub fn scroll_region(&mut self, top: usize, bottom: usize) {
        let _ = write!(self.data, "{}{top};{bottom}r", ansi::CSI);
    }

    /// Reset the scroll region to the full screen.
    #[inline]
    pub fn reset_scroll_region(&mut self) {
        let _ = write!(self.data, "{}r", ansi::CSI);
    }

    /// Enable or disable autowrap.
    #[inline]
    pub fn autowrap(&mut self, enabled: bool) {
        self.data.push_str(ansi::autowrap(enabled));
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_matches_primitives() {
        let mut out = OutputBuffer::new();
        out.save_cursor();
        out.scroll_region(1, 20);
        out.cursor_to(21, 1);
        out.erase_line();
        out.reset_scroll_region();
        out.restore_cursor();

        let expected = [
            ansi::save_cursor().to_string(),
            ansi::scroll_region(1, 20),
            ansi::cursor_to(21, 1),
            ansi::erase_line(),
            ansi::reset_scroll_region(),
            ansi::restore_cursor().to_string(),
        ]
        .concat();
        assert_eq!(out.as_bytes(), expected.as_bytes());
    }

    #[test]
    fn test_cursor_up_zero_is_noop() {
        let mut out = OutputBuffer::new();
        out.cursor_up(0);
        assert!(out.is_empty());
        out.cursor_up(2);
        assert_eq!(out.as_bytes(), b"\x1b[2A");
    }
}
