//! ANSI control sequences: the small subset the display engine needs.
//!
//! Every function here is pure and returns the byte-exact sequence. Rows and
//! columns are 1-indexed, as the terminal sees them.

use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Control Sequence Introducer.
pub const CSI: &str = "\x1b[";

/// Move the cursor up `n` rows.
pub fn cursor_up(n: usize) -> String {
    format!("{CSI}{n}A")
}

/// Move the cursor down `n` rows.
pub fn cursor_down(n: usize) -> String {
    format!("{CSI}{n}B")
}

/// Move the cursor to an absolute position.
pub fn cursor_to(row: usize, col: usize) -> String {
    format!("{CSI}{row};{col}H")
}

/// Erase from the cursor to the end of the current line.
pub fn erase_line() -> String {
    format!("{CSI}0K")
}

/// Which part of the screen [`erase_screen`] clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseMode {
    /// Cursor to end of screen.
    Below = 0,
    /// Start of screen to cursor.
    Above = 1,
    /// Whole screen.
    All = 2,
    /// Whole screen plus scrollback.
    Scrollback = 3,
}

/// Erase part of the screen.
pub fn erase_screen(mode: EraseMode) -> String {
    format!("{CSI}{}J", mode as u8)
}

/// Save cursor position and attributes (DECSC).
pub const fn save_cursor() -> &'static str {
    "\x1b7"
}

/// Restore what [`save_cursor`] saved (DECRC).
pub const fn restore_cursor() -> &'static str {
    "\x1b8"
}

/// Restrict scrolling to rows `top..=bottom` (DECSTBM).
///
/// Terminals home the cursor after this, so callers bracket it with
/// [`save_cursor`] / [`restore_cursor`].
pub fn scroll_region(top: usize, bottom: usize) -> String {
    format!("{CSI}{top};{bottom}r")
}

/// Let the whole screen scroll again.
pub fn reset_scroll_region() -> String {
    format!("{CSI}r")
}

/// Turn automatic line wrap at the right margin on or off (DECAWM).
pub const fn autowrap(enabled: bool) -> &'static str {
    if enabled {
        "\x1b[?7h"
    } else {
        "\x1b[?7l"
    }
}

/// Remove escape sequences (CSI, OSC and two-byte ESC forms) from `text`.
///
/// Returns the input unchanged, without allocating, when it holds no ESC.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        match chars.next() {
            // CSI: parameters and intermediates, then one final byte in @..=~
            Some('[') => {
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            // OSC: runs to BEL or ST (ESC \)
            Some(']') => {
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            Some(_) | None => {}
        }
    }
    Cow::Owned(out)
}

/// Display width of `text` in columns, ignoring escape sequences.
pub fn visible_width(text: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(text).as_ref())
}

/// Clip `text` to `width` columns and pad it with spaces to exactly `width`.
///
/// Escape sequences are kept even past the clip point, so a trailing style
/// reset still lands. A wide character that would straddle the edge is
/// dropped.
pub fn fit_width(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len() + width);
    let mut used = 0;
    let mut clipped = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            out.push(c);
            match chars.next() {
                Some('[') => {
                    out.push('[');
                    for c in chars.by_ref() {
                        out.push(c);
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    out.push(']');
                    while let Some(c) = chars.next() {
                        out.push(c);
                        if c == '\x07' {
                            break;
                        }
                        if c == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            out.push('\\');
                            break;
                        }
                    }
                }
                Some(c) => out.push(c),
                None => {}
            }
            continue;
        }
        if clipped {
            continue;
        }
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            clipped = true;
            continue;
        }
        used += w;
        out.push(c);
    }
    out.push_str(&" ".repeat(width - used));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_sequences() {
        assert_eq!(cursor_up(3), "\x1b[3A");
        assert_eq!(cursor_down(1), "\x1b[1B");
        assert_eq!(cursor_to(24, 1), "\x1b[24;1H");
        assert_eq!(erase_line(), "\x1b[0K");
        assert_eq!(erase_screen(EraseMode::All), "\x1b[2J");
    }

    #[test]
    fn test_scroll_region_sequences() {
        assert_eq!(scroll_region(1, 22), "\x1b[1;22r");
        assert_eq!(reset_scroll_region(), "\x1b[r");
        assert_eq!(save_cursor(), "\x1b7");
        assert_eq!(restore_cursor(), "\x1b8");
    }

    #[test]
    fn test_strip_ansi() {
        assert!(matches!(strip_ansi("plain"), Cow::Borrowed("plain")));
        assert_eq!(strip_ansi("\x1b[1m\x1b[38;5;9mred\x1b[0m!"), "red!");
        assert_eq!(strip_ansi("a\x1b]0;title\x07b"), "ab");
        assert_eq!(strip_ansi("\x1b7x\x1b8"), "x");
    }

    #[test]
    fn test_visible_width() {
        assert_eq!(visible_width("\x1b[32mok\x1b[0m"), 2);
        assert_eq!(visible_width("日本"), 4);
        assert_eq!(visible_width("\u{2588}\u{2588}"), 2);
    }

    #[test]
    fn test_fit_width() {
        assert_eq!(fit_width("abc", 5), "abc  ");
        assert_eq!(fit_width("abcdef", 4), "abcd");
        assert_eq!(fit_width("", 3), "   ");
        assert_eq!(fit_width("abc", 0), "");

        // styling survives the clip, including the reset after it
        let styled = "\x1b[31mred text\x1b[0m";
        assert_eq!(fit_width(styled, 3), "\x1b[31mred\x1b[0m");
        assert_eq!(visible_width(&fit_width(styled, 3)), 3);

        // a wide character never straddles the edge
        assert_eq!(fit_width("a日本", 2), "a ");
        assert_eq!(visible_width(&fit_width("日本語", 5)), 5);
    }
}
