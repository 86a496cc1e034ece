//! Display engine: shares one terminal between scrolling text and gauges.
//!
//! The engine pins its gauges to the bottom rows of the screen with a scroll
//! region. Log text written through [`Display::write_text`] scrolls inside
//! rows `1..=height-N`; the `N` gauge rows below it never move.
//!
//! # Layout
//!
//! ```text
//! row 1          ┐
//! ...            │ scroll region: log text, cursor lives here
//! row height-N   ┘
//! row height-N+1   gauge 0 (oldest)
//! ...
//! row height       gauge N-1 (newest)
//! ```
//!
//! # Invariant
//!
//! Between operations the cursor is wherever log text continues, inside the
//! scroll region, and the region excludes exactly the rows the engine has
//! reserved. Every redraw saves the cursor, draws with absolute positioning,
//! and restores it, all in one write.

use super::ticker::{join_timer, RefreshTimer};
use crate::error::DisplayError;
use crate::gauge::{Gauge, GaugeEvent, SubscriptionId};
use crate::terminal::ansi::strip_ansi;
use crate::terminal::{OutputBuffer, StreamId, TermStream};
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Streams that currently have a display engine attached.
static CLAIMED: Mutex<Vec<StreamId>> = parking_lot::const_mutex(Vec::new());

/// Default redraw interval while gauges are active.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(40);

/// Configuration for the display engine.
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Redraw interval while any gauge is active.
    pub refresh_interval: Duration,
    /// Force styling codes on or off. `None` enables them on terminals only.
    pub force_color: Option<bool>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            force_color: None,
        }
    }
}

/// How [`Display::refresh`] schedules further redraws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Draw once; leave the timer alone.
    OneShot,
    /// Draw, and arm the refresh timer if gauges remain.
    #[default]
    Timer,
}

/// An active gauge and our subscription to its events.
struct GaugeEntry {
    gauge: Arc<dyn Gauge>,
    key: usize,
    subscription: SubscriptionId,
}

/// Everything behind the engine's lock.
struct DisplayState {
    /// The owned output stream.
    stream: Box<dyn TermStream>,
    /// Claim to release on close.
    claim: Option<StreamId>,
    /// Active gauges, top to bottom.
    gauges: Vec<GaugeEntry>,
    /// Whether the stream is an interactive terminal.
    active: bool,
    /// Whether styling codes are passed through.
    color_enabled: bool,
    /// Rows currently reserved at the bottom of the screen.
    reserved: usize,
    /// Screen size at the last draw.
    height: usize,
    width: usize,
    /// The armed refresh timer, if any.
    timer: Option<RefreshTimer>,
    /// Generation of the most recently armed timer.
    generation: u64,
    /// Set once by shutdown.
    closed: bool,
    /// Reused output buffer.
    out: OutputBuffer,
}

struct Shared {
    state: Mutex<DisplayState>,
    interval: Duration,
}

/// Handle to a display engine. Clones share the same engine.
#[derive(Clone)]
pub struct Display {
    shared: Arc<Shared>,
}

/// Identity of a gauge: the address of its data.
fn gauge_key<G: Gauge + ?Sized>(gauge: &G) -> usize {
    (gauge as *const G).cast::<()>() as usize
}

impl Display {
    /// Attach a display engine to `stream` with the default configuration.
    pub fn new(stream: impl TermStream + 'static) -> Result<Self, DisplayError> {
        Self::with_config(stream, DisplayConfig::default())
    }

    /// Attach a display engine to `stream`.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::AlreadyActive`] if another engine owns the
    /// same stream.
    pub fn with_config(
        stream: impl TermStream + 'static,
        config: DisplayConfig,
    ) -> Result<Self, DisplayError> {
        let claim = stream.id();
        if let Some(id) = claim {
            let mut claimed = CLAIMED.lock();
            if claimed.contains(&id) {
                return Err(DisplayError::AlreadyActive(id));
            }
            claimed.push(id);
        }

        let active = stream.is_terminal();
        let color_enabled = config.force_color.unwrap_or(active);

        let state = DisplayState {
            stream: Box::new(stream),
            claim,
            gauges: Vec::new(),
            active,
            color_enabled,
            reserved: 0,
            height: 0,
            width: 0,
            timer: None,
            generation: 0,
            closed: false,
            out: OutputBuffer::new(),
        };

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                interval: config.refresh_interval,
            }),
        })
    }

    /// Register a gauge below the existing ones and redraw.
    ///
    /// Adding a gauge that is already displayed does nothing.
    pub fn add_gauge(&self, gauge: Arc<dyn Gauge>) -> Result<(), DisplayError> {
        let key = gauge_key(gauge.as_ref());
        let count = {
            let mut st = self.shared.state.lock();
            if st.closed {
                return Err(DisplayError::Closed);
            }
            if st.position(key).is_some() {
                return Ok(());
            }

            let weak = Arc::downgrade(&self.shared);
            let subscription = gauge.events().subscribe(move |event| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_gauge_event(key, event);
                }
            });
            st.gauges.push(GaugeEntry {
                gauge,
                key,
                subscription,
            });
            self.shared.refresh_locked(&mut st, RefreshMode::Timer)?;
            st.gauges.len()
        };

        tracing::trace!(target: "gaugeline::display", "added gauge ({count} total)");
        Ok(())
    }

    /// Remove a gauge and reclaim its row. Unknown gauges are ignored.
    pub fn remove_gauge<G: Gauge + ?Sized>(&self, gauge: &G) -> Result<(), DisplayError> {
        self.shared.remove_key(gauge_key(gauge))
    }

    /// Write a line of ordinary output above the gauges.
    ///
    /// A trailing newline is added if missing. Styling codes are stripped
    /// when color is disabled.
    pub fn write_text(&self, text: &str) -> Result<(), DisplayError> {
        let mut st = self.shared.state.lock();
        if st.closed {
            return Err(DisplayError::Closed);
        }

        let text = if st.color_enabled {
            std::borrow::Cow::Borrowed(text)
        } else {
            strip_ansi(text)
        };

        st.out.clear();
        st.out.write_str(&text);
        if !text.ends_with('\n') {
            st.out.write_str("\n");
        }
        // Text scrolls inside the region, so gauges only need redrawing
        // when the screen or the stack changed under them.
        if st.layout_changed() {
            st.compose_gauges();
        }
        st.flush()?;
        Ok(())
    }

    /// Redraw the gauges now.
    ///
    /// With [`RefreshMode::Timer`] the refresh timer is armed if gauges
    /// remain; with no gauges left any armed timer is cleared.
    pub fn refresh(&self, mode: RefreshMode) -> Result<(), DisplayError> {
        let mut st = self.shared.state.lock();
        if st.closed {
            return Err(DisplayError::Closed);
        }
        self.shared.refresh_locked(&mut st, mode)
    }

    /// Clear the gauges and give the terminal back.
    ///
    /// Cancels the refresh timer, erases the gauge rows, resets the scroll
    /// region and releases the stream. Safe to call more than once; later
    /// calls do nothing. Every other operation fails with
    /// [`DisplayError::Closed`] afterwards.
    pub fn shutdown(&self) -> Result<(), DisplayError> {
        let (handle, result) = {
            let mut st = self.shared.state.lock();
            if st.closed {
                return Ok(());
            }
            let handle = st.timer.take().and_then(RefreshTimer::cancel);
            (handle, st.close())
        };

        // The tick callback takes the state lock, so join outside it.
        if let Some(handle) = handle {
            join_timer(handle);
        }
        result.map_err(DisplayError::from)
    }

    /// Whether both handles refer to the same engine.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Number of active gauges.
    pub fn gauge_count(&self) -> usize {
        self.shared.state.lock().gauges.len()
    }

    /// Rows currently reserved for gauges at the bottom of the screen.
    pub fn reserved_rows(&self) -> usize {
        self.shared.state.lock().reserved
    }

    /// Whether the stream is an interactive terminal.
    pub fn is_active(&self) -> bool {
        self.shared.state.lock().active
    }

    /// Whether styling codes are passed through.
    pub fn color_enabled(&self) -> bool {
        self.shared.state.lock().color_enabled
    }

    /// Whether the refresh timer is armed.
    pub fn timer_armed(&self) -> bool {
        self.shared.state.lock().timer.is_some()
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.shared.state.lock();
        f.debug_struct("Display")
            .field("gauges", &st.gauges.len())
            .field("reserved", &st.reserved)
            .field("active", &st.active)
            .field("closed", &st.closed)
            .finish_non_exhaustive()
    }
}

impl Shared {
    /// Draw the gauges and manage the timer. Caller holds the lock.
    fn refresh_locked(
        self: &Arc<Self>,
        st: &mut DisplayState,
        mode: RefreshMode,
    ) -> Result<(), DisplayError> {
        st.out.clear();
        st.compose_gauges();
        st.flush()?;

        if st.gauges.is_empty() {
            st.timer = None;
        } else if mode == RefreshMode::Timer && st.active && st.timer.is_none() {
            st.generation += 1;
            let generation = st.generation;
            let weak = Arc::downgrade(self);
            let timer = RefreshTimer::spawn(self.interval, generation, move || {
                weak.upgrade().is_some_and(|shared| shared.tick(generation))
            })?;
            st.timer = Some(timer);
        }
        Ok(())
    }

    /// One timer tick. Returns `false` when the timer should stop.
    fn tick(&self, generation: u64) -> bool {
        let flushed = {
            let mut st = self.state.lock();
            let current = st.timer.as_ref().map(RefreshTimer::generation);
            if st.closed || current != Some(generation) {
                return false;
            }
            if st.gauges.is_empty() {
                st.timer = None;
                return false;
            }

            st.out.clear();
            st.compose_gauges();
            st.flush()
        };

        // The timer keeps running; the next operation on the stream
        // returns a persistent failure to its caller.
        if let Err(err) = flushed {
            tracing::trace!(target: "gaugeline::display", "timer redraw failed: {err}");
        }
        true
    }

    fn remove_key(&self, key: usize) -> Result<(), DisplayError> {
        let remaining = {
            let mut st = self.state.lock();
            if st.closed {
                return Err(DisplayError::Closed);
            }
            let Some(index) = st.position(key) else {
                return Ok(());
            };

            let entry = st.gauges.remove(index);
            entry.gauge.events().unsubscribe(entry.subscription);
            if st.gauges.is_empty() {
                // Dropping disconnects the timer; it exits without drawing.
                st.timer = None;
            }

            st.out.clear();
            st.compose_gauges();
            st.flush()?;
            st.gauges.len()
        };

        tracing::trace!(target: "gaugeline::display", "removed gauge ({remaining} left)");
        Ok(())
    }

    fn on_gauge_event(self: &Arc<Self>, key: usize, event: GaugeEvent) {
        match event {
            GaugeEvent::Refresh => {
                let mut st = self.state.lock();
                // An armed timer picks the change up on its next tick.
                if st.closed || st.timer.is_some() {
                    return;
                }
                let _ = self.refresh_locked(&mut st, RefreshMode::Timer);
            }
            GaugeEvent::Finish => {
                let _ = self.remove_key(key);
            }
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let st = self.state.get_mut();
        if !st.closed {
            st.timer = None;
            let _ = st.close();
        }
    }
}

impl DisplayState {
    fn position(&self, key: usize) -> Option<usize> {
        self.gauges.iter().position(|entry| entry.key == key)
    }

    /// Whether the terminal size or gauge count moved since the last draw.
    fn layout_changed(&self) -> bool {
        if !self.active {
            return false;
        }
        let Some(size) = self.stream.size() else {
            return false;
        };
        let height = usize::from(size.rows);
        let width = usize::from(size.columns);
        let wanted = self.gauges.len().min(height.saturating_sub(1));
        height != self.height || width != self.width || wanted != self.reserved
    }

    /// Append a full redraw of the gauge region to the output buffer.
    ///
    /// Does nothing on non-terminals, on terminals of unknown size, and when
    /// there is nothing reserved and nothing to draw.
    fn compose_gauges(&mut self) {
        if !self.active {
            return;
        }
        let Some(size) = self.stream.size() else {
            return;
        };
        let height = usize::from(size.rows);
        let width = usize::from(size.columns);

        // Keep at least one row for the scroll region.
        let wanted = self.gauges.len().min(height.saturating_sub(1));
        if wanted == 0 && self.reserved == 0 {
            return;
        }

        // Growing the stack: scroll the log text up until the cursor sits
        // above the rows about to be reserved. Newlines at the bottom of the
        // current region scroll it; elsewhere they just move down.
        let grow = wanted.saturating_sub(self.reserved);
        self.out.newlines(grow);
        self.out.cursor_up(grow);

        self.out.save_cursor();
        if wanted > 0 {
            self.out.scroll_region(1, height - wanted);
        } else {
            self.out.reset_scroll_region();
        }
        self.out.autowrap(false);

        // Rows given back to the log area.
        let first_gauge_row = height - wanted + 1;
        let first_reserved_row = height.saturating_sub(self.reserved) + 1;
        for row in first_reserved_row..first_gauge_row {
            self.out.cursor_to(row, 1);
            self.out.erase_line();
        }

        for (i, entry) in self.gauges.iter().take(wanted).enumerate() {
            let rendered = entry.gauge.render(width);
            let line = rendered.replace(['\r', '\n'], " ");
            self.out.cursor_to(first_gauge_row + i, 1);
            self.out.erase_line();
            if self.color_enabled {
                self.out.write_str(&line);
            } else {
                self.out.write_str(&strip_ansi(&line));
            }
        }

        self.out.autowrap(true);
        self.out.restore_cursor();

        self.reserved = wanted;
        self.height = height;
        self.width = width;
    }

    /// Write the output buffer to the stream.
    fn flush(&mut self) -> io::Result<()> {
        if self.out.is_empty() {
            return Ok(());
        }
        let result = self.stream.write_all(self.out.as_bytes());
        self.out.clear();
        result
    }

    /// Erase the gauge rows, reset the scroll region and release the stream.
    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        for entry in self.gauges.drain(..) {
            entry.gauge.events().unsubscribe(entry.subscription);
        }
        if let Some(id) = self.claim.take() {
            CLAIMED.lock().retain(|claimed| *claimed != id);
        }

        if !self.active || self.reserved == 0 {
            return Ok(());
        }

        let height = self
            .stream
            .size()
            .map_or(self.height, |size| usize::from(size.rows));
        self.out.clear();
        self.out.save_cursor();
        self.out.reset_scroll_region();
        for row in (height.saturating_sub(self.reserved) + 1)..=height {
            self.out.cursor_to(row, 1);
            self.out.erase_line();
        }
        self.out.restore_cursor();
        self.reserved = 0;
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::{GaugeEvents, ProgressBar, ProgressOptions};
    use crate::terminal::{CaptureStream, TermSize};
    use std::thread;

    /// A gauge that renders fixed text.
    struct Label {
        text: Mutex<String>,
        events: GaugeEvents,
    }

    impl Label {
        fn new(text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: Mutex::new(text.to_string()),
                events: GaugeEvents::new(),
            })
        }

        fn set(&self, text: &str) {
            *self.text.lock() = text.to_string();
        }
    }

    impl Gauge for Label {
        fn render(&self, width: usize) -> String {
            self.text.lock().chars().take(width).collect()
        }

        fn events(&self) -> &GaugeEvents {
            &self.events
        }
    }

    /// Config with a timer slow enough not to interfere.
    fn quiet() -> DisplayConfig {
        DisplayConfig {
            refresh_interval: Duration::from_secs(30),
            force_color: None,
        }
    }

    /// Replay captured output through a terminal emulator.
    fn screen(capture: &CaptureStream, rows: u16, cols: u16) -> vt100::Parser {
        let mut parser = vt100::Parser::new(rows, cols, 0);
        // The tty driver turns LF into CRLF on output.
        parser.process(capture.text().replace('\n', "\r\n").as_bytes());
        parser
    }

    fn rows(parser: &vt100::Parser, cols: u16) -> Vec<String> {
        parser
            .screen()
            .rows(0, cols)
            .map(|row| row.trim_end().to_string())
            .collect()
    }

    #[test]
    fn test_gauges_pinned_below_text() {
        let capture = CaptureStream::terminal(6, 20);
        let display = Display::with_config(capture.clone(), quiet()).unwrap();

        display.write_text("one").unwrap();
        display.write_text("two\n").unwrap();
        display.add_gauge(Label::new("A")).unwrap();
        display.add_gauge(Label::new("B")).unwrap();
        display.write_text("three").unwrap();

        let parser = screen(&capture, 6, 20);
        assert_eq!(rows(&parser, 20), vec!["one", "two", "three", "", "A", "B"]);
        assert_eq!(parser.screen().cursor_position(), (3, 0));
        assert_eq!(display.reserved_rows(), 2);
        display.shutdown().unwrap();
    }

    #[test]
    fn test_log_scrolls_above_gauge() {
        let capture = CaptureStream::terminal(5, 20);
        let display = Display::with_config(capture.clone(), quiet()).unwrap();
        display.add_gauge(Label::new("status")).unwrap();

        for i in 1..=10 {
            display.write_text(&format!("line {i}")).unwrap();
        }

        let parser = screen(&capture, 5, 20);
        assert_eq!(
            rows(&parser, 20),
            vec!["line 8", "line 9", "line 10", "", "status"]
        );
        display.shutdown().unwrap();
    }

    #[test]
    fn test_growth_scrolls_text_at_bottom() {
        let capture = CaptureStream::terminal(4, 20);
        let display = Display::with_config(capture.clone(), quiet()).unwrap();
        for word in ["a", "b", "c", "d"] {
            display.write_text(word).unwrap();
        }
        display.add_gauge(Label::new("G")).unwrap();

        let parser = screen(&capture, 4, 20);
        // The newest text line stays visible above the gauge.
        assert_eq!(rows(&parser, 20), vec!["c", "d", "", "G"]);
        display.shutdown().unwrap();
    }

    #[test]
    fn test_gauges_capped_at_height_minus_one() {
        let capture = CaptureStream::terminal(3, 10);
        let display = Display::with_config(capture.clone(), quiet()).unwrap();
        for name in ["g0", "g1", "g2", "g3"] {
            display.add_gauge(Label::new(name)).unwrap();
        }
        assert_eq!(display.gauge_count(), 4);
        assert_eq!(display.reserved_rows(), 2);

        let parser = screen(&capture, 3, 10);
        assert_eq!(rows(&parser, 10), vec!["", "g0", "g1"]);
        display.shutdown().unwrap();
    }

    #[test]
    fn test_remove_gauge_reclaims_rows() {
        let capture = CaptureStream::terminal(6, 20);
        let display = Display::with_config(capture.clone(), quiet()).unwrap();
        let a = Label::new("A");
        let b = Label::new("B");
        display.add_gauge(a.clone()).unwrap();
        display.add_gauge(b.clone()).unwrap();
        assert!(display.timer_armed());

        display.remove_gauge(a.as_ref()).unwrap();
        assert_eq!(display.reserved_rows(), 1);
        assert_eq!(a.events().listener_count(), 0);
        let parser = screen(&capture, 6, 20);
        assert_eq!(rows(&parser, 20)[4..], ["", "B"]);

        // removing twice is harmless
        display.remove_gauge(a.as_ref()).unwrap();

        display.remove_gauge(b.as_ref()).unwrap();
        assert_eq!(display.reserved_rows(), 0);
        assert!(!display.timer_armed());
        let parser = screen(&capture, 6, 20);
        assert!(rows(&parser, 20).iter().all(String::is_empty));
        display.shutdown().unwrap();
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let capture = CaptureStream::terminal(6, 20);
        let display = Display::with_config(capture, quiet()).unwrap();
        let a = Label::new("A");
        display.add_gauge(a.clone()).unwrap();
        display.add_gauge(a.clone()).unwrap();
        assert_eq!(display.gauge_count(), 1);
        assert_eq!(a.events().listener_count(), 1);
        display.shutdown().unwrap();
    }

    #[test]
    fn test_non_terminal_writes_plain_text() {
        let capture = CaptureStream::plain();
        let display = Display::new(capture.clone()).unwrap();
        assert!(!display.is_active());
        assert!(!display.color_enabled());

        display.add_gauge(Label::new("hidden")).unwrap();
        display.write_text("\x1b[31mred\x1b[0m").unwrap();
        display.refresh(RefreshMode::Timer).unwrap();

        assert_eq!(capture.text(), "red\n");
        assert_eq!(display.gauge_count(), 1);
        assert_eq!(display.reserved_rows(), 0);
        assert!(!display.timer_armed());
        display.shutdown().unwrap();
        assert_eq!(capture.text(), "red\n");
    }

    #[test]
    fn test_forced_color_off_strips_gauge_styling() {
        let capture = CaptureStream::terminal(4, 20);
        let config = DisplayConfig {
            force_color: Some(false),
            ..quiet()
        };
        let display = Display::with_config(capture.clone(), config).unwrap();
        display.add_gauge(Label::new("\x1b[1mbold\x1b[0m")).unwrap();
        display.write_text("\x1b[32mok\x1b[0m").unwrap();

        let text = capture.text();
        assert!(!text.contains("\x1b[1m"));
        assert!(!text.contains("\x1b[32m"));
        let parser = screen(&capture, 4, 20);
        assert_eq!(rows(&parser, 20)[3], "bold");
        display.shutdown().unwrap();
    }

    #[test]
    fn test_gauge_text_line_breaks_flattened() {
        let capture = CaptureStream::terminal(4, 20);
        let display = Display::with_config(capture.clone(), quiet()).unwrap();
        display.add_gauge(Label::new("a\nb")).unwrap();
        let parser = screen(&capture, 4, 20);
        assert_eq!(rows(&parser, 20), vec!["", "", "", "a b"]);
        display.shutdown().unwrap();
    }

    #[test]
    fn test_second_display_on_same_stream_refused() {
        let id = StreamId::Named("engine-test-claim");
        let first = Display::new(CaptureStream::terminal(4, 20).with_id(id)).unwrap();
        let second = Display::new(CaptureStream::terminal(4, 20).with_id(id));
        assert!(matches!(second, Err(DisplayError::AlreadyActive(got)) if got == id));

        first.shutdown().unwrap();
        let third = Display::new(CaptureStream::terminal(4, 20).with_id(id)).unwrap();
        drop(third);
        // dropping the last handle releases the claim too
        Display::new(CaptureStream::terminal(4, 20).with_id(id)).unwrap();
    }

    #[test]
    fn test_shutdown_restores_terminal() {
        let capture = CaptureStream::terminal(5, 20);
        let display = Display::with_config(capture.clone(), quiet()).unwrap();
        display.write_text("kept").unwrap();
        display.add_gauge(Label::new("G1")).unwrap();
        display.add_gauge(Label::new("G2")).unwrap();

        display.shutdown().unwrap();
        assert!(display.is_closed());
        assert!(!display.timer_armed());
        assert_eq!(display.gauge_count(), 0);
        assert!(capture.text().ends_with("\x1b8"));
        assert!(capture.text().contains("\x1b[r"));

        let parser = screen(&capture, 5, 20);
        assert_eq!(rows(&parser, 20), vec!["kept", "", "", "", ""]);
        assert_eq!(parser.screen().cursor_position(), (1, 0));

        // idempotent, and everything else refuses
        let len = capture.contents().len();
        display.shutdown().unwrap();
        assert_eq!(capture.contents().len(), len);
        assert!(matches!(display.write_text("x"), Err(DisplayError::Closed)));
        assert!(matches!(
            display.add_gauge(Label::new("x")),
            Err(DisplayError::Closed)
        ));
        assert!(matches!(
            display.refresh(RefreshMode::OneShot),
            Err(DisplayError::Closed)
        ));
    }

    #[test]
    fn test_resize_redraws_on_next_write() {
        let capture = CaptureStream::terminal(6, 20);
        let display = Display::with_config(capture.clone(), quiet()).unwrap();
        display.add_gauge(Label::new("G")).unwrap();
        assert!(capture.text().contains("\x1b[1;5r"));

        capture.take();
        capture.resize(8, 30);
        display.write_text("after").unwrap();
        let text = capture.text();
        assert!(text.starts_with("after\n"));
        assert!(text.contains("\x1b[1;7r"));
        assert!(text.contains("\x1b[8;1H"));

        // no layout change: plain text only
        capture.take();
        display.write_text("again").unwrap();
        assert_eq!(capture.text(), "again\n");
        display.shutdown().unwrap();
    }

    #[test]
    fn test_one_shot_refresh_leaves_timer_alone() {
        let capture = CaptureStream::terminal(4, 20);
        let display = Display::with_config(capture.clone(), quiet()).unwrap();
        display.refresh(RefreshMode::OneShot).unwrap();
        assert!(capture.contents().is_empty());

        let label = Label::new("v1");
        display.add_gauge(label.clone()).unwrap();
        label.set("v2");
        display.refresh(RefreshMode::OneShot).unwrap();
        let parser = screen(&capture, 4, 20);
        assert_eq!(rows(&parser, 20)[3], "v2");
        display.shutdown().unwrap();
    }

    #[test]
    fn test_timer_redraws_changed_gauge() {
        let capture = CaptureStream::terminal(4, 20);
        let config = DisplayConfig {
            refresh_interval: Duration::from_millis(10),
            force_color: None,
        };
        let display = Display::with_config(capture.clone(), config).unwrap();
        let label = Label::new("before");
        display.add_gauge(label.clone()).unwrap();
        assert!(display.timer_armed());

        // no event: only the timer can pick this up
        label.set("after");
        thread::sleep(Duration::from_millis(150));

        let parser = screen(&capture, 4, 20);
        assert_eq!(rows(&parser, 20)[3], "after");
        display.shutdown().unwrap();
    }

    #[test]
    fn test_reserved_rows_track_gauge_count() {
        let capture = CaptureStream::terminal(10, 20);
        let display = Display::with_config(capture, quiet()).unwrap();
        let labels: Vec<_> = (0..6).map(|i| Label::new(&format!("g{i}"))).collect();

        // add 0..6, then remove evens, re-add 0, remove everything
        for label in &labels {
            display.add_gauge(label.clone()).unwrap();
            assert_eq!(display.reserved_rows(), display.gauge_count());
        }
        for label in labels.iter().step_by(2) {
            display.remove_gauge(label.as_ref()).unwrap();
            assert_eq!(display.reserved_rows(), display.gauge_count());
        }
        display.add_gauge(labels[0].clone()).unwrap();
        assert_eq!(display.reserved_rows(), 4);
        for label in &labels {
            display.remove_gauge(label.as_ref()).unwrap();
            assert_eq!(display.reserved_rows(), display.gauge_count());
        }
        assert!(!display.timer_armed());
        display.shutdown().unwrap();
    }

    #[test]
    fn test_no_tick_after_shutdown() {
        struct Counting {
            renders: std::sync::atomic::AtomicUsize,
            events: GaugeEvents,
        }

        impl Gauge for Counting {
            fn render(&self, _width: usize) -> String {
                self.renders.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                String::from("tick")
            }

            fn events(&self) -> &GaugeEvents {
                &self.events
            }
        }

        let capture = CaptureStream::terminal(4, 20);
        let config = DisplayConfig {
            refresh_interval: Duration::from_millis(5),
            force_color: None,
        };
        let display = Display::with_config(capture.clone(), config).unwrap();
        let gauge = Arc::new(Counting {
            renders: std::sync::atomic::AtomicUsize::new(0),
            events: GaugeEvents::new(),
        });
        display.add_gauge(gauge.clone()).unwrap();
        thread::sleep(Duration::from_millis(50));
        display.shutdown().unwrap();

        let renders = gauge.renders.load(std::sync::atomic::Ordering::SeqCst);
        assert!(renders > 1, "timer never ticked");
        let written = capture.contents().len();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(gauge.renders.load(std::sync::atomic::Ordering::SeqCst), renders);
        assert_eq!(capture.contents().len(), written);
        assert_eq!(gauge.events().listener_count(), 0);
    }

    #[test]
    fn test_progress_bar_finish_removes_gauge() {
        let capture = CaptureStream::terminal(4, 30);
        let display = Display::with_config(capture, quiet()).unwrap();
        let bar = Arc::new(ProgressBar::new(ProgressOptions::new("job").total(4)));
        display.add_gauge(bar.clone()).unwrap();
        bar.advance(2);
        assert_eq!(display.gauge_count(), 1);

        bar.finish();
        assert_eq!(display.gauge_count(), 0);
        assert_eq!(display.reserved_rows(), 0);
        assert!(!display.timer_armed());
        assert_eq!(bar.events().listener_count(), 0);
        display.shutdown().unwrap();
    }

    #[test]
    fn test_armed_timer_absorbs_refresh_events() {
        let capture = CaptureStream::terminal(4, 30);
        let display = Display::with_config(capture.clone(), quiet()).unwrap();
        let bar = Arc::new(ProgressBar::new(ProgressOptions::new("job").total(4)));
        display.add_gauge(bar.clone()).unwrap();
        assert!(display.timer_armed());

        // An armed timer absorbs refresh events.
        capture.take();
        bar.advance(1);
        assert!(capture.contents().is_empty());
        display.shutdown().unwrap();
    }

    /// Terminal whose writes can be made to fail.
    struct Flaky {
        inner: CaptureStream,
        failing: Arc<std::sync::atomic::AtomicBool>,
    }

    impl TermStream for Flaky {
        fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
            }
            self.inner.write_all(bytes)
        }

        fn is_terminal(&self) -> bool {
            true
        }

        fn size(&self) -> Option<TermSize> {
            self.inner.size()
        }
    }

    #[test]
    fn test_failed_timer_redraw_is_logged() {
        use crate::log::ConsoleLayer;
        use tracing_subscriber::layer::SubscriberExt;

        let failing = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let stream = Flaky {
            inner: CaptureStream::terminal(4, 30),
            failing: failing.clone(),
        };
        let display = Display::with_config(stream, quiet()).unwrap();
        display.add_gauge(Label::new("job")).unwrap();
        let generation = display.shared.state.lock().generation;

        let log = CaptureStream::plain();
        let log_display = Display::new(log.clone()).unwrap();
        let subscriber =
            tracing_subscriber::registry().with(ConsoleLayer::new(log_display.clone(), 2));

        failing.store(true, std::sync::atomic::Ordering::SeqCst);
        let keep_going =
            tracing::subscriber::with_default(subscriber, || display.shared.tick(generation));
        assert!(keep_going);
        assert!(log.text().contains("timer redraw failed: gone"), "{}", log.text());

        failing.store(false, std::sync::atomic::Ordering::SeqCst);
        display.shutdown().unwrap();
        log_display.shutdown().unwrap();
    }
}
