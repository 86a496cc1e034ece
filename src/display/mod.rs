//! Display engine and its process-wide entry points.
//!
//! A [`Display`] is created explicitly for one output stream. Installing it
//! with [`install`] makes it reachable from code that has no handle, such as
//! gauge factories and the console log layer; the free functions here
//! delegate to the installed display and do nothing when none is installed.

mod engine;
mod ticker;

pub use engine::{Display, DisplayConfig, RefreshMode, DEFAULT_REFRESH_INTERVAL};

use crate::error::DisplayError;
use crate::gauge::Gauge;
use parking_lot::RwLock;
use std::sync::Arc;

static INSTALLED: RwLock<Option<Display>> = parking_lot::const_rwlock(None);

/// Make `display` the process-wide display, returning the previous one.
pub fn install(display: Display) -> Option<Display> {
    INSTALLED.write().replace(display)
}

/// Remove the process-wide display, returning it.
pub fn uninstall() -> Option<Display> {
    INSTALLED.write().take()
}

/// Uninstall the process-wide display if it is `display`.
pub(crate) fn uninstall_if(display: &Display) {
    let mut slot = INSTALLED.write();
    if slot.as_ref().is_some_and(|installed| installed.ptr_eq(display)) {
        *slot = None;
    }
}

/// Handle to the process-wide display, if one is installed.
pub fn installed() -> Option<Display> {
    INSTALLED.read().clone()
}

/// Add a gauge to the installed display.
pub fn add_gauge(gauge: Arc<dyn Gauge>) -> Result<(), DisplayError> {
    match installed() {
        Some(display) => display.add_gauge(gauge),
        None => Ok(()),
    }
}

/// Remove a gauge from the installed display.
pub fn remove_gauge<G: Gauge + ?Sized>(gauge: &G) -> Result<(), DisplayError> {
    match installed() {
        Some(display) => display.remove_gauge(gauge),
        None => Ok(()),
    }
}

/// Write a line of text through the installed display.
pub fn write_text(text: &str) -> Result<(), DisplayError> {
    match installed() {
        Some(display) => display.write_text(text),
        None => Ok(()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::{ProgressBar, ProgressOptions};
    use crate::terminal::CaptureStream;

    #[test]
    fn test_entry_points_without_display() {
        let _serial = testing::GLOBAL.lock();
        uninstall();

        let bar = Arc::new(ProgressBar::new(ProgressOptions::new("x")));
        add_gauge(bar.clone()).unwrap();
        write_text("nowhere").unwrap();
        remove_gauge(bar.as_ref()).unwrap();
        assert!(installed().is_none());
    }

    #[test]
    fn test_entry_points_delegate() {
        let _serial = testing::GLOBAL.lock();
        let capture = CaptureStream::plain();
        let display = Display::new(capture.clone()).unwrap();
        assert!(install(display.clone()).is_none());

        let bar = Arc::new(ProgressBar::new(ProgressOptions::new("x")));
        add_gauge(bar.clone()).unwrap();
        assert_eq!(display.gauge_count(), 1);
        write_text("hello").unwrap();
        assert_eq!(capture.text(), "hello\n");
        remove_gauge(bar.as_ref()).unwrap();
        assert_eq!(display.gauge_count(), 0);

        assert!(uninstall().is_some());
        write_text("dropped").unwrap();
        assert_eq!(capture.text(), "hello\n");
    }
}
