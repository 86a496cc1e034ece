//! Refresh timer: dedicated thread that re-invokes the display's redraw.
//!
//! The thread sleeps one interval, runs the tick callback, and goes around
//! again for as long as the callback returns `true`. Dropping the timer (or
//! calling [`RefreshTimer::cancel`]) disconnects its channel, which wakes the
//! thread immediately and ends it without another tick.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handle to an armed refresh timer.
#[derive(Debug)]
pub(crate) struct RefreshTimer {
    /// Which arming this is; ticks from older timers are discarded.
    generation: u64,
    /// Dropping the sender cancels the thread.
    cancel: Option<Sender<()>>,
    /// Handle to the timer thread.
    handle: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    /// Spawn a timer calling `tick` every `interval` until it returns `false`
    /// or the timer is cancelled.
    pub(crate) fn spawn<F>(interval: Duration, generation: u64, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        // Nothing is ever sent; the channel only exists to be disconnected.
        let (cancel_tx, cancel_rx) = bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("gaugeline-refresh".to_string())
            .spawn(move || loop {
                match cancel_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !tick() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            generation,
            cancel: Some(cancel_tx),
            handle: Some(handle),
        })
    }

    /// The arming generation this timer was spawned with.
    pub(crate) const fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancel the timer and hand back the thread handle.
    ///
    /// The caller joins it once it no longer holds anything the tick
    /// callback might wait on.
    pub(crate) fn cancel(mut self) -> Option<JoinHandle<()>> {
        self.cancel.take();
        self.handle.take()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        // Disconnect; the thread is detached rather than joined, since the
        // drop may happen on the timer thread itself.
        self.cancel.take();
    }
}

/// Join a cancelled timer thread unless it is the calling thread.
pub(crate) fn join_timer(handle: JoinHandle<()>) {
    if handle.thread().id() != thread::current().id() {
        let _ = handle.join();
    }
}
