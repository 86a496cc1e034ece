//! Gauge trait and the notification channel gauges use to talk to the display.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Notification a gauge sends to whoever displays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GaugeEvent {
    /// The gauge's content changed and it wants a redraw.
    Refresh,
    /// The gauge is done and should be removed.
    Finish,
}

/// Handle returned by [`GaugeEvents::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(GaugeEvent) + Send + Sync>;

/// Listener list embedded in every gauge.
///
/// Listeners run on the thread that emits, after the list lock is released,
/// so a listener may subscribe or unsubscribe without deadlocking.
#[derive(Default)]
pub struct GaugeEvents {
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl GaugeEvents {
    /// Create an empty listener list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe(&self, listener: impl Fn(GaugeEvent) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    /// Deliver an event to every current listener.
    pub fn emit(&self, event: GaugeEvent) {
        let snapshot: Vec<Listener> = self.listeners.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl fmt::Debug for GaugeEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaugeEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A live single-line widget displayed below the scrolling log output.
///
/// Gauges are identified by reference: the display engine holds them as
/// `Arc<dyn Gauge>` and compares pointers. A gauge that has emitted
/// [`GaugeEvent::Finish`] must not be added again.
pub trait Gauge: Send + Sync {
    /// Render to at most `width` columns, without a trailing newline.
    ///
    /// May contain styling codes. Called with the display lock held, so it
    /// must not emit events or log.
    fn render(&self, width: usize) -> String;

    /// The gauge's event channel.
    fn events(&self) -> &GaugeEvents;
}
