//! Per-frame structural/data change notifications.

use std::fmt;

/// The kind of structural/data change a [`DataFrameEvent`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A row or column was inserted.
    Add,
    /// A row or column was removed.
    Remove,
    /// One or more cells were written.
    Update,
}

/// A single structural/data change notification.
#[derive(Debug, Clone)]
pub struct DataFrameEvent<R, C> {
    /// What kind of change occurred.
    pub kind: EventKind,
    /// The row keys the change touched.
    pub row_keys: Vec<R>,
    /// The column keys the change touched.
    pub col_keys: Vec<C>,
}

type Listener<R, C> = Box<dyn FnMut(&DataFrameEvent<R, C>) + Send>;

/// A frame's listener registry.
///
/// Listeners fire in insertion order, on the mutating thread. They receive
/// only the event, never a handle back to the frame, so they structurally
/// cannot mutate it mid-callback -- the source's "listeners must not mutate
/// the frame during a callback" rule is upheld by
/// construction rather than by convention.
///
/// `enabled` defaults to `false`: parsers/batch-assembly code runs with
/// events disabled to avoid paying for notifications nobody is listening
/// for.
pub struct EventBus<R, C> {
    listeners: Vec<Listener<R, C>>,
    enabled: bool,
    notifying: bool,
}

impl<R, C> EventBus<R, C> {
    /// A disabled bus with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            enabled: false,
            notifying: false,
        }
    }

    /// Whether `fire` currently dispatches to listeners.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables dispatch.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Registers a listener, called in insertion order on every future
    /// `fire`.
    pub fn subscribe(&mut self, listener: impl FnMut(&DataFrameEvent<R, C>) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Drops every registered listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Dispatches `event` to every listener, in insertion order, if the bus
    /// is enabled. A no-op otherwise.
    pub fn fire(&mut self, event: DataFrameEvent<R, C>) {
        if !self.enabled || self.listeners.is_empty() {
            return;
        }
        self.notifying = true;
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.notifying = false;
    }

    /// Whether a `fire` call is currently dispatching (diagnostic only).
    pub fn is_notifying(&self) -> bool {
        self.notifying
    }
}

impl<R, C> Default for EventBus<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> fmt::Debug for EventBus<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listener_count", &self.listeners.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn disabled_bus_drops_events() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let mut bus: EventBus<&str, &str> = EventBus::new();
        let sink = received.clone();
        bus.subscribe(move |event| sink.lock().unwrap().push(event.kind));
        bus.fire(DataFrameEvent {
            kind: EventKind::Add,
            row_keys: vec!["r"],
            col_keys: vec![],
        });
        assert!(received.lock().unwrap().is_empty());
    }

    #[test]
    fn enabled_bus_dispatches_in_order() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let mut bus: EventBus<&str, &str> = EventBus::new();
        bus.set_enabled(true);
        let first = received.clone();
        bus.subscribe(move |event| first.lock().unwrap().push(format!("first:{:?}", event.kind)));
        let second = received.clone();
        bus.subscribe(move |event| second.lock().unwrap().push(format!("second:{:?}", event.kind)));
        bus.fire(DataFrameEvent {
            kind: EventKind::Update,
            row_keys: vec!["r"],
            col_keys: vec!["c"],
        });
        assert_eq!(*received.lock().unwrap(), vec!["first:Update", "second:Update"]);
    }
}
