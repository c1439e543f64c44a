//! In-process event bus shared by the loader, the navigator and the UI.
//!
//! Listeners are registered per topic and invoked synchronously, in
//! registration order, after the state change the event reports.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

/// Topic names published by the core components.
pub mod topics {
    /// A fresh fetch actually started for a fragment.
    pub const COMPONENT_LOADING: &str = "component:loading";
    /// A fragment was fetched and inserted into its mount.
    pub const COMPONENT_LOADED: &str = "component:loaded";
    /// A fragment failed terminally (retries exhausted or mount missing).
    pub const COMPONENT_FAILED: &str = "component:failed";
    /// Every fragment of a batch loaded successfully.
    pub const ALL_COMPONENTS_LOADED: &str = "components:loaded";
    /// The visible page index changed.
    pub const PAGE_CHANGED: &str = "page:changed";
    /// A section is leaving the visible page.
    pub const SECTION_EXIT: &str = "section:exit";
    /// A section is entering the visible page.
    pub const SECTION_ENTER: &str = "section:enter";
}

/// Handle returned by [`EventBus::on`] / [`EventBus::once`], used to remove
/// the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

struct Registered {
    id: ListenerId,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    listeners: HashMap<String, Vec<Registered>>,
    once: HashMap<String, Vec<Registered>>,
    next_id: u64,
}

/// Topic-based publish/subscribe bus.
///
/// Emission never holds the internal lock while running handlers, so a
/// listener may publish further events without deadlocking.
#[derive(Default)]
pub struct EventBus {
    inner: Mutex<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `topic`.
    pub fn on<F>(&self, topic: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner
            .listeners
            .entry(topic.into())
            .or_default()
            .push(Registered {
                id,
                handler: Arc::new(handler),
            });
        id
    }

    /// Register a listener that fires at most once.
    pub fn once<F>(&self, topic: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.once.entry(topic.into()).or_default().push(Registered {
            id,
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove a previously registered listener. Returns false if the id is
    /// unknown for that topic.
    pub fn off(&self, topic: &str, id: ListenerId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let BusInner {
            listeners, once, ..
        } = &mut *inner;
        for table in [listeners, once] {
            if let Some(registered) = table.get_mut(topic) {
                if let Some(pos) = registered.iter().position(|r| r.id == id) {
                    registered.remove(pos);
                    if registered.is_empty() {
                        table.remove(topic);
                    }
                    return true;
                }
            }
        }
        false
    }

    /// Publish `payload` to every listener of `topic`. Returns the number of
    /// listeners that were notified.
    pub fn emit(&self, topic: &str, payload: Value) -> usize {
        let (once, regular) = {
            let mut inner = self.inner.lock().unwrap();
            let once: Vec<Handler> = inner
                .once
                .remove(topic)
                .unwrap_or_default()
                .into_iter()
                .map(|r| r.handler)
                .collect();
            let regular: Vec<Handler> = inner
                .listeners
                .get(topic)
                .map(|rs| rs.iter().map(|r| r.handler.clone()).collect())
                .unwrap_or_default();
            (once, regular)
        };

        let mut notified = 0;
        for handler in once.iter().chain(regular.iter()) {
            handler(&payload);
            notified += 1;
        }
        notified
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.listeners.get(topic).map_or(0, Vec::len)
            + inner.once.get(topic).map_or(0, Vec::len)
    }

    pub fn topic_names(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        let mut names: Vec<String> = inner
            .listeners
            .keys()
            .chain(inner.once.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn emit_reaches_all_listeners() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            bus.on("ping", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(bus.emit("ping", json!({})), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(bus.emit("other", json!({})), 0);
    }

    #[test]
    fn once_listener_fires_a_single_time() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = hits.clone();
            bus.once("ping", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        bus.emit("ping", json!({}));
        bus.emit("ping", json!({}));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count("ping"), 0);
    }

    #[test]
    fn off_removes_listener() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = {
            let hits = hits.clone();
            bus.on("ping", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        assert!(bus.off("ping", id));
        assert!(!bus.off("ping", id));
        bus.emit("ping", json!({}));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_may_emit_from_callback() {
        let bus = Arc::new(EventBus::new());
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let inner_bus = bus.clone();
            bus.on("outer", move |_| {
                inner_bus.emit("inner", json!({}));
            });
        }
        {
            let hits = hits.clone();
            bus.on("inner", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        bus.emit("outer", json!({}));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn payload_reaches_handler() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        {
            let seen = seen.clone();
            bus.on("page:changed", move |value| {
                *seen.lock().unwrap() = value.get("index").and_then(Value::as_u64);
            });
        }

        bus.emit("page:changed", json!({ "index": 2 }));
        assert_eq!(*seen.lock().unwrap(), Some(2));
    }
}
