//! Event Bus (spec §4.3): case-insensitive name → ordered handler list,
//! plus an edge-triggered `wait(names, mode)` primitive.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::error;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type Handler = Arc<dyn Fn(Value) -> BoxFuture + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    First,
    All,
}

struct Inner {
    handlers: Mutex<HashMap<String, Vec<Handler>>>,
    pulses: broadcast::Sender<String>,
}

/// Cheaply cloneable; registration and emission are both available on every
/// clone (registration is expected only at startup; emission is concurrent).
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl EventBus {
    pub fn new() -> Self {
        let (pulses, _rx) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner { handlers: Mutex::new(HashMap::new()), pulses }),
        }
    }

    /// Registers `handler` for `name`. Handlers fire in registration order
    /// (but run concurrently with each other).
    pub fn on(&self, name: &str, handler: Handler) {
        self.inner
            .handlers
            .lock()
            .unwrap()
            .entry(normalize(name))
            .or_default()
            .push(handler);
    }

    /// Schedules every registered handler for `name` as an independent task,
    /// then pulses any `wait()` callers for `name`. A handler panic is
    /// caught by the supervising task and logged; it never cancels sibling
    /// handlers.
    pub fn trigger(&self, name: &str, payload: Value) {
        let key = normalize(name);
        let handlers = {
            let guard = self.inner.handlers.lock().unwrap();
            guard.get(&key).cloned().unwrap_or_default()
        };
        for handler in handlers {
            let payload = payload.clone();
            let event_name = key.clone();
            tokio::spawn(async move {
                let fut = (handler)(payload);
                if let Err(join_err) = tokio::spawn(fut).await {
                    error!(event = %event_name, error = %join_err, "event handler panicked");
                }
            });
        }
        // Pulse regardless of whether anyone is listening yet — `wait()`
        // callers that subscribed beforehand observe the edge.
        let _ = self.inner.pulses.send(key);
    }

    /// Awaits the next occurrence of any (`mode=First`) or all
    /// (`mode=All`) of `names`. Edge-triggered: only pulses that happen
    /// after this call subscribes are observed.
    pub async fn wait(&self, names: &[&str], mode: WaitMode) -> HashSet<String> {
        let mut rx = self.inner.pulses.subscribe();
        let wanted: HashSet<String> = names.iter().map(|n| normalize(n)).collect();
        let mut seen = HashSet::new();
        loop {
            match rx.recv().await {
                Ok(name) => {
                    if wanted.contains(&name) {
                        seen.insert(name);
                        match mode {
                            WaitMode::First => return seen,
                            WaitMode::All => {
                                if seen.len() == wanted.len() {
                                    return seen;
                                }
                            }
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return seen,
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_handler(counter: Arc<AtomicUsize>) -> Handler {
        Arc::new(move |_payload| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test]
    async fn handlers_fire_for_registered_event() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.on("ready", counting_handler(counter.clone()));
        bus.trigger("ready", serde_json::json!({}));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn event_names_are_case_insensitive() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.on("Ready", counting_handler(counter.clone()));
        bus.trigger("READY", serde_json::json!({}));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn one_handler_panicking_does_not_stop_siblings() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let panicking: Handler = Arc::new(|_| Box::pin(async move { panic!("boom") }));
        bus.on("x", panicking);
        bus.on("x", counting_handler(counter.clone()));
        bus.trigger("x", serde_json::json!({}));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wait_first_resolves_on_any_listed_event() {
        let bus = EventBus::new();
        let bus2 = bus.clone();
        let waiter = tokio::spawn(async move { bus2.wait(&["a", "b"], WaitMode::First).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        bus.trigger("b", serde_json::json!({}));
        let seen = waiter.await.unwrap();
        assert!(seen.contains("b"));
    }

    #[tokio::test]
    async fn wait_all_requires_every_listed_event() {
        let bus = EventBus::new();
        let bus2 = bus.clone();
        let waiter = tokio::spawn(async move { bus2.wait(&["a", "b"], WaitMode::All).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        bus.trigger("a", serde_json::json!({}));
        tokio::time::sleep(Duration::from_millis(10)).await;
        bus.trigger("b", serde_json::json!({}));
        let seen = waiter.await.unwrap();
        assert_eq!(seen.len(), 2);
    }
}
