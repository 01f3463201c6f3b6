//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tasker::{Event, EventBus, EventHandler, Notifier, Scheduler};
use tokio::sync::Mutex;

/// Poll interval used by scenario schedulers. Long enough that a burst of
/// commands issued back to back lands within one idle period.
pub const POLL: Duration = Duration::from_millis(100);

/// Wall-clock length of one task minute in tests.
pub const MINUTE: Duration = Duration::from_millis(50);

/// Generous upper bound for anything the loop should do soon.
pub const PATIENCE: Duration = Duration::from_secs(3);

/// Recording event handler for verifying events.
pub struct RecordingHandler {
    events: Mutex<Vec<Event>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }

    /// Titles of finished tasks, in order.
    pub async fn finished(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                Event::TaskFinished { name, .. } => Some(name.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Number of discarded queue nodes.
    pub async fn discarded(&self) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| matches!(e, Event::TaskDiscarded { .. }))
            .count()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &Event) {
        self.events.lock().await.push(event.clone());
    }
}

/// A scheduler with test timing and a recording event handler attached.
pub async fn scheduler_with_events(
    notifier: Arc<dyn Notifier>,
) -> (Scheduler, Arc<RecordingHandler>) {
    let handler = RecordingHandler::new();
    let event_bus = EventBus::new();
    event_bus.register(handler.clone()).await;

    let scheduler = Scheduler::new(notifier)
        .with_poll_interval(POLL)
        .with_minute(MINUTE)
        .with_event_bus(event_bus);
    (scheduler, handler)
}

/// Wait for a condition to become true, polling every 10ms.
///
/// # Panics
///
/// Panics if the timeout is reached first.
pub async fn wait_until<F, Fut>(what: &str, timeout: Duration, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    loop {
        if condition().await {
            return;
        }
        if start.elapsed() > timeout {
            panic!("Timeout waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
