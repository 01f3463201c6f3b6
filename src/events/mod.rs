//! Lifecycle events and event handling.
//!
//! The scheduler emits an event whenever a task is queued, started, finished
//! or discarded, and whenever a notification could not be delivered. Handlers
//! registered on the [`EventBus`] observe these without affecting the loop.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::core::queue::DiscardReason;
use crate::core::types::{Priority, Sequence, TaskName};

/// Lifecycle events emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum Event {
    /// A task entered the queue (added, re-added or reprioritized).
    TaskQueued {
        name: TaskName,
        priority: Priority,
        sequence: Sequence,
        timestamp: Instant,
    },

    /// A task was popped and announced.
    TaskStarted {
        name: TaskName,
        minutes: f64,
        timestamp: Instant,
    },

    /// A task's allotted time ran out.
    TaskFinished {
        name: TaskName,
        elapsed: Duration,
        timestamp: Instant,
    },

    /// A stale queue node was thrown away at pop time.
    TaskDiscarded {
        name: TaskName,
        sequence: Sequence,
        reason: DiscardReason,
        timestamp: Instant,
    },

    /// The notifier failed or timed out.
    NotificationFailed {
        title: String,
        error: String,
        timestamp: Instant,
    },
}

impl Event {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> Instant {
        match self {
            Event::TaskQueued { timestamp, .. } => *timestamp,
            Event::TaskStarted { timestamp, .. } => *timestamp,
            Event::TaskFinished { timestamp, .. } => *timestamp,
            Event::TaskDiscarded { timestamp, .. } => *timestamp,
            Event::NotificationFailed { timestamp, .. } => *timestamp,
        }
    }

    /// Title of the task this event concerns, if any.
    pub fn task_name(&self) -> Option<&TaskName> {
        match self {
            Event::TaskQueued { name, .. }
            | Event::TaskStarted { name, .. }
            | Event::TaskFinished { name, .. }
            | Event::TaskDiscarded { name, .. } => Some(name),
            Event::NotificationFailed { .. } => None,
        }
    }

    /// Create a TaskQueued event.
    pub fn task_queued(name: TaskName, priority: Priority, sequence: Sequence) -> Self {
        Event::TaskQueued {
            name,
            priority,
            sequence,
            timestamp: Instant::now(),
        }
    }

    /// Create a TaskStarted event.
    pub fn task_started(name: TaskName, minutes: f64) -> Self {
        Event::TaskStarted {
            name,
            minutes,
            timestamp: Instant::now(),
        }
    }

    /// Create a TaskFinished event.
    pub fn task_finished(name: TaskName, elapsed: Duration) -> Self {
        Event::TaskFinished {
            name,
            elapsed,
            timestamp: Instant::now(),
        }
    }

    /// Create a TaskDiscarded event.
    pub fn task_discarded(name: TaskName, sequence: Sequence, reason: DiscardReason) -> Self {
        Event::TaskDiscarded {
            name,
            sequence,
            reason,
            timestamp: Instant::now(),
        }
    }

    /// Create a NotificationFailed event.
    pub fn notification_failed(title: impl Into<String>, error: impl Into<String>) -> Self {
        Event::NotificationFailed {
            title: title.into(),
            error: error.into(),
            timestamp: Instant::now(),
        }
    }
}

/// Handler for receiving lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }

    /// Get the number of registered handlers.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
