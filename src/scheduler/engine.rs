//! Scheduler engine implementation.
//!
//! The scheduler is responsible for:
//! - Owning the task queue and applying add/delete/reprioritize commands
//! - Polling for due work while idle
//! - Announcing each task, waiting out its duration, announcing expiry
//! - Draining the backlog back to back before going idle again
//! - Event emission
//!
//! The loop has exactly two waits: the poll interval while idle and the task
//! duration while running. Both race the command channel, so mutations are
//! applied as they arrive and a shutdown ends the loop without waiting out a
//! long task. Dropping every handle has the same effect.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep};

use crate::config::{ConfigError, SchedulerConfig};
use crate::core::queue::{Popped, PushOutcome, TaskEntry, TaskQueue};
use crate::core::task::{Task, TaskSummary};
use crate::core::types::Priority;
use crate::events::{Event, EventBus};
use crate::notify::{
    Notifier, NotifyError, TASK_STARTED_TITLE, TIME_EXPIRED_TITLE, time_expired_body,
};

use super::handle::{COMMAND_CHANNEL_BUFFER, SchedulerHandle};
use super::types::{SchedulerCommand, SchedulerError, SchedulerState};

/// Default time between checks for queued work while idle.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default wall-clock length of one task minute.
pub const DEFAULT_MINUTE: Duration = Duration::from_secs(60);

/// Default bound on a single notifier call.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether the loop keeps going after a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Reminder scheduler.
pub struct Scheduler {
    /// Queued tasks.
    queue: TaskQueue,
    /// Task whose time is running.
    current: Option<TaskSummary>,
    /// Destination for user-facing notifications.
    notifier: Arc<dyn Notifier>,
    /// Event bus for emitting events.
    event_bus: Arc<EventBus>,
    /// Sleep between checks while idle.
    poll_interval: Duration,
    /// Wall-clock length of one task minute.
    minute: Duration,
    /// Upper bound on one notifier call.
    notify_timeout: Duration,
    /// Priority for tasks added without one.
    default_priority: Priority,
}

impl Scheduler {
    /// Create a new scheduler that announces through the given notifier.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            queue: TaskQueue::new(),
            current: None,
            notifier,
            event_bus: Arc::new(EventBus::new()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            minute: DEFAULT_MINUTE,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
            default_priority: Priority::default(),
        }
    }

    /// Create a scheduler from configuration, queueing its initial tasks.
    pub fn from_config(
        config: &SchedulerConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut scheduler = Self::new(notifier)
            .with_poll_interval(config.poll_interval()?)
            .with_minute(config.minute()?)
            .with_notify_timeout(config.notify_timeout()?)
            .with_default_priority(config.default_priority);

        for task in config.initial_tasks()? {
            scheduler.enqueue(task);
        }

        Ok(scheduler)
    }

    /// Set the event bus.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Arc::new(event_bus);
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the wall-clock length of one task minute.
    pub fn with_minute(mut self, minute: Duration) -> Self {
        self.minute = minute;
        self
    }

    /// Set the notifier timeout.
    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    /// Set the priority given to tasks added without one.
    pub fn with_default_priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    /// Queue a task before the scheduler is started.
    pub fn enqueue(&mut self, task: Task) -> PushOutcome {
        self.queue.push(task)
    }

    /// Live queued tasks in the order they will run.
    pub fn pending(&self) -> Vec<TaskSummary> {
        self.queue.snapshot()
    }

    /// Get the event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Start the scheduler and return a handle for controlling it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> (SchedulerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_BUFFER);
        let state = Arc::new(RwLock::new(SchedulerState::Idle));

        let handle = SchedulerHandle {
            command_tx,
            state: Arc::clone(&state),
            default_priority: self.default_priority,
        };

        tracing::info!(
            notifier = self.notifier.name(),
            poll_interval = ?self.poll_interval,
            minute = ?self.minute,
            queued = self.queue.len(),
            "Starting scheduler"
        );

        let scheduler_task = tokio::spawn(async move {
            self.run(command_rx, state).await;
        });

        (handle, scheduler_task)
    }

    /// Main scheduler loop.
    async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<SchedulerCommand>,
        state: Arc<RwLock<SchedulerState>>,
    ) {
        'idle: loop {
            *state.write().await = SchedulerState::Idle;

            let poll = tokio::time::sleep(self.poll_interval);
            if self.wait(poll, &mut command_rx, &state).await == Flow::Stop {
                break;
            }

            while self.queue.has_entries() {
                let Some(entry) = self.next_ready().await else {
                    break;
                };

                *state.write().await = SchedulerState::Running;
                if self.run_task(entry, &mut command_rx, &state).await == Flow::Stop {
                    break 'idle;
                }
            }

            if self.queue.maybe_compact() {
                tracing::debug!(
                    heap_len = self.queue.heap_len(),
                    "Compacted task queue"
                );
            }
        }

        *state.write().await = SchedulerState::Stopped;
        tracing::info!("Scheduler stopped");
    }

    /// Announce a task, wait out its duration, announce expiry.
    async fn run_task(
        &mut self,
        entry: TaskEntry,
        command_rx: &mut mpsc::Receiver<SchedulerCommand>,
        state: &RwLock<SchedulerState>,
    ) -> Flow {
        let task = entry.task().clone();
        let name = task.name().clone();
        let allotted = task.wall_clock(self.minute);

        self.current = Some(TaskSummary {
            name: name.clone(),
            minutes: task.minutes(),
            priority: task.priority(),
            sequence: entry.sequence(),
        });

        tracing::info!(task = %name, minutes = task.minutes(), priority = %task.priority(), "Task started");
        self.announce(TASK_STARTED_TITLE, name.as_str()).await;
        self.event_bus
            .emit(Event::task_started(name.clone(), task.minutes()))
            .await;

        let started = Instant::now();
        let flow = self
            .wait(tokio::time::sleep(allotted), command_rx, state)
            .await;
        self.current = None;

        if flow == Flow::Stop {
            tracing::info!(task = %name, "Shutdown while task was running");
            return Flow::Stop;
        }

        let elapsed = started.elapsed();
        tracing::info!(task = %name, elapsed = ?elapsed, "Task time expired");
        self.announce(TIME_EXPIRED_TITLE, &time_expired_body(name.as_str()))
            .await;
        self.event_bus
            .emit(Event::task_finished(name, elapsed))
            .await;

        Flow::Continue
    }

    /// Pop until a live task is found, reporting every discarded node.
    async fn next_ready(&mut self) -> Option<TaskEntry> {
        loop {
            match self.queue.pop_node()? {
                Popped::Ready(entry) => return Some(entry),
                Popped::Discarded {
                    name,
                    sequence,
                    reason,
                } => {
                    tracing::debug!(task = %name, sequence = %sequence, reason = ?reason, "Discarding stale queue entry");
                    self.event_bus
                        .emit(Event::task_discarded(name, sequence, reason))
                        .await;
                }
            }
        }
    }

    /// Sleep until `sleep` completes, applying commands as they arrive.
    async fn wait(
        &mut self,
        sleep: Sleep,
        command_rx: &mut mpsc::Receiver<SchedulerCommand>,
        state: &RwLock<SchedulerState>,
    ) -> Flow {
        let mut sleep: Pin<Box<Sleep>> = Box::pin(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return Flow::Continue,

                command = command_rx.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("All scheduler handles dropped");
                        return Flow::Stop;
                    };
                    if self.handle_command(command, state).await == Flow::Stop {
                        return Flow::Stop;
                    }
                }
            }
        }
    }

    /// Apply one command from a handle.
    async fn handle_command(
        &mut self,
        command: SchedulerCommand,
        state: &RwLock<SchedulerState>,
    ) -> Flow {
        match command {
            SchedulerCommand::Add { task, response } => {
                let name = task.name().clone();
                let priority = task.priority();
                let outcome = self.queue.push(task);
                match outcome {
                    PushOutcome::Inserted(sequence) => {
                        tracing::debug!(task = %name, priority = %priority, sequence = %sequence, "Task queued");
                    }
                    PushOutcome::Replaced(sequence) => {
                        tracing::info!(task = %name, priority = %priority, sequence = %sequence, "Task re-added, earlier entry superseded");
                    }
                }
                self.event_bus
                    .emit(Event::task_queued(name, priority, outcome.sequence()))
                    .await;
                let _ = response.send(());
            }
            SchedulerCommand::Delete { name, response } => {
                if self.queue.invalidate(&name) {
                    tracing::info!(task = %name, "Task deleted");
                    self.queue.maybe_compact();
                } else {
                    tracing::debug!(task = %name, "Delete ignored, task not queued");
                }
                let _ = response.send(());
            }
            SchedulerCommand::Reprioritize {
                name,
                priority,
                response,
            } => {
                let result = match self.queue.reprioritize(&name, priority) {
                    Some(sequence) => {
                        tracing::info!(task = %name, priority = %priority, sequence = %sequence, "Task reprioritized");
                        self.event_bus
                            .emit(Event::task_queued(name, priority, sequence))
                            .await;
                        self.queue.maybe_compact();
                        Ok(())
                    }
                    None => Err(SchedulerError::TaskNotFound(name.to_string())),
                };
                let _ = response.send(result);
            }
            SchedulerCommand::Pending { response } => {
                let _ = response.send(self.queue.snapshot());
            }
            SchedulerCommand::Current { response } => {
                let _ = response.send(self.current.clone());
            }
            SchedulerCommand::Shutdown { response } => {
                *state.write().await = SchedulerState::Stopped;
                let _ = response.send(());
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Deliver a notification, logging instead of failing.
    async fn announce(&self, title: &str, body: &str) {
        let result = match tokio::time::timeout(
            self.notify_timeout,
            self.notifier.notify(title, body),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.notify_timeout)),
        };

        if let Err(e) = result {
            tracing::warn!(notifier = self.notifier.name(), title = %title, error = %e, "Failed to deliver notification");
            self.event_bus
                .emit(Event::notification_failed(title, e.to_string()))
                .await;
        }
    }
}
