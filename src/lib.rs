//! tasker - a priority-queue reminder scheduler.
//!
//! Tasks are queued with a title, a duration in minutes and a priority. A
//! background loop picks the most urgent task, announces it, waits out its
//! duration, announces that the time is up, and moves on to the next one.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasker::{LogNotifier, Scheduler};
//!
//! # async fn demo() -> Result<(), tasker::SchedulerError> {
//! let (handle, task) = Scheduler::new(Arc::new(LogNotifier::new())).start();
//! handle.add_with_priority("write report", 25.0, 1u32).await?;
//! handle.add("inbox", 10.0).await?;
//! handle.reprioritize("inbox", 2u32).await?;
//! handle.shutdown().await?;
//! let _ = task.await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod console;
pub mod core;
pub mod events;
pub mod notify;
pub mod scheduler;
pub mod testing;

pub use config::{ConfigError, NotifierConfig, SchedulerConfig, TaskConfig, YamlLoader};
pub use console::{ConsoleCommand, ConsoleError, Reply};
pub use core::queue::{DiscardReason, Popped, PushOutcome, TaskEntry, TaskQueue};
pub use core::task::{Task, TaskError, TaskSummary};
pub use core::types::{Priority, Sequence, TaskName};
pub use events::{Event, EventBus, EventHandler};
pub use notify::{
    CommandNotifier, LogNotifier, Notifier, NotifyError, TASK_STARTED_TITLE, TIME_EXPIRED_TITLE,
    platform_notifier,
};
pub use scheduler::{Scheduler, SchedulerError, SchedulerHandle, SchedulerState};
