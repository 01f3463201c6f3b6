//! Reminder scheduler.
//!
//! The scheduler owns the task queue inside its own tokio task. Callers hold
//! a cloneable [`SchedulerHandle`] and talk to it over a command channel.

mod engine;
mod handle;
mod types;

pub use engine::{DEFAULT_MINUTE, DEFAULT_NOTIFY_TIMEOUT, DEFAULT_POLL_INTERVAL, Scheduler};
pub use handle::SchedulerHandle;
pub use types::{SchedulerError, SchedulerState};
