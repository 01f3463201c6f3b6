//! Scheduler type definitions.
//!
//! This module contains error types, state enums, and command types for the scheduler.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::core::task::{Task, TaskError, TaskSummary};
use crate::core::types::{Priority, TaskName};

/// Errors that can occur in the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No queued task has this title.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// The task duration is negative or not a number.
    #[error("invalid duration for task '{name}': {minutes} minutes")]
    InvalidDuration { name: String, minutes: f64 },

    /// The task definition is otherwise unusable.
    #[error("invalid task: {0}")]
    InvalidTask(String),

    /// Channel error.
    #[error("channel error: {0}")]
    ChannelError(String),
}

impl From<TaskError> for SchedulerError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::InvalidDuration { name, minutes } => {
                SchedulerError::InvalidDuration { name, minutes }
            }
            other => SchedulerError::InvalidTask(other.to_string()),
        }
    }
}

/// State of the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next poll.
    Idle,
    /// A task has been announced and its time is running.
    Running,
    /// The loop has exited.
    Stopped,
}

/// Commands that can be sent to the scheduler.
pub(crate) enum SchedulerCommand {
    /// Queue a task.
    Add {
        task: Task,
        response: oneshot::Sender<()>,
    },
    /// Invalidate a queued task, if present.
    Delete {
        name: TaskName,
        response: oneshot::Sender<()>,
    },
    /// Re-queue a task with a new priority.
    Reprioritize {
        name: TaskName,
        priority: Priority,
        response: oneshot::Sender<Result<(), SchedulerError>>,
    },
    /// Snapshot of the live queue in pop order.
    Pending {
        response: oneshot::Sender<Vec<TaskSummary>>,
    },
    /// The task currently running, if any.
    Current {
        response: oneshot::Sender<Option<TaskSummary>>,
    },
    /// Shutdown the scheduler.
    Shutdown { response: oneshot::Sender<()> },
}
