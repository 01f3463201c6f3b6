//! Task definitions and validation.
//!
//! A [`Task`] is what callers hand to the scheduler: a title, how many
//! minutes it should take once started, and a priority.

use std::time::Duration;
use thiserror::Error;

use super::types::{Priority, Sequence, TaskName};

/// Errors raised when a task definition is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    /// Duration is negative, NaN or infinite.
    #[error("invalid duration for task '{name}': {minutes} minutes")]
    InvalidDuration { name: String, minutes: f64 },

    /// Title is empty.
    #[error("task title must not be empty")]
    EmptyName,
}

/// A task to be announced by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    name: TaskName,
    minutes: f64,
    priority: Priority,
}

impl Task {
    /// Create a task, validating its title and duration.
    pub fn new(
        name: impl Into<TaskName>,
        minutes: f64,
        priority: Priority,
    ) -> Result<Self, TaskError> {
        let name = name.into();
        if name.is_blank() {
            return Err(TaskError::EmptyName);
        }
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(TaskError::InvalidDuration {
                name: name.to_string(),
                minutes,
            });
        }
        Ok(Self {
            name,
            minutes,
            priority,
        })
    }

    pub fn name(&self) -> &TaskName {
        &self.name
    }

    /// Allotted time in minutes.
    pub fn minutes(&self) -> f64 {
        self.minutes
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Same task with a different priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Wall-clock time to wait for this task, given the length of one minute.
    ///
    /// Saturates at [`Duration::MAX`] instead of overflowing.
    pub fn wall_clock(&self, minute: Duration) -> Duration {
        Duration::try_from_secs_f64(self.minutes * minute.as_secs_f64()).unwrap_or(Duration::MAX)
    }
}

/// Read-only view of a queued or running task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSummary {
    pub name: TaskName,
    pub minutes: f64,
    pub priority: Priority,
    pub sequence: Sequence,
}
