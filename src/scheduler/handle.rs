//! Scheduler handle for controlling the scheduler.
//!
//! This module provides the `SchedulerHandle` type that callers use to add,
//! delete and reprioritize tasks, inspect the queue, and shut the loop down.
//! Every call is a command sent into the scheduler's own task, so callers on
//! any thread see mutations applied atomically and in order.

use std::sync::Arc;

use tokio::sync::{RwLock, mpsc, oneshot};

use crate::core::task::{Task, TaskSummary};
use crate::core::types::{Priority, TaskName};

use super::types::{SchedulerCommand, SchedulerError, SchedulerState};

/// Buffer size for the command channel between SchedulerHandle and Scheduler.
pub(crate) const COMMAND_CHANNEL_BUFFER: usize = 32;

/// Handle for controlling the scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    pub(crate) command_tx: mpsc::Sender<SchedulerCommand>,
    pub(crate) state: Arc<RwLock<SchedulerState>>,
    pub(crate) default_priority: Priority,
}

impl SchedulerHandle {
    /// Helper to send a command and wait for its reply.
    async fn request<T>(
        &self,
        build_command: impl FnOnce(oneshot::Sender<T>) -> SchedulerCommand,
        operation: &str,
    ) -> Result<T, SchedulerError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(build_command(response_tx))
            .await
            .map_err(|_| {
                SchedulerError::ChannelError(format!("failed to send {} command", operation))
            })?;

        response_rx.await.map_err(|_| {
            SchedulerError::ChannelError(format!("failed to receive {} response", operation))
        })
    }

    /// Queue a task with the default priority.
    pub async fn add(&self, name: impl Into<TaskName>, minutes: f64) -> Result<(), SchedulerError> {
        self.add_with_priority(name, minutes, self.default_priority)
            .await
    }

    /// Queue a task with an explicit priority.
    ///
    /// Re-adding a title that is already queued supersedes the earlier task.
    pub async fn add_with_priority(
        &self,
        name: impl Into<TaskName>,
        minutes: f64,
        priority: impl Into<Priority>,
    ) -> Result<(), SchedulerError> {
        let task = Task::new(name, minutes, priority.into())?;
        self.add_task(task).await
    }

    /// Queue an already validated task.
    pub async fn add_task(&self, task: Task) -> Result<(), SchedulerError> {
        self.request(|response| SchedulerCommand::Add { task, response }, "add")
            .await
    }

    /// Delete a queued task. Deleting a missing task is not an error.
    ///
    /// Once this returns the task will never be announced. A task that is
    /// already running is not affected.
    pub async fn delete(&self, name: impl Into<TaskName>) -> Result<(), SchedulerError> {
        let name = name.into();
        self.request(|response| SchedulerCommand::Delete { name, response }, "delete")
            .await
    }

    /// Move a queued task to the back of another priority class, keeping its
    /// duration.
    pub async fn reprioritize(
        &self,
        name: impl Into<TaskName>,
        priority: impl Into<Priority>,
    ) -> Result<(), SchedulerError> {
        let name = name.into();
        let priority = priority.into();
        self.request(
            |response| SchedulerCommand::Reprioritize {
                name,
                priority,
                response,
            },
            "reprioritize",
        )
        .await?
    }

    /// Live queued tasks in the order they will run.
    pub async fn pending(&self) -> Result<Vec<TaskSummary>, SchedulerError> {
        self.request(|response| SchedulerCommand::Pending { response }, "pending")
            .await
    }

    /// The task whose time is currently running, if any.
    pub async fn current(&self) -> Result<Option<TaskSummary>, SchedulerError> {
        self.request(|response| SchedulerCommand::Current { response }, "current")
            .await
    }

    /// Shutdown the scheduler.
    ///
    /// The loop exits at its current wait without announcing anything else.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        self.request(|response| SchedulerCommand::Shutdown { response }, "shutdown")
            .await
    }

    /// Get the current scheduler state.
    pub async fn state(&self) -> SchedulerState {
        *self.state.read().await
    }

    /// Check if a task is currently running.
    pub async fn is_running(&self) -> bool {
        *self.state.read().await == SchedulerState::Running
    }

    /// Check if the loop has exited.
    pub async fn is_stopped(&self) -> bool {
        *self.state.read().await == SchedulerState::Stopped
    }
}
