//! Configuration type definitions.
//!
//! This module contains the YAML configuration structures for the scheduler,
//! its notifier, and the tasks queued at startup.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::ConfigError;
use crate::core::task::Task;
use crate::core::types::Priority;
use crate::notify::{CommandNotifier, LogNotifier, Notifier, NotifyError, platform_notifier};

fn default_app_name() -> String {
    "tasker".to_string()
}

fn default_poll_interval_secs() -> f64 {
    30.0
}

fn default_minute_secs() -> f64 {
    60.0
}

fn default_notify_timeout_secs() -> f64 {
    5.0
}

/// Scheduler configuration (tasker.yaml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Application name shown by the desktop notifier.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Seconds between checks for queued work while idle.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: f64,
    /// Wall-clock seconds in one task minute.
    #[serde(default = "default_minute_secs")]
    pub minute_secs: f64,
    /// Upper bound in seconds on one notifier call.
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: f64,
    /// Priority for tasks added without one.
    #[serde(default)]
    pub default_priority: Priority,
    /// Notification sink.
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Tasks queued when the scheduler starts.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            poll_interval_secs: default_poll_interval_secs(),
            minute_secs: default_minute_secs(),
            notify_timeout_secs: default_notify_timeout_secs(),
            default_priority: Priority::default(),
            notifier: NotifierConfig::default(),
            tasks: Vec::new(),
        }
    }
}

/// Notifier configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Pick the desktop notifier for the running OS.
    #[default]
    Auto,
    /// Only log notifications.
    Log,
    /// Run a custom program.
    Command {
        /// Program to execute.
        program: String,
        /// Argument template; `{title}`, `{body}` and `{app}` are substituted.
        #[serde(default)]
        args: Vec<String>,
        /// Per-call timeout in seconds.
        timeout_secs: Option<f64>,
    },
}

/// A task queued from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Task title.
    pub title: String,
    /// Duration in task minutes.
    pub minutes: f64,
    /// Priority; lower runs first. The configured default is used if absent.
    pub priority: Option<Priority>,
}

/// Convert a positive, finite number of seconds to a duration.
fn positive_secs(field: &str, secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::InvalidConfig(format!(
            "{} must be a positive number of seconds, got {}",
            field, secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ConfigError::InvalidConfig(format!("{}: {}", field, e)))
}

impl SchedulerConfig {
    /// Time between checks for queued work.
    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        positive_secs("poll_interval_secs", self.poll_interval_secs)
    }

    /// Wall-clock length of one task minute.
    pub fn minute(&self) -> Result<Duration, ConfigError> {
        positive_secs("minute_secs", self.minute_secs)
    }

    /// Bound on one notifier call.
    pub fn notify_timeout(&self) -> Result<Duration, ConfigError> {
        positive_secs("notify_timeout_secs", self.notify_timeout_secs)
    }

    /// Tasks from the `tasks` list, with the default priority applied.
    pub fn initial_tasks(&self) -> Result<Vec<Task>, ConfigError> {
        self.tasks
            .iter()
            .map(|t| {
                let priority = t.priority.unwrap_or(self.default_priority);
                Task::new(t.title.as_str(), t.minutes, priority)
                    .map_err(|e| ConfigError::InvalidConfig(e.to_string()))
            })
            .collect()
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::MissingField("app_name".into()));
        }

        self.poll_interval()?;
        self.minute()?;
        self.notify_timeout()?;

        if self.default_priority.get() == 0 {
            return Err(ConfigError::InvalidConfig(
                "default_priority must be at least 1".into(),
            ));
        }
        if let Some(task) = self
            .tasks
            .iter()
            .find(|t| t.priority.is_some_and(|p| p.get() == 0))
        {
            return Err(ConfigError::InvalidConfig(format!(
                "priority of task '{}' must be at least 1",
                task.title
            )));
        }

        if let NotifierConfig::Command {
            program,
            timeout_secs,
            ..
        } = &self.notifier
        {
            if program.trim().is_empty() {
                return Err(ConfigError::MissingField("notifier.program".into()));
            }
            if let Some(secs) = timeout_secs {
                positive_secs("notifier.timeout_secs", *secs)?;
            }
        }

        self.initial_tasks()?;
        Ok(())
    }

    /// Build the configured notifier.
    ///
    /// `auto` fails with [`NotifyError::UnsupportedPlatform`] where the OS has
    /// no known notification program.
    pub fn build_notifier(&self) -> Result<Arc<dyn Notifier>, NotifyError> {
        match &self.notifier {
            NotifierConfig::Auto => platform_notifier(&self.app_name),
            NotifierConfig::Log => Ok(Arc::new(LogNotifier::new())),
            NotifierConfig::Command {
                program,
                args,
                timeout_secs,
            } => {
                let mut builder = CommandNotifier::builder(program.as_str())
                    .app_name(self.app_name.as_str())
                    .args(args.iter().map(String::as_str));
                if let Some(timeout) = timeout_secs.and_then(|s| Duration::try_from_secs_f64(s).ok())
                {
                    builder = builder.timeout(timeout);
                }
                Ok(Arc::new(builder.build()))
            }
        }
    }
}
