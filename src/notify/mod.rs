//! Desktop notification sinks.
//!
//! The scheduler announces tasks through a [`Notifier`]. Which one is used is
//! decided at startup and injected, so the loop never branches on the
//! platform itself.
//!
//! - [`CommandNotifier`] runs an external program (`notify-send`, `osascript`)
//! - [`LogNotifier`] only writes the notification to the log
//!
//! [`platform_notifier`] picks the command notifier for the running OS.

mod command;
mod log;

pub use command::{ArgEscape, CommandNotifier, CommandNotifierBuilder};
pub use self::log::LogNotifier;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Title used when a task starts.
pub const TASK_STARTED_TITLE: &str = "New Task";

/// Title used when a task's time runs out.
pub const TIME_EXPIRED_TITLE: &str = "Time's up!";

/// Body prefix used when a task's time runs out.
pub const TIME_EXPIRED_BODY: &str = "The time has expired for the current task";

/// Default bound on a single external notification command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No notifier exists for this operating system.
    #[error("notifications are not supported on platform '{0}'")]
    UnsupportedPlatform(String),

    /// The notification program could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The notification program exited unsuccessfully.
    #[error("'{program}' exited with code {code}: {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    /// Delivery did not finish in time.
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
}

/// A sink for user-facing notifications.
///
/// Implementations should return quickly; the scheduler bounds each call with
/// its own timeout and treats an error as non-fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification.
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;

    /// Short name for logging.
    fn name(&self) -> &str;
}

/// Select the notifier for the running operating system.
///
/// Returns [`NotifyError::UnsupportedPlatform`] where no notification program
/// is known; callers usually fall back to [`LogNotifier`].
pub fn platform_notifier(app_name: &str) -> Result<Arc<dyn Notifier>, NotifyError> {
    notifier_for_os(std::env::consts::OS, app_name)
}

/// Select the notifier for a named operating system.
pub fn notifier_for_os(os: &str, app_name: &str) -> Result<Arc<dyn Notifier>, NotifyError> {
    match os {
        "linux" | "freebsd" | "openbsd" | "netbsd" => {
            Ok(Arc::new(CommandNotifier::notify_send(app_name)))
        }
        "macos" => Ok(Arc::new(CommandNotifier::osascript())),
        other => Err(NotifyError::UnsupportedPlatform(other.to_string())),
    }
}

/// Body text for the time-expired notification.
pub fn time_expired_body(task: &str) -> String {
    format!("{}: {}", TIME_EXPIRED_BODY, task)
}
