//! Testing utilities for users of the tasker library.
//!
//! This module provides notifiers that make the scheduler observable in
//! tests:
//!
//! - [`RecordingNotifier`]: Captures every notification in order
//! - [`FailingNotifier`]: Fails (or hangs) on every call and counts attempts

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

use crate::notify::{Notifier, NotifyError, TASK_STARTED_TITLE};

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// A notifier that records what it was asked to show.
///
/// # Example
///
/// ```
/// use tasker::testing::RecordingNotifier;
/// use tasker::Notifier;
///
/// # tokio_test_block(async {
/// let notifier = RecordingNotifier::new();
/// notifier.notify("New Task", "stretch").await.unwrap();
/// assert_eq!(notifier.started().await, vec!["stretch"]);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    changed: Notify,
}

impl RecordingNotifier {
    /// Create a new recording notifier.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every notification so far.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// Bodies of the "task started" notifications, which are the task titles
    /// in the order they ran.
    pub async fn started(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|n| n.title == TASK_STARTED_TITLE)
            .map(|n| n.body.clone())
            .collect()
    }

    /// Wait until at least `count` notifications were recorded.
    ///
    /// Returns `false` if the timeout elapsed first.
    pub async fn wait_for_count(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.changed.notified();
                if self.sent.lock().await.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().await.push(Notification {
            title: title.to_string(),
            body: body.to_string(),
        });
        self.changed.notify_waiters();
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// A notifier that never delivers anything.
#[derive(Debug, Default)]
pub struct FailingNotifier {
    attempts: AtomicUsize,
    hang: bool,
    changed: Notify,
}

impl FailingNotifier {
    /// A notifier whose every call fails immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call blocks forever.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    /// Number of calls so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` calls were made.
    ///
    /// Returns `false` if the timeout elapsed first.
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.changed.notified();
                if self.attempts() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.changed.notify_waiters();
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(NotifyError::CommandFailed {
            program: "failing".to_string(),
            code: 1,
            stderr: "simulated failure".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}
