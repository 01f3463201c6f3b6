//! Log-only notifier.

use async_trait::async_trait;

use super::{Notifier, NotifyError};

/// Writes notifications to the log instead of the desktop.
///
/// Used when the platform has no notification program, or when configured
/// explicitly for headless runs.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(title = %title, "{}", body);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
