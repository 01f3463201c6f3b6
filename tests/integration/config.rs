//! Configuration-driven runs.

use std::io::Write;
use std::sync::Arc;
use tasker::testing::RecordingNotifier;
use tasker::{ConfigError, NotifierConfig, Scheduler, YamlLoader};
use tempfile::NamedTempFile;

use crate::common::PATIENCE;

#[tokio::test]
async fn test_config_file_tasks_run_in_priority_order() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
poll_interval_secs: 0.05
minute_secs: 0.01
notifier:
  type: log
tasks:
  - title: inbox zero
    minutes: 2
  - title: write report
    minutes: 1
    priority: 1
  - title: review
    minutes: 1
    priority: 1
"#
    )
    .unwrap();

    let config = YamlLoader::load_config(file.path()).unwrap();
    assert_eq!(config.notifier, NotifierConfig::Log);

    let notifier = RecordingNotifier::new();
    let scheduler = Scheduler::from_config(&config, notifier.clone()).unwrap();
    let (handle, task) = scheduler.start();

    assert!(notifier.wait_for_count(6, PATIENCE).await);
    assert_eq!(
        notifier.started().await,
        vec!["write report", "review", "inbox zero"]
    );

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_configured_default_priority_applies_to_handle_adds() {
    let config = YamlLoader::parse_config("poll_interval_secs: 3600\ndefault_priority: 3\n").unwrap();
    let scheduler = Scheduler::from_config(&config, RecordingNotifier::new()).unwrap();
    let (handle, task) = scheduler.start();

    handle.add_with_priority("later", 1.0, 4u32).await.unwrap();
    handle.add("sooner", 1.0).await.unwrap();

    let pending = handle.pending().await.unwrap();
    assert_eq!(pending[0].name.as_str(), "sooner");
    assert_eq!(pending[0].priority.get(), 3);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[test]
fn test_invalid_config_is_rejected_before_start() {
    let mut config = YamlLoader::parse_config("{}").unwrap();
    config.minute_secs = 0.0;

    let result = Scheduler::from_config(&config, Arc::new(tasker::LogNotifier::new()));
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}
