//! End-to-end announcement scenarios.
//!
//! Each test queues tasks through a handle and checks what the notifier was
//! asked to show, and in which order.

use std::time::Duration;
use tasker::testing::{FailingNotifier, RecordingNotifier};
use tasker::{
    Event, SchedulerError, TASK_STARTED_TITLE, TIME_EXPIRED_TITLE, notify::time_expired_body,
};

use crate::common::{MINUTE, PATIENCE, scheduler_with_events, wait_until};

#[tokio::test]
async fn test_higher_priority_runs_first_and_waits_its_duration() {
    let notifier = RecordingNotifier::new();
    let (scheduler, handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    handle
        .add_with_priority("write report", 5.0, 1u32)
        .await
        .unwrap();
    handle
        .add_with_priority("clean desk", 10.0, 2u32)
        .await
        .unwrap();

    assert!(notifier.wait_for_count(4, PATIENCE).await);

    let sent = notifier.notifications().await;
    let shown: Vec<(&str, &str)> = sent
        .iter()
        .map(|n| (n.title.as_str(), n.body.as_str()))
        .collect();
    let report_done = time_expired_body("write report");
    let desk_done = time_expired_body("clean desk");
    assert_eq!(
        shown,
        vec![
            (TASK_STARTED_TITLE, "write report"),
            (TIME_EXPIRED_TITLE, report_done.as_str()),
            (TASK_STARTED_TITLE, "clean desk"),
            (TIME_EXPIRED_TITLE, desk_done.as_str()),
        ]
    );

    let events = handler.events().await;
    let report_elapsed = events
        .iter()
        .find_map(|e| match e {
            Event::TaskFinished { name, elapsed, .. } if name.as_str() == "write report" => {
                Some(*elapsed)
            }
            _ => None,
        })
        .unwrap();
    assert!(report_elapsed >= MINUTE * 5);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_equal_priorities_run_in_insertion_order() {
    let notifier = RecordingNotifier::new();
    let (scheduler, _handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    for name in ["one", "two", "three"] {
        handle.add_with_priority(name, 0.0, 4u32).await.unwrap();
    }
    handle.add_with_priority("urgent", 0.0, 1u32).await.unwrap();

    assert!(notifier.wait_for_count(8, PATIENCE).await);
    assert_eq!(
        notifier.started().await,
        vec!["urgent", "one", "two", "three"]
    );

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_deleted_task_is_never_announced() {
    let notifier = RecordingNotifier::new();
    let (scheduler, handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    handle.add_with_priority("A", 3.0, 1u32).await.unwrap();
    handle.delete("A").await.unwrap();
    handle.add_with_priority("B", 3.0, 2u32).await.unwrap();

    assert!(notifier.wait_for_count(2, PATIENCE).await);
    // Leave room for a wrongly surviving "A" to show up.
    tokio::time::sleep(MINUTE * 4).await;

    assert_eq!(notifier.started().await, vec!["B"]);
    assert_eq!(handler.finished().await, vec!["B"]);
    assert_eq!(handler.discarded().await, 1);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_delete_during_run_does_not_affect_running_task() {
    let notifier = RecordingNotifier::new();
    let (scheduler, handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    handle.add("long", 4.0).await.unwrap();
    assert!(notifier.wait_for_count(1, PATIENCE).await);

    handle.delete("long").await.unwrap();
    assert!(handle.current().await.unwrap().is_some());

    wait_until("the running task to finish", PATIENCE, || async {
        !handler.finished().await.is_empty()
    })
    .await;
    assert_eq!(handler.finished().await, vec!["long"]);
    assert_eq!(notifier.notifications().await.len(), 2);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_reprioritize_moves_task_and_keeps_duration() {
    let notifier = RecordingNotifier::new();
    let (scheduler, handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    handle.add_with_priority("Y", 0.0, 1u32).await.unwrap();
    handle.add_with_priority("X", 1.0, 5u32).await.unwrap();
    handle.reprioritize("X", 1u32).await.unwrap();

    let pending = handle.pending().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[1].name.as_str(), "X");
    assert_eq!(pending[1].minutes, 1.0);

    assert!(notifier.wait_for_count(4, PATIENCE).await);
    // X goes to the back of priority 1, behind Y.
    assert_eq!(notifier.started().await, vec!["Y", "X"]);

    let events = handler.events().await;
    assert!(events.iter().any(|e| matches!(
        e,
        Event::TaskStarted { name, minutes, .. } if name.as_str() == "X" && *minutes == 1.0
    )));

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_reprioritize_deleted_task_is_not_found() {
    let notifier = RecordingNotifier::new();
    let (scheduler, _handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    handle.add_with_priority("gone", 1.0, 2u32).await.unwrap();
    handle.delete("gone").await.unwrap();

    let result = handle.reprioritize("gone", 1u32).await;
    assert!(matches!(result, Err(SchedulerError::TaskNotFound(_))));

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let notifier = RecordingNotifier::new();
    let (scheduler, _handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    handle.add("twice", 1.0).await.unwrap();
    handle.delete("twice").await.unwrap();
    handle.delete("twice").await.unwrap();
    handle.delete("never added").await.unwrap();

    assert!(handle.pending().await.unwrap().is_empty());

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_duplicate_add_supersedes_earlier_entry() {
    let notifier = RecordingNotifier::new();
    let (scheduler, handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    handle.add_with_priority("dup", 9.0, 1u32).await.unwrap();
    handle.add_with_priority("other", 0.0, 2u32).await.unwrap();
    handle.add_with_priority("dup", 0.0, 3u32).await.unwrap();

    let pending = handle.pending().await.unwrap();
    assert_eq!(pending.len(), 2);

    assert!(notifier.wait_for_count(4, PATIENCE).await);
    tokio::time::sleep(MINUTE * 2).await;

    assert_eq!(notifier.started().await, vec!["other", "dup"]);
    assert_eq!(handler.discarded().await, 1);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_backlog_drains_without_polling_between_tasks() {
    let notifier = RecordingNotifier::new();
    let (scheduler, _handler) = scheduler_with_events(notifier.clone()).await;
    let scheduler = scheduler.with_poll_interval(Duration::from_millis(400));
    let (handle, task) = scheduler.start();

    for i in 0..5 {
        handle.add(format!("task {}", i), 0.0).await.unwrap();
    }

    let start = std::time::Instant::now();
    assert!(notifier.wait_for_count(10, PATIENCE).await);
    // One poll, then back to back.
    assert!(start.elapsed() < Duration::from_millis(800));

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_failed_notifications_do_not_stop_the_loop() {
    let notifier = std::sync::Arc::new(FailingNotifier::new());
    let (scheduler, handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    handle.add_with_priority("first", 0.0, 1u32).await.unwrap();
    handle.add_with_priority("second", 0.0, 2u32).await.unwrap();

    wait_until("both tasks to finish", PATIENCE, || async {
        handler.finished().await.len() == 2
    })
    .await;

    assert_eq!(handler.finished().await, vec!["first", "second"]);
    assert_eq!(notifier.attempts(), 4);
    assert!(!handle.is_stopped().await);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}
