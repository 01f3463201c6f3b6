//! Concurrent callers sharing one scheduler.
//!
//! Handles are cloned across tokio tasks; every mutation must be applied
//! whole, whatever the interleaving with the loop.

use std::collections::HashSet;
use std::time::Duration;
use tasker::testing::RecordingNotifier;
use tasker::{Priority, Scheduler, Task};

use crate::common::{PATIENCE, scheduler_with_events, wait_until};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_are_all_announced_once() {
    let notifier = RecordingNotifier::new();
    let (scheduler, handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    let mut callers = Vec::new();
    for caller in 0..8 {
        let handle = handle.clone();
        callers.push(tokio::spawn(async move {
            for i in 0..5u32 {
                handle
                    .add_with_priority(format!("c{}-t{}", caller, i), 0.0, (i % 3) + 1)
                    .await
                    .unwrap();
            }
        }));
    }
    for caller in callers {
        caller.await.unwrap();
    }

    assert!(notifier.wait_for_count(80, PATIENCE).await);

    let started = notifier.started().await;
    assert_eq!(started.len(), 40);
    let unique: HashSet<_> = started.iter().collect();
    assert_eq!(unique.len(), 40);
    wait_until("every task to finish", PATIENCE, || async {
        handler.finished().await.len() == 40
    })
    .await;

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_pop_order_follows_priority_then_insertion() {
    let notifier = RecordingNotifier::new();
    // Long poll so the whole batch is queued before the first pop.
    let mut scheduler = Scheduler::new(notifier.clone())
        .with_poll_interval(Duration::from_millis(150))
        .with_minute(Duration::from_millis(1));

    let mut expected: Vec<(u32, usize, String)> = Vec::new();
    for i in 0..30usize {
        let priority = ((i * 7) % 4 + 1) as u32;
        let name = format!("t{:02}", i);
        scheduler.enqueue(Task::new(name.as_str(), 0.0, Priority::new(priority)).unwrap());
        expected.push((priority, i, name));
    }
    expected.sort();

    let (handle, task) = scheduler.start();
    assert!(notifier.wait_for_count(60, PATIENCE).await);

    let expected: Vec<String> = expected.into_iter().map(|(_, _, name)| name).collect();
    assert_eq!(notifier.started().await, expected);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_deletes_racing_the_loop_never_announce_deleted_tasks() {
    let notifier = RecordingNotifier::new();
    let (scheduler, _handler) = scheduler_with_events(notifier.clone()).await;
    let (handle, task) = scheduler.start();

    for i in 0..20 {
        handle.add(format!("task {}", i), 0.0).await.unwrap();
    }

    let deleter = {
        let handle = handle.clone();
        tokio::spawn(async move {
            let mut deleted = Vec::new();
            for i in (0..20).step_by(2) {
                let name = format!("task {}", i);
                handle.delete(name.as_str()).await.unwrap();
                deleted.push(name);
            }
            deleted
        })
    };
    let deleted = deleter.await.unwrap();

    // Deletes finished inside the first idle period.
    assert!(notifier.wait_for_count(20, PATIENCE).await);
    tokio::time::sleep(Duration::from_millis(150)).await;

    let started = notifier.started().await;
    assert_eq!(started.len(), 10);
    for name in &deleted {
        assert!(!started.contains(name), "{} was deleted but announced", name);
    }

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_heavy_churn_keeps_queue_consistent() {
    let notifier = RecordingNotifier::new();
    let scheduler = Scheduler::new(notifier.clone())
        .with_poll_interval(Duration::from_secs(3600));
    let (handle, task) = scheduler.start();

    // Enough superseded nodes to trigger compaction.
    for round in 0..100u32 {
        handle
            .add_with_priority("churn", 1.0, round % 5 + 1)
            .await
            .unwrap();
        handle
            .reprioritize("churn", round % 3 + 1)
            .await
            .unwrap();
    }
    handle.add_with_priority("steady", 1.0, 1u32).await.unwrap();

    let pending = handle.pending().await.unwrap();
    let names: Vec<_> = pending.iter().map(|s| s.name.to_string()).collect();
    assert_eq!(pending.len(), 2);
    assert!(names.contains(&"churn".to_string()));
    assert!(names.contains(&"steady".to_string()));
    assert!(notifier.notifications().await.is_empty());

    handle.shutdown().await.unwrap();
    let _ = task.await;
}
