//! Tests for the concurrency-bounded task runner

use benchmaker_application::{RunnerError, TaskError, TaskRunner};
use benchmaker_common::CancellationToken;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn test_never_exceeds_limit() {
    let gauge = Arc::new(Gauge::default());
    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let gauge = gauge.clone();
            move || async move {
                gauge.enter();
                tokio::time::sleep(Duration::from_millis(10 + (i % 7) * 5)).await;
                gauge.exit();
                Ok::<(), TaskError>(())
            }
        })
        .collect();

    let report = TaskRunner::new(5)
        .run(tasks, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.submitted, 20);
    assert_eq!(report.launched, 20);
    assert_eq!(report.succeeded, 20);
    assert_eq!(gauge.started.load(Ordering::SeqCst), 20);
    assert!(gauge.peak.load(Ordering::SeqCst) <= 5);
    assert_eq!(gauge.peak.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_failures_are_collected_not_raised() {
    let tasks: Vec<_> = (0..6)
        .map(|i| {
            move || async move {
                if i % 3 == 0 {
                    Err(TaskError::Failed(format!("task {} broke", i)))
                } else {
                    Ok(())
                }
            }
        })
        .collect();

    let report = TaskRunner::new(2)
        .run(tasks, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failures.len(), 2);
    let mut failed: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
    failed.sort();
    assert_eq!(failed, vec![0, 3]);
}

#[tokio::test]
async fn test_zero_limit_is_treated_as_one() {
    let runner = TaskRunner::new(0);
    assert_eq!(runner.limit(), 1);

    let tasks: Vec<_> = (0..3).map(|_| || async { Ok::<(), TaskError>(()) }).collect();
    let report = runner.run(tasks, &CancellationToken::new()).await.unwrap();
    assert_eq!(report.succeeded, 3);
}

#[tokio::test]
async fn test_empty_task_list() {
    let tasks: Vec<fn() -> std::future::Ready<Result<(), TaskError>>> = Vec::new();
    let report = TaskRunner::new(5)
        .run(tasks, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.submitted, 0);
}

#[tokio::test]
async fn test_already_cancelled_starts_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let gauge = Arc::new(Gauge::default());

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let gauge = gauge.clone();
            move || async move {
                gauge.enter();
                gauge.exit();
                Ok::<(), TaskError>(())
            }
        })
        .collect();

    let err = TaskRunner::new(2).run(tasks, &cancel).await.unwrap_err();
    let RunnerError::Aborted(report) = err;
    assert_eq!(report.launched, 0);
    assert_eq!(report.not_started(), 4);
    assert_eq!(gauge.started.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_new_launches() {
    let cancel = CancellationToken::new();
    let gauge = Arc::new(Gauge::default());

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let gauge = gauge.clone();
            let cancel = cancel.clone();
            move || async move {
                gauge.enter();
                let outcome = cancel.sleep(Duration::from_secs(10)).await;
                gauge.exit();
                outcome.map_err(|_| TaskError::Cancelled)
            }
        })
        .collect();

    let trigger = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        })
    };

    let err = TaskRunner::new(3).run(tasks, &cancel).await.unwrap_err();
    trigger.await.unwrap();

    let RunnerError::Aborted(report) = err;
    assert_eq!(report.launched, 3);
    assert_eq!(report.cancelled, 3);
    assert_eq!(report.not_started(), 17);
    assert_eq!(gauge.started.load(Ordering::SeqCst), 3);
    assert_eq!(gauge.current.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_task_reporting_cancelled_aborts_run() {
    let tasks: Vec<_> = (0..2)
        .map(|i| {
            move || async move {
                if i == 0 {
                    Err(TaskError::Cancelled)
                } else {
                    Ok(())
                }
            }
        })
        .collect();

    let result = TaskRunner::new(1).run(tasks, &CancellationToken::new()).await;
    assert!(matches!(result, Err(RunnerError::Aborted(report)) if report.cancelled == 1));
}
