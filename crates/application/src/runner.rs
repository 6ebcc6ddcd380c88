//! Concurrency-bounded task runner.
//!
//! Executes zero-argument async tasks with at most `limit` in flight. A shared
//! [`CancellationToken`] is checked before each launch and while waiting for a
//! slot; once it fires no new task starts and the run ends as
//! [`RunnerError::Aborted`]. Ordinary task failures are collected and logged,
//! never propagated, so one failing task cannot stop the others.

use benchmaker_common::CancellationToken;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// How a single task ended unsuccessfully
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The task observed the cancellation signal
    #[error("task cancelled")]
    Cancelled,

    /// Any other failure
    #[error("task failed: {0}")]
    Failed(String),
}

/// A failure swallowed by the runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    /// Position of the task in the input list
    pub index: usize,
    /// Failure message
    pub message: String,
}

/// What happened to the submitted tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunnerReport {
    /// Tasks submitted
    pub submitted: usize,
    /// Tasks started
    pub launched: usize,
    /// Tasks that returned `Ok`
    pub succeeded: usize,
    /// Tasks that reported cancellation
    pub cancelled: usize,
    /// Tasks that failed, in completion order
    pub failures: Vec<TaskFailure>,
}

impl RunnerReport {
    /// Tasks never started
    pub fn not_started(&self) -> usize {
        self.submitted - self.launched
    }
}

/// Distinguished abort condition, separate from task failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunnerError {
    /// Cancellation stopped the run; the report covers what did run
    #[error("run aborted by cancellation")]
    Aborted(RunnerReport),
}

/// Runs tasks with a fixed concurrency ceiling
#[derive(Debug, Clone)]
pub struct TaskRunner {
    limit: usize,
}

impl TaskRunner {
    /// Runner allowing `limit` tasks in flight; a limit of 0 is treated as 1
    pub fn new(limit: usize) -> Self {
        Self { limit: limit.max(1) }
    }

    /// Concurrency ceiling
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run every task, each started at most once.
    ///
    /// Tasks already in flight when cancellation fires are left to unwind on
    /// their own and are awaited before returning.
    pub async fn run<T, Fut>(
        &self,
        tasks: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<RunnerReport, RunnerError>
    where
        T: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut join_set = JoinSet::new();
        let mut report = RunnerReport {
            submitted: tasks.len(),
            ..Default::default()
        };
        let mut aborted = false;

        for (index, task) in tasks.into_iter().enumerate() {
            if cancel.is_cancelled() {
                aborted = true;
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                aborted = true;
                break;
            };
            if cancel.is_cancelled() {
                aborted = true;
                break;
            }

            report.launched += 1;
            join_set.spawn(async move {
                let _permit = permit;
                (index, task().await)
            });
        }

        if aborted {
            debug!(
                launched = report.launched,
                submitted = report.submitted,
                "Cancellation observed, no further tasks will start"
            );
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.succeeded += 1,
                Ok((_, Err(TaskError::Cancelled))) => {
                    report.cancelled += 1;
                    aborted = true;
                }
                Ok((index, Err(TaskError::Failed(message)))) => {
                    warn!(task = index, error = %message, "Task failed");
                    report.failures.push(TaskFailure { index, message });
                }
                Err(join_error) => {
                    warn!(error = %join_error, "Task panicked or was aborted");
                    report.failures.push(TaskFailure {
                        index: usize::MAX,
                        message: join_error.to_string(),
                    });
                }
            }
        }

        if aborted {
            Err(RunnerError::Aborted(report))
        } else {
            Ok(report)
        }
    }
}
