//! Storage contracts used by the orchestrator and front ends.

use async_trait::async_trait;
use benchmaker_domain::{ResultUpdate, RunId, RunResult, ScoringResult, Snapshot, StoreError};

/// Live store of runs being executed.
///
/// Updates are keyed by (run, test case, model) and are last-write-wins per
/// key. Implementations must serialize updates to the same key but need not
/// serialize across keys. A sealed run rejects further mutation.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Register a new run with its pre-populated results
    async fn create_run(&self, run: RunResult) -> Result<RunResult, StoreError>;

    /// Apply a partial update to one result
    async fn update_result(
        &self,
        run_id: RunId,
        test_case_id: &str,
        model_id: &str,
        update: ResultUpdate,
    ) -> Result<(), StoreError>;

    /// Attach a score to one result
    async fn set_score(
        &self,
        run_id: RunId,
        test_case_id: &str,
        model_id: &str,
        score: ScoringResult,
    ) -> Result<(), StoreError>;

    /// Seal a run; anything still running becomes cancelled
    async fn seal_run(&self, run_id: RunId, cancelled: bool) -> Result<RunResult, StoreError>;

    /// Fetch a copy of a run
    async fn get_run(&self, run_id: RunId) -> Result<RunResult, StoreError>;

    /// All runs, oldest first
    async fn list_runs(&self) -> Result<Vec<RunResult>, StoreError>;
}

/// Whole-state persistence of suites and runs
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot; an absent snapshot loads as empty
    async fn load(&self) -> Result<Snapshot, StoreError>;

    /// Replace the stored snapshot
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}
