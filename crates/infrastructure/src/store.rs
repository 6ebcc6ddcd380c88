//! In-memory result store.
//!
//! Holds every run behind one lock. Updates to the same key are serialized by
//! that lock; the store never holds it across an await point.

use async_trait::async_trait;
use benchmaker_application::ResultStore;
use benchmaker_domain::{ResultUpdate, RunId, RunResult, ScoringResult, StoreError, TestCaseResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Process-local [`ResultStore`]
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    runs: RwLock<HashMap<RunId, RunResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with runs, typically from a snapshot
    pub fn with_runs(runs: impl IntoIterator<Item = RunResult>) -> Self {
        Self {
            runs: RwLock::new(runs.into_iter().map(|run| (run.id, run)).collect()),
        }
    }

    /// Number of runs held
    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }

    /// Mutate one result of an unsealed run
    fn with_result<F>(&self, run_id: RunId, test_case_id: &str, model_id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut TestCaseResult),
    {
        let mut runs = self.runs.write();
        let run = runs.get_mut(&run_id).ok_or(StoreError::RunNotFound(run_id))?;
        if run.is_sealed() {
            return Err(StoreError::Sealed(run_id));
        }
        let result = run
            .result_mut(test_case_id, model_id)
            .ok_or_else(|| StoreError::ResultNotFound {
                run_id,
                test_case_id: test_case_id.to_string(),
                model_id: model_id.to_string(),
            })?;
        f(result);
        Ok(())
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    #[instrument(skip(self, run), fields(run_id = %run.id))]
    async fn create_run(&self, run: RunResult) -> Result<RunResult, StoreError> {
        debug!(results = run.results.len(), "Creating run");
        self.runs.write().insert(run.id, run.clone());
        Ok(run)
    }

    async fn update_result(
        &self,
        run_id: RunId,
        test_case_id: &str,
        model_id: &str,
        update: ResultUpdate,
    ) -> Result<(), StoreError> {
        self.with_result(run_id, test_case_id, model_id, |result| update.apply(result))
    }

    async fn set_score(
        &self,
        run_id: RunId,
        test_case_id: &str,
        model_id: &str,
        score: ScoringResult,
    ) -> Result<(), StoreError> {
        self.with_result(run_id, test_case_id, model_id, |result| result.score = Some(score))
    }

    #[instrument(skip(self))]
    async fn seal_run(&self, run_id: RunId, cancelled: bool) -> Result<RunResult, StoreError> {
        let mut runs = self.runs.write();
        let run = runs.get_mut(&run_id).ok_or(StoreError::RunNotFound(run_id))?;
        run.seal(cancelled);
        Ok(run.clone())
    }

    async fn get_run(&self, run_id: RunId) -> Result<RunResult, StoreError> {
        self.runs
            .read()
            .get(&run_id)
            .cloned()
            .ok_or(StoreError::RunNotFound(run_id))
    }

    async fn list_runs(&self) -> Result<Vec<RunResult>, StoreError> {
        let mut runs: Vec<RunResult> = self.runs.read().values().cloned().collect();
        runs.sort_by_key(|run| run.started_at);
        Ok(runs)
    }
}
