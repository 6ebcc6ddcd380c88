//! Whole-state snapshot exchanged with the persistence layer.

use crate::identifiers::RunId;
use crate::run::RunResult;
use crate::test_case::TestSuite;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 2;

/// Suites and runs as one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Format version
    pub version: u32,
    /// Last save time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Test suites
    #[serde(default)]
    pub test_suites: Vec<TestSuite>,
    /// Runs, oldest first
    #[serde(default)]
    pub runs: Vec<RunResult>,
    /// Suite selected in the front end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_test_suite_id: Option<String>,
    /// Run most recently started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_run_id: Option<RunId>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            updated_at: Utc::now(),
            test_suites: Vec::new(),
            runs: Vec::new(),
            active_test_suite_id: None,
            current_run_id: None,
        }
    }
}

impl Snapshot {
    /// Look up a suite
    pub fn suite(&self, id: &str) -> Option<&TestSuite> {
        self.test_suites.iter().find(|s| s.id == id)
    }

    /// Look up a run
    pub fn run(&self, id: &RunId) -> Option<&RunResult> {
        self.runs.iter().find(|r| &r.id == id)
    }

    /// Runs over one suite, oldest first
    pub fn runs_for_suite<'a>(&'a self, suite_id: &'a str) -> impl Iterator<Item = &'a RunResult> + 'a {
        self.runs.iter().filter(move |r| r.test_suite_id == suite_id)
    }

    /// Insert or replace a suite by id
    pub fn upsert_suite(&mut self, suite: TestSuite) {
        match self.test_suites.iter_mut().find(|s| s.id == suite.id) {
            Some(existing) => *existing = suite,
            None => self.test_suites.push(suite),
        }
    }

    /// Insert or replace a run by id and make it current
    pub fn upsert_run(&mut self, run: RunResult) {
        self.current_run_id = Some(run.id);
        match self.runs.iter_mut().find(|r| r.id == run.id) {
            Some(existing) => *existing = run,
            None => self.runs.push(run),
        }
    }

    /// Stamp the save time
    pub fn touch(&mut self) {
        self.version = SNAPSHOT_VERSION;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ModelParameters;

    #[test]
    fn upsert_replaces_existing_entries() {
        let mut snapshot = Snapshot::default();
        let mut suite = TestSuite::new("s1", "First");
        snapshot.upsert_suite(suite.clone());
        suite.name = "Renamed".into();
        snapshot.upsert_suite(suite);
        assert_eq!(snapshot.test_suites.len(), 1);
        assert_eq!(snapshot.suite("s1").unwrap().name, "Renamed");

        let run = RunResult::new(snapshot.suite("s1").unwrap(), vec![], ModelParameters::default(), None);
        let id = run.id;
        snapshot.upsert_run(run.clone());
        snapshot.upsert_run(run);
        assert_eq!(snapshot.runs.len(), 1);
        assert_eq!(snapshot.current_run_id, Some(id));
        assert_eq!(snapshot.runs_for_suite("s1").count(), 1);
    }
}
