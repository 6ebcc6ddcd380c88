//! Benchmaker domain types
//!
//! Core data model for benchmarking language models against shared test suites.
//!
//! ## Modules
//!
//! - **identifiers**: Time-ordered run identifiers
//! - **test_case**: Test cases, suites and scoring methods
//! - **parameters**: Sampling parameters and the benchmark-mode override
//! - **model**: Models, pricing, chat messages and completions
//! - **run**: Runs, per-pair results and partial updates
//! - **scoring**: Normalized scoring results
//! - **stats**: Derived multi-run statistics and comparisons
//! - **snapshot**: Whole-state snapshot for persistence
//! - **errors**: Error taxonomy
//! - **validation**: Validation result types
//!
//! ## Usage
//!
//! ```rust
//! use benchmaker_domain::{ModelParameters, RunResult, ScoringMethod, TestCase, TestSuite};
//!
//! let mut suite = TestSuite::new("arith", "Arithmetic");
//! suite.test_cases.push(
//!     TestCase::new("t1", "What is 6 * 7?", ScoringMethod::NumericTolerance).with_expected("42"),
//! );
//!
//! let run = RunResult::new(&suite, vec!["model-a".into()], ModelParameters::default(), None);
//! assert_eq!(run.results.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod identifiers;
pub mod model;
pub mod parameters;
pub mod run;
pub mod scoring;
pub mod snapshot;
pub mod stats;
pub mod test_case;
pub mod validation;

pub use errors::{AppError, AppResult, GatewayError, StatsError, StoreError};
pub use identifiers::RunId;
pub use model::{ChatCompletion, ChatMessage, ChatRole, ModelInfo, ModelPricing, TokenUsage};
pub use parameters::ModelParameters;
pub use run::{ResultKey, ResultStatus, ResultUpdate, RunResult, RunStatus, RunSummary, TestCaseResult};
pub use scoring::ScoringResult;
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use stats::{ComparisonReport, ModelComparison, MultiRunStats, NotComparable, TestMethod};
pub use test_case::{Difficulty, ScoringMethod, TestCase, TestCaseMetadata, TestSuite};
pub use validation::{IssueSeverity, ValidationIssue, ValidationResult};
