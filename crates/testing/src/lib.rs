//! Testing utilities for benchmaker
//!
//! This crate provides testing utilities including:
//! - Test fixtures for suites, models and judge replies
//! - Builder patterns for test cases, suites and finished runs
//! - A scripted inference gateway and an in-memory result store
//! - Property-based testing utilities
//!
//! # Examples
//!
//! ```
//! use benchmaker_testing::{builders::*, fixtures::*};
//!
//! let suite = TestSuiteBuilder::new()
//!     .with_name("Arithmetic")
//!     .with_exact_cases(3)
//!     .build();
//! assert_eq!(suite.test_cases.len(), 3);
//!
//! let models = create_test_models(2);
//! assert_eq!(models[1].id, "model-b");
//! ```

pub mod builders;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use builders::*;
pub use fixtures::*;
pub use mocks::*;

// Re-export testing dependencies for convenience
pub use fake;
pub use proptest;
pub use wiremock;
