//! Infrastructure layer for benchmaker
//!
//! This crate provides implementations for:
//! - The inference gateway (OpenAI-compatible HTTP API with SSE streaming)
//! - An in-memory result store for live runs
//! - JSON-file snapshot persistence of suites and runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use benchmaker_infrastructure::{HttpInferenceGateway, InMemoryResultStore, JsonSnapshotStore};
//!
//! let config = AppConfig::load()?;
//! let gateway = HttpInferenceGateway::new(&config.gateway)?;
//! let snapshots = JsonSnapshotStore::new(&config.storage.snapshot_path);
//! let store = InMemoryResultStore::with_runs(snapshots.load().await?.runs);
//! ```

pub mod gateway;
pub mod snapshot;
pub mod store;

// Re-export commonly used types
pub use gateway::HttpInferenceGateway;
pub use snapshot::JsonSnapshotStore;
pub use store::InMemoryResultStore;
