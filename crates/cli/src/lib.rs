//! Benchmaker CLI library
//!
//! This library provides the command implementations behind the `benchmaker`
//! binary: listing models, executing runs, browsing stored runs and comparing
//! them statistically.

pub mod commands;
pub mod output;
pub mod progress;

pub use anyhow::{Context, Result};
