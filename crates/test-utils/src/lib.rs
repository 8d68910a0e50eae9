//! Shared test utilities for the end-of-night dashboard workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Fixture text for every per-night asset and the night registry
//! - Generators for gzip payloads, JPEG images and complete night directories
//! - Temporary local-mode roots populated with a night's assets
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, night_assets, local_root_with_night};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;
