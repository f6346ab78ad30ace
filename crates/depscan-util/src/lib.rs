//! Shared utilities for depscan.
//!
//! Cross-cutting concerns used by the other depscan crates: the unified
//! error type and Cargo-style terminal status output.

pub mod errors;
pub mod progress;
