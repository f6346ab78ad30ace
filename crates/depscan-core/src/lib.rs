//! Core data types for depscan.
//!
//! This crate defines the values the resolution engine works with: package
//! coordinates, dependency declarations as read from a manifest, the
//! resolved dependency tree, and the user configuration.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod config;
pub mod coordinate;
pub mod dependency;
pub mod manifest;
