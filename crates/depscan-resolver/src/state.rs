//! Traversal state owned by a single tree-builder run.
//!
//! None of these types are shared across runs or threads.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use depscan_core::coordinate::{Coordinate, PackageKey};
use depscan_core::dependency::Exclusion;

/// The builder's bookkeeping was violated.
///
/// These are defects in the traversal itself. No manifest input, however
/// malformed, is expected to produce one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalFault {
    #[error("{0} entered the active path while already on it")]
    Reactivated(Coordinate),

    #[error("exclusion count for {0} dropped below zero")]
    NegativeExclusion(PackageKey),
}

/// Coordinates on the current depth-first path, for cycle detection.
#[derive(Debug, Default)]
pub struct ActivePath {
    entries: HashSet<Coordinate>,
}

impl ActivePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.entries.contains(coordinate)
    }

    /// Push a coordinate onto the path. Re-entering an active coordinate is a fault.
    pub fn enter(&mut self, coordinate: Coordinate) -> Result<(), TraversalFault> {
        if self.entries.contains(&coordinate) {
            return Err(TraversalFault::Reactivated(coordinate));
        }
        self.entries.insert(coordinate);
        Ok(())
    }

    pub fn exit(&mut self, coordinate: &Coordinate) {
        self.entries.remove(coordinate);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reference-counted exclusions contributed by the edges on the current path.
///
/// Several ancestors may exclude the same package independently; it stays
/// suppressed until every one of them has been popped.
#[derive(Debug, Default)]
pub struct ExclusionSet {
    counts: HashMap<Exclusion, usize>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, exclusions: &[Exclusion]) {
        for exclusion in exclusions {
            *self.counts.entry(exclusion.clone()).or_insert(0) += 1;
        }
    }

    /// Undo a matching [`push`](Self::push).
    pub fn pop(&mut self, exclusions: &[Exclusion]) -> Result<(), TraversalFault> {
        for exclusion in exclusions {
            match self.counts.get_mut(exclusion) {
                Some(count) if *count > 1 => *count -= 1,
                Some(_) => {
                    self.counts.remove(exclusion);
                }
                None => return Err(TraversalFault::NegativeExclusion(exclusion.key())),
            }
        }
        Ok(())
    }

    /// Whether any active exclusion, wildcards included, matches `key`.
    pub fn is_excluded(&self, key: &PackageKey) -> bool {
        self.counts.keys().any(|exclusion| exclusion.matches(key))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// The version first resolved for each `group:artifact` during one build.
///
/// Entries are never overwritten.
#[derive(Debug, Clone, Default)]
pub struct VersionLedger {
    versions: HashMap<PackageKey, String>,
}

impl VersionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `version` for `key` unless one is already recorded.
    /// Returns whether the entry was inserted.
    pub fn record(&mut self, key: PackageKey, version: &str) -> bool {
        if self.versions.contains_key(&key) {
            return false;
        }
        self.versions.insert(key, version.to_string());
        true
    }

    pub fn get(&self, key: &PackageKey) -> Option<&str> {
        self.versions.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &PackageKey) -> bool {
        self.versions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageKey, &str)> {
        self.versions.iter().map(|(k, v)| (k, v.as_str()))
    }
}
