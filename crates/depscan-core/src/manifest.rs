//! The resolved form of one package manifest, as handed to the tree builder.

use crate::coordinate::Coordinate;
use crate::dependency::DeclaredDependency;

/// A manifest after fetching and parsing.
///
/// `coordinate` is authoritative: it is what the manifest says about
/// itself, which may differ from the coordinate that was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    pub coordinate: Coordinate,
    pub dependencies: Vec<DeclaredDependency>,
}

impl ResolvedManifest {
    pub fn new(coordinate: Coordinate, dependencies: Vec<DeclaredDependency>) -> Self {
        Self {
            coordinate,
            dependencies,
        }
    }

    /// Declared dependencies in manifest order.
    pub fn list_declared_dependencies(&self) -> &[DeclaredDependency] {
        &self.dependencies
    }
}
