//! Dependency tree resolution engine.
//!
//! [`builder::build_dep_tree`] walks manifests depth-first from a root
//! coordinate, filtering scopes, applying exclusions, breaking cycles and
//! mediating versions first-declared-wins. [`reconcile::reconcile`] then
//! aligns every node with the mediated versions.

pub mod builder;
pub mod conflict;
pub mod manifest;
pub mod pom_resolver;
pub mod reconcile;
pub mod render;
pub mod state;
