use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coordinate::{Coordinate, PackageKey};

/// Maven-compatible dependency scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DependencyScope {
    #[default]
    Compile,
    Runtime,
    Test,
    Provided,
    System,
    Import,
    Other(String),
}

impl DependencyScope {
    /// Parse a scope tag; an absent or empty tag means the default scope.
    pub fn parse(tag: Option<&str>) -> Self {
        match tag.map(str::trim).unwrap_or("") {
            "" | "compile" => Self::Compile,
            "runtime" => Self::Runtime,
            "test" => Self::Test,
            "provided" => Self::Provided,
            "system" => Self::System,
            "import" => Self::Import,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether an edge with this scope is followed transitively.
    pub fn is_transitive(&self) -> bool {
        matches!(self, Self::Compile | Self::Runtime)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::Provided => "provided",
            Self::System => "system",
            Self::Import => "import",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matches any group id or artifact id in an exclusion.
pub const WILDCARD: &str = "*";

/// Suppresses a package anywhere beneath the edge that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    /// Exclude a whole group (`group:*`).
    pub fn group(group_id: impl Into<String>) -> Self {
        Self::new(group_id, WILDCARD)
    }

    pub fn key(&self) -> PackageKey {
        PackageKey::new(&self.group_id, &self.artifact_id)
    }

    /// Either side may be [`WILDCARD`], so `*:*` matches every package.
    pub fn matches(&self, key: &PackageKey) -> bool {
        (self.group_id == WILDCARD || self.group_id == key.group_id)
            && (self.artifact_id == WILDCARD || self.artifact_id == key.artifact_id)
    }
}

/// One dependency edge as written in a manifest.
///
/// The target's group and artifact are always known; its version may be
/// empty when the manifest leaves it to property or BOM resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub coordinate: Coordinate,
    pub scope: DependencyScope,
    pub optional: bool,
    pub exclusions: Vec<Exclusion>,
}

impl DeclaredDependency {
    /// A non-optional compile-scope edge with no exclusions.
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            scope: DependencyScope::Compile,
            optional: false,
            exclusions: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: DependencyScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn excluding(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    /// Whether this edge contributes to the runtime dependency tree.
    pub fn is_followed(&self) -> bool {
        self.scope.is_transitive() && !self.optional
    }
}

/// A node in the resolved dependency tree.
///
/// Children keep manifest declaration order. The serialized field order
/// (`group_id`, `artifact_id`, `version`, `children`) is part of the
/// output contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default)]
    pub children: Vec<Dependency>,
}

impl Dependency {
    /// A leaf node for the given coordinate.
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            group_id: coordinate.group_id,
            artifact_id: coordinate.artifact_id,
            version: coordinate.version,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Dependency>) -> Self {
        self.children = children;
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(&self.group_id, &self.artifact_id, &self.version)
    }

    pub fn key(&self) -> PackageKey {
        PackageKey::new(&self.group_id, &self.artifact_id)
    }

    /// Visit every node in preorder together with its depth (root = 0).
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Dependency, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a Dependency, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Mutable preorder visit. Only node contents may change, not shape.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Dependency)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, _| count += 1);
        count
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}
