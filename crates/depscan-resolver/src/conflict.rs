//! Version conflicts observed during first-declared-wins mediation.

use std::fmt;

use serde::Serialize;

/// All version conflicts encountered during one build.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// A reference whose requested version lost to the version already
/// resolved for the same `group:artifact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionConflict {
    pub group: String,
    pub artifact: String,
    pub requested: String,
    pub resolved: String,
    /// `group:artifact:version` of the manifest that made the request.
    pub requested_by: String,
    pub reason: String,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionConflict> {
        self.conflicts.iter()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} requested {} by {} but resolved {} ({})",
            self.group, self.artifact, self.requested, self.requested_by, self.resolved, self.reason
        )
    }
}
