//! Depth-first dependency tree construction.
//!
//! The walk is preorder over declared dependencies and runs on an explicit
//! stack of frames, so deep manifest chains never grow the call stack.
//! A package's version is fixed by whichever reference to it is reached
//! first in that order; later references are not expanded.

use std::fmt;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use depscan_core::coordinate::Coordinate;
use depscan_core::dependency::{DeclaredDependency, Dependency, Exclusion};

use crate::conflict::{ConflictReport, VersionConflict};
use crate::manifest::ManifestResolver;
use crate::reconcile;
use crate::state::{ActivePath, ExclusionSet, TraversalFault, VersionLedger};

const MEDIATION_REASON: &str = "first declared wins";

/// Output of one [`build_dep_tree`] run.
#[derive(Debug)]
pub struct DepTree {
    /// `None` only when the root manifest itself could not be resolved.
    pub root: Option<Dependency>,
    pub ledger: VersionLedger,
    pub conflicts: ConflictReport,
    /// Branches pruned during the walk, in the order they were hit.
    pub warnings: Vec<TraversalWarning>,
    /// Cancellation stopped the walk; `root` holds what was built so far.
    pub cancelled: bool,
}

impl DepTree {
    /// Align every node with the ledger. Returns the number of rewrites.
    pub fn reconcile(&mut self) -> usize {
        match self.root.as_mut() {
            Some(root) => reconcile::reconcile(root, &self.ledger),
            None => 0,
        }
    }
}

/// A branch dropped from the tree without failing the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraversalWarning {
    /// The manifest could not be fetched or parsed.
    ResolutionFailed {
        coordinate: Coordinate,
        referenced_by: Option<Coordinate>,
        reason: String,
    },
    /// A declaration without a usable version (or group/artifact).
    IncompleteCoordinate {
        coordinate: Coordinate,
        referenced_by: Coordinate,
    },
}

impl fmt::Display for TraversalWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolutionFailed {
                coordinate,
                referenced_by: Some(parent),
                reason,
            } => write!(f, "failed to resolve {coordinate} (required by {parent}): {reason}"),
            Self::ResolutionFailed {
                coordinate,
                referenced_by: None,
                reason,
            } => write!(f, "failed to resolve {coordinate}: {reason}"),
            Self::IncompleteCoordinate {
                coordinate,
                referenced_by,
            } => write!(
                f,
                "skipped incomplete coordinate {coordinate} declared in {referenced_by}"
            ),
        }
    }
}

/// Resolve the full dependency tree below `root`.
///
/// Unresolvable branches are pruned and reported in
/// [`DepTree::warnings`]. The only errors are [`TraversalFault`]s.
/// The returned tree is not yet reconciled; see [`DepTree::reconcile`].
pub async fn build_dep_tree<R: ManifestResolver>(
    cancel: &CancellationToken,
    resolver: &R,
    root: &Coordinate,
) -> Result<DepTree, TraversalFault> {
    DepTreeBuilder::new(cancel, resolver).build(root).await
}

/// One expanded node whose declared dependencies are still being walked.
struct Frame {
    node: Dependency,
    /// The coordinate put on the active path for this frame.
    coordinate: Coordinate,
    pending: std::vec::IntoIter<DeclaredDependency>,
    /// Exclusions of the edge that opened this frame, popped when it closes.
    edge_exclusions: Vec<Exclusion>,
}

impl Frame {
    /// Next declared dependency that survives scope and optional filtering.
    fn next_followed(&mut self) -> Option<DeclaredDependency> {
        self.pending.find(DeclaredDependency::is_followed)
    }
}

enum Visit {
    Expanded(Frame),
    Skipped,
    Cancelled,
}

struct DepTreeBuilder<'a, R> {
    cancel: &'a CancellationToken,
    resolver: &'a R,
    active: ActivePath,
    exclusions: ExclusionSet,
    ledger: VersionLedger,
    conflicts: ConflictReport,
    warnings: Vec<TraversalWarning>,
}

impl<'a, R: ManifestResolver> DepTreeBuilder<'a, R> {
    fn new(cancel: &'a CancellationToken, resolver: &'a R) -> Self {
        Self {
            cancel,
            resolver,
            active: ActivePath::new(),
            exclusions: ExclusionSet::new(),
            ledger: VersionLedger::new(),
            conflicts: ConflictReport::new(),
            warnings: Vec::new(),
        }
    }

    async fn build(mut self, root: &Coordinate) -> Result<DepTree, TraversalFault> {
        let mut stack: Vec<Frame> = Vec::new();
        let mut tree = None;
        let mut cancelled = false;

        match self.visit(root.clone(), None).await? {
            Visit::Expanded(frame) => stack.push(frame),
            Visit::Skipped => {}
            Visit::Cancelled => cancelled = true,
        }

        while let Some(frame) = stack.last_mut() {
            // Once cancelled, every open frame is closed without further expansion.
            let next = if cancelled {
                None
            } else {
                frame.next_followed()
            };

            let Some(dep) = next else {
                if let Some(done) = stack.pop() {
                    let node = self.close(done)?;
                    match stack.last_mut() {
                        Some(parent) => parent.node.children.push(node),
                        None => tree = Some(node),
                    }
                }
                continue;
            };

            let parent = frame.coordinate.clone();
            if !dep.coordinate.is_complete() {
                warn!(
                    coordinate = %dep.coordinate,
                    referenced_by = %parent,
                    reason = "incomplete_coordinate",
                    "incomplete coordinate, skipped"
                );
                self.warnings.push(TraversalWarning::IncompleteCoordinate {
                    coordinate: dep.coordinate,
                    referenced_by: parent,
                });
                continue;
            }

            self.exclusions.push(&dep.exclusions);
            match self.visit(dep.coordinate, Some(&parent)).await? {
                Visit::Expanded(mut child) => {
                    child.edge_exclusions = dep.exclusions;
                    stack.push(child);
                }
                Visit::Skipped => self.exclusions.pop(&dep.exclusions)?,
                Visit::Cancelled => {
                    self.exclusions.pop(&dep.exclusions)?;
                    cancelled = true;
                }
            }
        }

        if cancelled {
            debug!("dependency walk cancelled, returning partial tree");
        }

        Ok(DepTree {
            root: tree,
            ledger: self.ledger,
            conflicts: self.conflicts,
            warnings: self.warnings,
            cancelled,
        })
    }

    /// Skip check, resolve, mediate and enter the active path for one reference.
    async fn visit(
        &mut self,
        requested: Coordinate,
        referenced_by: Option<&Coordinate>,
    ) -> Result<Visit, TraversalFault> {
        if self.cancel.is_cancelled() {
            return Ok(Visit::Cancelled);
        }

        let key = requested.key();
        if self.active.contains(&requested) {
            debug!(coordinate = %requested, "cycle, skipped");
            return Ok(Visit::Skipped);
        }
        if self.exclusions.is_excluded(&key) {
            debug!(coordinate = %requested, "excluded, skipped");
            return Ok(Visit::Skipped);
        }
        if let Some(resolved) = self.ledger.get(&key) {
            if resolved != requested.version {
                self.conflicts.add(VersionConflict {
                    group: requested.group_id.clone(),
                    artifact: requested.artifact_id.clone(),
                    requested: requested.version.clone(),
                    resolved: resolved.to_string(),
                    requested_by: referenced_by.map(|p| p.to_string()).unwrap_or_default(),
                    reason: MEDIATION_REASON.to_string(),
                });
            }
            debug!(coordinate = %requested, resolved, "already resolved, skipped");
            return Ok(Visit::Skipped);
        }

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(Visit::Cancelled),
            result = self.resolver.resolve(self.cancel, &requested) => result,
        };
        let manifest = match result {
            Ok(manifest) => manifest,
            Err(_) if self.cancel.is_cancelled() => return Ok(Visit::Cancelled),
            Err(e) => {
                let reason = e.to_string();
                match referenced_by {
                    Some(parent) => warn!(
                        coordinate = %requested,
                        referenced_by = %parent,
                        reason = "resolution_failed",
                        error = %reason,
                        "failed to resolve manifest, branch pruned"
                    ),
                    None => warn!(
                        coordinate = %requested,
                        reason = "resolution_failed",
                        error = %reason,
                        "failed to resolve root manifest"
                    ),
                }
                self.warnings.push(TraversalWarning::ResolutionFailed {
                    coordinate: requested,
                    referenced_by: referenced_by.cloned(),
                    reason,
                });
                return Ok(Visit::Skipped);
            }
        };

        let pending = manifest.list_declared_dependencies().to_vec();
        let resolved = if manifest.coordinate.is_complete() {
            manifest.coordinate
        } else {
            requested.clone()
        };

        // A manifest that names a package other than the one requested, which
        // was already resolved elsewhere, is treated as that package.
        let resolved_key = resolved.key();
        if resolved_key != key {
            if let Some(existing) = self.ledger.get(&resolved_key).map(str::to_string) {
                debug!(
                    coordinate = %requested,
                    resolved = %resolved,
                    "manifest resolves to an already-resolved package, skipped"
                );
                self.ledger.record(key, &existing);
                return Ok(Visit::Skipped);
            }
            self.ledger.record(resolved_key, &resolved.version);
        }
        self.ledger.record(key, &resolved.version);

        self.active.enter(resolved.clone())?;
        Ok(Visit::Expanded(Frame {
            node: Dependency::new(resolved.clone()),
            coordinate: resolved,
            pending: pending.into_iter(),
            edge_exclusions: Vec::new(),
        }))
    }

    fn close(&mut self, frame: Frame) -> Result<Dependency, TraversalFault> {
        self.active.exit(&frame.coordinate);
        self.exclusions.pop(&frame.edge_exclusions)?;
        Ok(frame.node)
    }
}
