//! Operation: scan a Maven project and resolve its dependency tree.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use depscan_core::config::GlobalConfig;
use depscan_core::coordinate::Coordinate;
use depscan_core::dependency::Dependency;
use depscan_maven::pom::{self, Pom};
use depscan_resolver::builder::{self, TraversalWarning};
use depscan_resolver::conflict::ConflictReport;
use depscan_resolver::pom_resolver::PomResolver;
use depscan_util::errors::ScanError;
use depscan_util::progress;

/// Options for `depscan scan`.
#[derive(Debug, Default)]
pub struct ScanOptions {
    /// Never touch the network, whatever the config says.
    pub offline: bool,
    /// Config file to use instead of `~/.depscan/config.toml`.
    pub config: Option<PathBuf>,
}

/// Result of a scan, as printed or serialized by the CLI.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub tree: Option<Dependency>,
    pub warnings: Vec<TraversalWarning>,
    pub conflicts: ConflictReport,
    /// The scan was interrupted; `tree` is partial.
    #[serde(skip)]
    pub cancelled: bool,
}

impl ScanReport {
    /// `{ "tree": ..., "warnings": [...], "conflicts": [...] }`
    pub fn to_json(&self) -> miette::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ScanError::Generic {
                message: format!("Failed to serialize scan report: {e}"),
            }
            .into()
        })
    }

    /// Number of nodes in the tree, root included.
    pub fn package_count(&self) -> usize {
        self.tree.as_ref().map_or(0, Dependency::node_count)
    }
}

/// Resolve the dependency tree of the Maven project in `dir`.
pub async fn scan(
    dir: &Path,
    opts: &ScanOptions,
    cancel: &CancellationToken,
) -> miette::Result<ScanReport> {
    let project = read_project(dir)?;
    let root = project.coordinate();
    if !root.is_complete() {
        return Err(ScanError::Manifest {
            message: format!(
                "{} does not declare a complete coordinate (got {root})",
                dir.join("pom.xml").display()
            ),
        }
        .into());
    }
    if !project.modules.is_empty() {
        warn!(
            modules = ?project.modules,
            "multi-module project, only the aggregator POM is scanned"
        );
    }

    let config = match &opts.config {
        Some(path) => GlobalConfig::from_path(path)?,
        None => GlobalConfig::load()?,
    };

    let mut resolver = PomResolver::from_config(&config, opts.offline)?;
    if let Some(parent) = local_parent(dir, &project) {
        resolver = resolver.with_project(parent);
    }
    let resolver = resolver.with_project(project);
    info!(root = %root, offline = resolver.is_offline(), "scanning project");

    progress::status("Scanning", &root.to_string());
    let pb = progress::spinner(&format!("Resolving dependencies of {root}"));
    let built = builder::build_dep_tree(cancel, &resolver, &root).await;
    pb.finish_and_clear();

    let mut tree = built.map_err(|fault| ScanError::Internal {
        message: fault.to_string(),
    })?;
    let rewritten = tree.reconcile();
    debug!(rewritten, "versions reconciled");

    if tree.root.is_none() && !tree.cancelled {
        return Err(ScanError::Resolution {
            message: format!("could not resolve the project manifest {root}"),
        }
        .into());
    }

    Ok(ScanReport {
        tree: tree.root,
        warnings: tree.warnings,
        conflicts: tree.conflicts,
        cancelled: tree.cancelled,
    })
}

fn read_project(dir: &Path) -> miette::Result<Pom> {
    let path = dir.join("pom.xml");
    if !path.is_file() {
        return Err(ScanError::Manifest {
            message: format!("No pom.xml found in {}", dir.display()),
        }
        .into());
    }
    let xml = std::fs::read_to_string(&path).map_err(ScanError::Io)?;
    pom::parse_pom(&xml)
}

/// The parent POM at `../pom.xml`, when it is the parent `project` names.
fn local_parent(dir: &Path, project: &Pom) -> Option<Pom> {
    let parent = project.parent.as_ref()?;
    let wanted = Coordinate::new(
        parent.group_id.trim(),
        parent.artifact_id.trim(),
        parent.version.trim(),
    );
    let path = std::path::absolute(dir).ok()?.parent()?.join("pom.xml");
    let xml = std::fs::read_to_string(&path).ok()?;
    match pom::parse_pom(&xml) {
        Ok(candidate) if candidate.coordinate() == wanted => Some(candidate),
        Ok(candidate) => {
            debug!(
                path = %path.display(),
                found = %candidate.coordinate(),
                wanted = %wanted,
                "../pom.xml is not the declared parent"
            );
            None
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "unreadable ../pom.xml");
            None
        }
    }
}
