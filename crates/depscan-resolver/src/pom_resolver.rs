//! Maven-backed [`ManifestResolver`].
//!
//! Sources are consulted in order: the scanned project's own POMs, the
//! local Maven repository, the depscan POM cache and finally the remote
//! repositories. Remote downloads are written back into the cache.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use depscan_core::config::GlobalConfig;
use depscan_core::coordinate::Coordinate;
use depscan_core::dependency::DeclaredDependency;
use depscan_core::manifest::ResolvedManifest;
use depscan_maven::cache::PomCache;
use depscan_maven::pom::{self, ParentRef, Pom};
use depscan_maven::repository::{self, MavenRepository};
use depscan_maven::{checksum, download};
use depscan_util::errors::ScanError;

use crate::manifest::ManifestResolver;

/// Parent POM hops followed before giving up on inheritance.
const MAX_PARENT_DEPTH: usize = 16;

pub struct PomResolver {
    project: HashMap<Coordinate, Pom>,
    local: Option<PomCache>,
    cache: PomCache,
    remote: Option<Remote>,
    verify_checksums: bool,
    memo: Mutex<HashMap<Coordinate, ResolvedManifest>>,
}

struct Remote {
    client: Client,
    repos: Vec<MavenRepository>,
}

impl PomResolver {
    /// An offline resolver reading only from `cache`.
    pub fn new(cache: PomCache) -> Self {
        Self {
            project: HashMap::new(),
            local: None,
            cache,
            remote: None,
            verify_checksums: true,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Build a resolver from user configuration. `offline` forces network
    /// access off regardless of `[scan] offline`.
    pub fn from_config(config: &GlobalConfig, offline: bool) -> miette::Result<Self> {
        let mut resolver = Self::new(PomCache::new(config.cache_dir()))
            .with_checksums(config.scan.verify_checksums);
        if let Some(dir) = config.local_repository_dir() {
            resolver = resolver.with_local_repository(dir);
        }
        if !offline && !config.scan.offline {
            let client = download::build_client()?;
            let repos = repository::configured_repositories(&config.repositories);
            resolver = resolver.with_remote(client, repos);
        }
        Ok(resolver)
    }

    /// Read-only local Maven repository (`~/.m2/repository` layout).
    pub fn with_local_repository(mut self, root: impl Into<PathBuf>) -> Self {
        self.local = Some(PomCache::new(root));
        self
    }

    pub fn with_remote(mut self, client: Client, repos: Vec<MavenRepository>) -> Self {
        self.remote = Some(Remote { client, repos });
        self
    }

    pub fn with_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Serve `pom` for its own coordinate ahead of every other source.
    pub fn with_project(mut self, pom: Pom) -> Self {
        self.project.insert(pom.coordinate(), pom);
        self
    }

    pub fn is_offline(&self) -> bool {
        self.remote.is_none()
    }

    fn memo(&self) -> MutexGuard<'_, HashMap<Coordinate, ResolvedManifest>> {
        self.memo.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn memoized(&self, coordinate: &Coordinate) -> Option<ResolvedManifest> {
        self.memo().get(coordinate).cloned()
    }

    async fn load(
        &self,
        cancel: &CancellationToken,
        coordinate: &Coordinate,
    ) -> miette::Result<Pom> {
        if let Some(pom) = self.project.get(coordinate) {
            debug!(coordinate = %coordinate, source = "project", "POM found");
            return Ok(pom.clone());
        }
        if let Some(xml) = self.local.as_ref().and_then(|local| local.get(coordinate)) {
            debug!(coordinate = %coordinate, source = "local-repository", "POM found");
            return pom::parse_pom(&xml);
        }
        if let Some(xml) = self.cache.get(coordinate) {
            debug!(coordinate = %coordinate, source = "cache", "POM found");
            return pom::parse_pom(&xml);
        }

        let Some(remote) = &self.remote else {
            return Err(ScanError::Resolution {
                message: format!("{coordinate} not found locally (offline)"),
            }
            .into());
        };

        let mut last_err = None;
        for repo in &remote.repos {
            let url = repo.pom_url(coordinate);
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScanError::Cancelled.into()),
                fetched = self.fetch(remote, repo, &url) => fetched,
            };
            match fetched {
                Ok(Some(xml)) => {
                    let pom = pom::parse_pom(&xml)?;
                    if let Err(e) = self.cache.put(coordinate, &xml) {
                        warn!(coordinate = %coordinate, error = %e, "failed to cache POM");
                    }
                    info!(coordinate = %coordinate, repository = %repo.name, "downloaded POM");
                    return Ok(pom);
                }
                Ok(None) => continue,
                Err(e) => {
                    debug!(repository = %repo.name, url, error = %e, "repository fetch failed");
                    last_err = Some(e);
                }
            }
        }

        let message = match last_err {
            Some(e) => format!("{coordinate} not found in any repository (last error: {e})"),
            None => format!("{coordinate} not found in any repository"),
        };
        Err(ScanError::Resolution { message }.into())
    }

    async fn fetch(
        &self,
        remote: &Remote,
        repo: &MavenRepository,
        url: &str,
    ) -> miette::Result<Option<String>> {
        let Some(bytes) = download::download_bytes(&remote.client, repo, url).await? else {
            return Ok(None);
        };
        if self.verify_checksums {
            checksum::verify(&remote.client, repo, url, &bytes).await?;
        }
        String::from_utf8(bytes).map(Some).map_err(|e| {
            ScanError::Network {
                message: format!("{url} is not valid UTF-8: {e}"),
            }
            .into()
        })
    }

    /// Append dependencies declared by the parent chain. A dependency the
    /// child already declares for the same `group:artifact` wins.
    async fn inherit(
        &self,
        cancel: &CancellationToken,
        pom: &Pom,
        dependencies: &mut Vec<DeclaredDependency>,
    ) -> miette::Result<()> {
        let mut seen = HashSet::new();
        let mut next = pom.parent.as_ref().map(parent_coordinate);

        while let Some(parent) = next.take() {
            if !parent.is_complete() {
                debug!(parent = %parent, "incomplete parent reference, not followed");
                break;
            }
            if seen.len() >= MAX_PARENT_DEPTH || !seen.insert(parent.clone()) {
                warn!(parent = %parent, "parent chain too deep or cyclic, inheritance stopped");
                break;
            }

            let parent_pom = match self.load(cancel, &parent).await {
                Ok(p) => p,
                Err(_) if cancel.is_cancelled() => return Err(ScanError::Cancelled.into()),
                Err(e) => {
                    warn!(
                        parent = %parent,
                        error = %e,
                        "parent POM unavailable, inherited dependencies skipped"
                    );
                    break;
                }
            };

            for dep in parent_pom.declared_dependencies() {
                let key = dep.coordinate.key();
                if !dependencies.iter().any(|d| d.coordinate.key() == key) {
                    dependencies.push(dep);
                }
            }
            next = parent_pom.parent.as_ref().map(parent_coordinate);
        }
        Ok(())
    }
}

fn parent_coordinate(parent: &ParentRef) -> Coordinate {
    Coordinate::new(
        parent.group_id.trim(),
        parent.artifact_id.trim(),
        parent.version.trim(),
    )
}

impl ManifestResolver for PomResolver {
    async fn resolve(
        &self,
        cancel: &CancellationToken,
        coordinate: &Coordinate,
    ) -> miette::Result<ResolvedManifest> {
        if let Some(manifest) = self.memoized(coordinate) {
            return Ok(manifest);
        }

        let pom = self.load(cancel, coordinate).await?;
        let mut dependencies = pom.declared_dependencies();
        self.inherit(cancel, &pom, &mut dependencies).await?;

        let manifest = ResolvedManifest::new(pom.coordinate(), dependencies);
        self.memo().insert(coordinate.clone(), manifest.clone());
        Ok(manifest)
    }
}
