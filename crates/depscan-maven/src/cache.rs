//! On-disk POM store mirroring the Maven repository layout.
//!
//! The same layout serves the writable download cache and the read-only
//! local Maven repository (`~/.m2/repository`).

use std::fs;
use std::path::PathBuf;

use depscan_core::coordinate::Coordinate;
use depscan_util::errors::ScanError;

use crate::repository::MavenRepository;

/// A directory of POM files laid out as `<group-path>/<artifact>/<version>/`.
#[derive(Debug, Clone)]
pub struct PomCache {
    root: PathBuf,
}

impl PomCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path within the cache for a coordinate's POM.
    pub fn pom_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.root
            .join(MavenRepository::coordinate_path(coordinate))
            .join(MavenRepository::pom_file_name(coordinate))
    }

    /// Cached POM XML, if present and readable.
    pub fn get(&self, coordinate: &Coordinate) -> Option<String> {
        let path = self.pom_path(coordinate);
        if !path.is_file() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unreadable cached POM");
                None
            }
        }
    }

    /// Store POM XML, creating directories as needed.
    pub fn put(&self, coordinate: &Coordinate, pom_xml: &str) -> miette::Result<PathBuf> {
        let path = self.pom_path(coordinate);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(ScanError::Io)?;
        }
        fs::write(&path, pom_xml).map_err(ScanError::Io)?;
        Ok(path)
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.pom_path(coordinate).is_file()
    }
}
