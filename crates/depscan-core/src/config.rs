use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use depscan_util::errors::ScanError;

/// Environment variable overriding the depscan data directory.
pub const HOME_ENV: &str = "DEPSCAN_HOME";

/// User configuration loaded from `~/.depscan/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default, rename = "local-repository")]
    pub local_repository: LocalRepositoryConfig,

    /// Remote repositories, consulted in name order before Maven Central.
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryEntry>,
}

/// Scan behaviour from `[scan]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub offline: bool,
    #[serde(default = "default_true", rename = "verify-checksums")]
    pub verify_checksums: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            offline: false,
            verify_checksums: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Downloaded POM cache from `[cache]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> String {
    "~/.depscan/cache".to_string()
}

/// Read-only local Maven repository from `[local-repository]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalRepositoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_local_repository")]
    pub path: String,
}

impl Default for LocalRepositoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_local_repository(),
        }
    }
}

fn default_local_repository() -> String {
    "~/.m2/repository".to_string()
}

/// A repository given either as a bare URL or with credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepositoryEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}

impl RepositoryEntry {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) | Self::Detailed { url, .. } => url,
        }
    }
}

impl GlobalConfig {
    /// Load `~/.depscan/config.toml`, or defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        let path = Self::default_path();
        if path.is_file() {
            Self::from_path(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load a configuration file that must exist.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ScanError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            ScanError::Config {
                message: format!("Failed to parse config: {e}"),
            }
            .into()
        })
    }

    /// Returns the default path to the config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// The POM cache directory with `~` expanded.
    pub fn cache_dir(&self) -> PathBuf {
        expand_home(&self.cache.dir)
    }

    /// The local Maven repository, if enabled.
    pub fn local_repository_dir(&self) -> Option<PathBuf> {
        self.local_repository
            .enabled
            .then(|| expand_home(&self.local_repository.path))
    }
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

/// Returns the depscan data directory: `$DEPSCAN_HOME` or `~/.depscan/`.
pub fn dirs_path() -> PathBuf {
    match std::env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home_dir().join(".depscan"),
    }
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None if path == "~" => home_dir(),
        None => PathBuf::from(path),
    }
}
