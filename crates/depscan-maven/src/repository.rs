//! Maven repository abstraction: URL layout and configuration.

use depscan_core::config::RepositoryEntry;
use depscan_core::coordinate::Coordinate;

/// Maven Central base URL.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// A configured remote Maven repository with optional credentials.
#[derive(Debug, Clone)]
pub struct MavenRepository {
    pub name: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl MavenRepository {
    /// Build a repository from a name and a config `RepositoryEntry`.
    pub fn from_entry(name: &str, entry: &RepositoryEntry) -> Self {
        let (username, password) = match entry {
            RepositoryEntry::Url(_) => (None, None),
            RepositoryEntry::Detailed {
                username, password, ..
            } => (username.clone(), password.clone()),
        };
        Self {
            name: name.to_string(),
            url: entry.url().trim_end_matches('/').to_string(),
            username,
            password,
        }
    }

    /// Construct the default Maven Central repository.
    pub fn maven_central() -> Self {
        Self {
            name: "maven-central".to_string(),
            url: MAVEN_CENTRAL_URL.to_string(),
            username: None,
            password: None,
        }
    }

    pub fn is_maven_central(&self) -> bool {
        self.url.contains("repo.maven.apache.org") || self.url.contains("repo1.maven.org")
    }

    /// Standard Maven layout path for a coordinate's directory.
    ///
    /// `org.slf4j:slf4j-api:2.0.9` becomes `org/slf4j/slf4j-api/2.0.9`
    pub fn coordinate_path(coordinate: &Coordinate) -> String {
        format!(
            "{}/{}/{}",
            coordinate.group_id.replace('.', "/"),
            coordinate.artifact_id,
            coordinate.version
        )
    }

    /// File name of the POM for a coordinate: `slf4j-api-2.0.9.pom`.
    pub fn pom_file_name(coordinate: &Coordinate) -> String {
        format!("{}-{}.pom", coordinate.artifact_id, coordinate.version)
    }

    /// URL to the POM file for a given coordinate.
    pub fn pom_url(&self, coordinate: &Coordinate) -> String {
        format!(
            "{}/{}/{}",
            self.url,
            Self::coordinate_path(coordinate),
            Self::pom_file_name(coordinate)
        )
    }

    /// Whether this repository has authentication configured.
    pub fn has_auth(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}

/// Repositories from the user config in name order, always ending with
/// Maven Central.
pub fn configured_repositories<'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a RepositoryEntry)>,
) -> Vec<MavenRepository> {
    let mut repos: Vec<MavenRepository> = entries
        .into_iter()
        .map(|(name, entry)| MavenRepository::from_entry(name, entry))
        .collect();
    if !repos.iter().any(MavenRepository::is_maven_central) {
        repos.push(MavenRepository::maven_central());
    }
    repos
}
