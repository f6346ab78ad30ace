//! POM file parsing: coordinates, parent reference, dependency declarations, exclusions.
//!
//! Only what the tree builder needs is read. `<dependencyManagement>`,
//! profiles and build plugins are skipped, and `${...}` placeholders are
//! left unresolved.

use quick_xml::events::Event;
use quick_xml::Reader;

use depscan_core::coordinate::Coordinate;
use depscan_core::dependency::{DeclaredDependency, DependencyScope, Exclusion, WILDCARD};
use depscan_util::errors::ScanError;

/// A parsed POM (Project Object Model) file.
#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub dependencies: Vec<PomDependency>,
    pub modules: Vec<String>,
}

/// Reference to a parent POM.
#[derive(Debug, Clone, Default)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// A dependency declared in a POM file.
#[derive(Debug, Clone, Default)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: Option<String>,
    pub exclusions: Vec<PomExclusion>,
}

/// An exclusion within a dependency declaration.
#[derive(Debug, Clone, Default)]
pub struct PomExclusion {
    pub group_id: String,
    pub artifact_id: Option<String>,
}

impl Pom {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// The coordinate this POM declares for itself.
    ///
    /// Missing or placeholder fields come back empty, so the result may be
    /// incomplete.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(
            literal(self.effective_group_id()),
            literal(self.artifact_id.as_deref()),
            literal(self.effective_version()),
        )
    }

    /// Dependency declarations in document order.
    pub fn declared_dependencies(&self) -> Vec<DeclaredDependency> {
        self.dependencies
            .iter()
            .map(PomDependency::to_declared)
            .collect()
    }
}

impl PomDependency {
    fn to_declared(&self) -> DeclaredDependency {
        let coordinate = Coordinate::new(
            literal(Some(&self.group_id)),
            literal(Some(&self.artifact_id)),
            literal(self.version.as_deref()),
        );
        DeclaredDependency {
            coordinate,
            scope: DependencyScope::parse(self.scope.as_deref()),
            optional: self.optional.as_deref().map(str::trim) == Some("true"),
            exclusions: self
                .exclusions
                .iter()
                .map(|e| {
                    Exclusion::new(
                        e.group_id.trim(),
                        e.artifact_id.as_deref().map(str::trim).unwrap_or(WILDCARD),
                    )
                })
                .collect(),
        }
    }
}

/// Trimmed value, or empty when absent or still holding a `${...}` placeholder.
fn literal(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.contains("${") => v.to_string(),
        _ => String::new(),
    }
}

const DEPENDENCY: &str = "project>dependencies>dependency";
const EXCLUSION: &str = "project>dependencies>dependency>exclusions>exclusion";
const DEPENDENCY_FIELD: &str = "project>dependencies>dependency>";
const EXCLUSION_FIELD: &str = "project>dependencies>dependency>exclusions>exclusion>";

/// Parse a POM XML string into a `Pom` struct.
pub fn parse_pom(xml: &str) -> miette::Result<Pom> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    let mut current_dep: Option<PomDependency> = None;
    let mut current_exclusion: Option<PomExclusion> = None;
    let mut current_parent: Option<ParentRef> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
                text_buf.clear();

                match path.join(">").as_str() {
                    DEPENDENCY => current_dep = Some(PomDependency::default()),
                    EXCLUSION => current_exclusion = Some(PomExclusion::default()),
                    "project>parent" => current_parent = Some(ParentRef::default()),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::CData(e)) => {
                text_buf = String::from_utf8_lossy(&e.into_inner()).to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path.join(">");
                let value = std::mem::take(&mut text_buf);

                match ctx.as_str() {
                    "project>groupId" => pom.group_id = Some(value),
                    "project>artifactId" => pom.artifact_id = Some(value),
                    "project>version" => pom.version = Some(value),
                    "project>packaging" => pom.packaging = Some(value),
                    "project>modules>module" => pom.modules.push(value),
                    "project>parent" => pom.parent = current_parent.take(),
                    DEPENDENCY => {
                        if let Some(dep) = current_dep.take() {
                            pom.dependencies.push(dep);
                        }
                    }
                    EXCLUSION => {
                        if let (Some(dep), Some(excl)) =
                            (current_dep.as_mut(), current_exclusion.take())
                        {
                            dep.exclusions.push(excl);
                        }
                    }
                    _ => {
                        if let Some(field) = ctx.strip_prefix("project>parent>") {
                            if let Some(parent) = current_parent.as_mut() {
                                match field {
                                    "groupId" => parent.group_id = value,
                                    "artifactId" => parent.artifact_id = value,
                                    "version" => parent.version = value,
                                    _ => {}
                                }
                            }
                        } else if let Some(field) = ctx.strip_prefix(EXCLUSION_FIELD) {
                            if let Some(excl) = current_exclusion.as_mut() {
                                match field {
                                    "groupId" => excl.group_id = value,
                                    "artifactId" => excl.artifact_id = Some(value),
                                    _ => {}
                                }
                            }
                        } else if let Some(field) = ctx.strip_prefix(DEPENDENCY_FIELD) {
                            if let Some(dep) = current_dep.as_mut() {
                                match field {
                                    "groupId" => dep.group_id = value,
                                    "artifactId" => dep.artifact_id = value,
                                    "version" => dep.version = Some(value),
                                    "scope" => dep.scope = Some(value),
                                    "optional" => dep.optional = Some(value),
                                    _ => {}
                                }
                            }
                        }
                    }
                }

                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ScanError::Manifest {
                    message: format!(
                        "Failed to parse POM XML at byte {}: {e}",
                        reader.buffer_position()
                    ),
                }
                .into());
            }
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(ScanError::Manifest {
            message: format!("Unclosed element <{}> in POM", path.join(">")),
        }
        .into());
    }

    Ok(pom)
}
