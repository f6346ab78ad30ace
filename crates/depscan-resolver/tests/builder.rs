use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use depscan_core::coordinate::{Coordinate, PackageKey};
use depscan_core::dependency::{DeclaredDependency, Dependency, DependencyScope, Exclusion};
use depscan_core::manifest::ResolvedManifest;
use depscan_resolver::builder::{build_dep_tree, DepTree, TraversalWarning};
use depscan_resolver::manifest::ManifestResolver;

/// Manifests held in memory, optionally cancelling the build when a given
/// coordinate is requested.
#[derive(Default)]
struct MemoryResolver {
    manifests: HashMap<Coordinate, ResolvedManifest>,
    cancel_on: Option<(Coordinate, CancellationToken)>,
    requests: Mutex<Vec<Coordinate>>,
}

impl MemoryResolver {
    fn with(mut self, coordinate: Coordinate, dependencies: Vec<DeclaredDependency>) -> Self {
        self.manifests.insert(
            coordinate.clone(),
            ResolvedManifest::new(coordinate, dependencies),
        );
        self
    }

    /// Serve `manifest` when `requested` is asked for.
    fn serving(mut self, requested: Coordinate, manifest: ResolvedManifest) -> Self {
        self.manifests.insert(requested, manifest);
        self
    }

    fn cancelling_at(mut self, coordinate: Coordinate, token: &CancellationToken) -> Self {
        self.cancel_on = Some((coordinate, token.clone()));
        self
    }

    fn requests(&self) -> Vec<Coordinate> {
        self.requests.lock().unwrap().clone()
    }
}

impl ManifestResolver for MemoryResolver {
    async fn resolve(
        &self,
        _cancel: &CancellationToken,
        coordinate: &Coordinate,
    ) -> miette::Result<ResolvedManifest> {
        self.requests.lock().unwrap().push(coordinate.clone());
        if let Some((trigger, token)) = &self.cancel_on {
            if trigger == coordinate {
                token.cancel();
                return std::future::pending().await;
            }
        }
        self.manifests
            .get(coordinate)
            .cloned()
            .ok_or_else(|| miette::miette!("no manifest for {coordinate}"))
    }
}

fn c(artifact: &str, version: &str) -> Coordinate {
    Coordinate::new("g", artifact, version)
}

fn dep(artifact: &str, version: &str) -> DeclaredDependency {
    DeclaredDependency::new(c(artifact, version))
}

/// Compact tree notation: `artifact@version[child,child]`.
fn shape(node: &Dependency) -> String {
    if node.children.is_empty() {
        format!("{}@{}", node.artifact_id, node.version)
    } else {
        let children: Vec<String> = node.children.iter().map(shape).collect();
        format!("{}@{}[{}]", node.artifact_id, node.version, children.join(","))
    }
}

async fn build(resolver: &MemoryResolver, root: Coordinate) -> DepTree {
    build_dep_tree(&CancellationToken::new(), resolver, &root)
        .await
        .expect("no traversal fault")
}

fn tree_shape(tree: &DepTree) -> String {
    tree.root.as_ref().map(shape).unwrap_or_default()
}

#[tokio::test]
async fn test_scope_dependency_is_absent() {
    let resolver = MemoryResolver::default()
        .with(
            c("a", "1.0"),
            vec![
                dep("b", "1.0"),
                dep("c", "1.0").with_scope(DependencyScope::Test),
            ],
        )
        .with(c("b", "1.0"), vec![])
        .with(c("c", "1.0"), vec![]);

    let tree = build(&resolver, c("a", "1.0")).await;
    assert_eq!(tree_shape(&tree), "a@1.0[b@1.0]");
    assert!(!resolver.requests().contains(&c("c", "1.0")));
}

#[tokio::test]
async fn only_compile_and_runtime_edges_are_followed() {
    let resolver = MemoryResolver::default()
        .with(
            c("app", "1"),
            vec![
                dep("compile", "1"),
                dep("runtime", "1").with_scope(DependencyScope::Runtime),
                dep("provided", "1").with_scope(DependencyScope::Provided),
                dep("system", "1").with_scope(DependencyScope::System),
                dep("import", "1").with_scope(DependencyScope::Import),
                dep("other", "1").with_scope(DependencyScope::Other("ksp".into())),
                dep("optional", "1").optional(true),
            ],
        )
        .with(c("compile", "1"), vec![])
        .with(c("runtime", "1"), vec![])
        .with(c("provided", "1"), vec![])
        .with(c("system", "1"), vec![])
        .with(c("import", "1"), vec![])
        .with(c("other", "1"), vec![])
        .with(c("optional", "1"), vec![]);

    let tree = build(&resolver, c("app", "1")).await;
    assert_eq!(tree_shape(&tree), "app@1[compile@1,runtime@1]");
}

#[tokio::test]
async fn exclusion_suppresses_package_below_edge() {
    let resolver = MemoryResolver::default()
        .with(
            c("a", "1.0"),
            vec![dep("b", "1.0").excluding(Exclusion::new("g", "d"))],
        )
        .with(c("b", "1.0"), vec![dep("d", "1.0")])
        .with(c("d", "1.0"), vec![]);

    let tree = build(&resolver, c("a", "1.0")).await;
    assert_eq!(tree_shape(&tree), "a@1.0[b@1.0]");
    assert!(!tree.ledger.contains(&PackageKey::new("g", "d")));
}

#[tokio::test]
async fn exclusion_does_not_leak_to_siblings() {
    let resolver = MemoryResolver::default()
        .with(
            c("root", "1"),
            vec![
                dep("a", "1").excluding(Exclusion::new("g", "x")),
                dep("b", "1"),
            ],
        )
        .with(c("a", "1"), vec![dep("x", "1")])
        .with(c("b", "1"), vec![dep("x", "1")])
        .with(c("x", "1"), vec![]);

    let tree = build(&resolver, c("root", "1")).await;
    assert_eq!(tree_shape(&tree), "root@1[a@1,b@1[x@1]]");
}

#[tokio::test]
async fn exclusion_applies_at_any_depth_below_edge() {
    let resolver = MemoryResolver::default()
        .with(
            c("root", "1"),
            vec![dep("a", "1").excluding(Exclusion::new("g", "x"))],
        )
        .with(c("a", "1"), vec![dep("mid", "1")])
        .with(c("mid", "1"), vec![dep("x", "1"), dep("y", "1")])
        .with(c("x", "1"), vec![])
        .with(c("y", "1"), vec![]);

    let tree = build(&resolver, c("root", "1")).await;
    assert_eq!(tree_shape(&tree), "root@1[a@1[mid@1[y@1]]]");
}

#[tokio::test]
async fn group_wildcard_exclusion() {
    let resolver = MemoryResolver::default()
        .with(
            c("root", "1"),
            vec![dep("a", "1").excluding(Exclusion::group("asm"))],
        )
        .with(
            c("a", "1"),
            vec![
                DeclaredDependency::new(Coordinate::new("asm", "asm", "9")),
                DeclaredDependency::new(Coordinate::new("asm", "asm-tree", "9")),
                dep("kept", "1"),
            ],
        )
        .with(c("kept", "1"), vec![]);

    let tree = build(&resolver, c("root", "1")).await;
    assert_eq!(tree_shape(&tree), "root@1[a@1[kept@1]]");
}

#[tokio::test]
async fn exclude_all_wildcard_cuts_every_transitive() {
    let resolver = MemoryResolver::default()
        .with(
            c("root", "1"),
            vec![
                dep("a", "1").excluding(Exclusion::new("*", "*")),
                dep("b", "1"),
            ],
        )
        .with(
            c("a", "1"),
            vec![
                dep("x", "1"),
                DeclaredDependency::new(Coordinate::new("org.slf4j", "slf4j-api", "2.0")),
            ],
        )
        .with(c("x", "1"), vec![])
        .with(c("b", "1"), vec![dep("y", "1")])
        .with(c("y", "1"), vec![]);

    let tree = build(&resolver, c("root", "1")).await;
    assert_eq!(tree_shape(&tree), "root@1[a@1,b@1[y@1]]");
    assert!(!resolver.requests().contains(&c("x", "1")));
}

#[tokio::test]
async fn first_declared_wins_in_preorder() {
    // root -> b -> e:2.0 is reached before root -> e:1.0.
    let resolver = MemoryResolver::default()
        .with(c("root", "1.0"), vec![dep("b", "1.0"), dep("e", "1.0")])
        .with(c("b", "1.0"), vec![dep("e", "2.0")])
        .with(c("e", "1.0"), vec![])
        .with(c("e", "2.0"), vec![]);

    let mut tree = build(&resolver, c("root", "1.0")).await;
    assert_eq!(tree.ledger.get(&PackageKey::new("g", "e")), Some("2.0"));
    assert_eq!(tree_shape(&tree), "root@1.0[b@1.0[e@2.0]]");
    assert!(!resolver.requests().contains(&c("e", "1.0")));

    assert_eq!(tree.conflicts.len(), 1);
    let conflict = tree.conflicts.iter().next().unwrap();
    assert_eq!(conflict.artifact, "e");
    assert_eq!(conflict.requested, "1.0");
    assert_eq!(conflict.resolved, "2.0");
    assert_eq!(conflict.requested_by, "g:root:1.0");

    assert_eq!(tree.reconcile(), 0);
}

#[tokio::test]
async fn same_version_reference_is_not_a_conflict() {
    let resolver = MemoryResolver::default()
        .with(c("root", "1"), vec![dep("a", "1"), dep("b", "1")])
        .with(c("a", "1"), vec![dep("shared", "1")])
        .with(c("b", "1"), vec![dep("shared", "1")])
        .with(c("shared", "1"), vec![]);

    let tree = build(&resolver, c("root", "1")).await;
    assert_eq!(tree_shape(&tree), "root@1[a@1[shared@1],b@1]");
    assert!(tree.conflicts.is_empty());
    assert_eq!(
        resolver
            .requests()
            .iter()
            .filter(|r| **r == c("shared", "1"))
            .count(),
        1
    );
}

#[tokio::test]
async fn direct_cycle_terminates() {
    let resolver = MemoryResolver::default()
        .with(c("a", "1"), vec![dep("b", "1")])
        .with(c("b", "1"), vec![dep("a", "1")]);

    let tree = build(&resolver, c("a", "1")).await;
    assert_eq!(tree_shape(&tree), "a@1[b@1]");
}

#[tokio::test]
async fn cycle_through_other_version_terminates() {
    let resolver = MemoryResolver::default()
        .with(c("a", "1"), vec![dep("b", "1")])
        .with(c("b", "1"), vec![dep("c", "1")])
        .with(c("c", "1"), vec![dep("a", "2"), dep("b", "1")])
        .with(c("a", "2"), vec![dep("b", "1")]);

    let tree = build(&resolver, c("a", "1")).await;
    assert_eq!(tree_shape(&tree), "a@1[b@1[c@1]]");
    assert!(!resolver.requests().contains(&c("a", "2")));
}

#[tokio::test]
async fn self_reference_terminates() {
    let resolver = MemoryResolver::default().with(c("a", "1"), vec![dep("a", "1")]);
    let tree = build(&resolver, c("a", "1")).await;
    assert_eq!(tree_shape(&tree), "a@1");
}

#[tokio::test]
async fn incomplete_coordinate_is_skipped_with_warning() {
    let resolver = MemoryResolver::default()
        .with(
            c("root", "1"),
            vec![dep("before", "1"), dep("versionless", ""), dep("after", "1")],
        )
        .with(c("before", "1"), vec![])
        .with(c("after", "1"), vec![]);

    let tree = build(&resolver, c("root", "1")).await;
    assert_eq!(tree_shape(&tree), "root@1[before@1,after@1]");
    assert_eq!(
        tree.warnings,
        vec![TraversalWarning::IncompleteCoordinate {
            coordinate: c("versionless", ""),
            referenced_by: c("root", "1"),
        }]
    );
}

#[tokio::test]
async fn resolution_failure_prunes_only_that_branch() {
    let resolver = MemoryResolver::default()
        .with(
            c("root", "1"),
            vec![dep("missing", "1"), dep("present", "1")],
        )
        .with(c("present", "1"), vec![dep("leaf", "1")])
        .with(c("leaf", "1"), vec![]);

    let tree = build(&resolver, c("root", "1")).await;
    assert_eq!(tree_shape(&tree), "root@1[present@1[leaf@1]]");
    assert!(!tree.cancelled);
    match tree.warnings.as_slice() {
        [TraversalWarning::ResolutionFailed {
            coordinate,
            referenced_by,
            reason,
        }] => {
            assert_eq!(coordinate, &c("missing", "1"));
            assert_eq!(referenced_by.as_ref(), Some(&c("root", "1")));
            assert!(reason.contains("no manifest"));
        }
        other => panic!("unexpected warnings: {other:?}"),
    }
}

#[tokio::test]
async fn unresolvable_root_yields_no_tree() {
    let resolver = MemoryResolver::default();
    let tree = build(&resolver, c("root", "1")).await;
    assert!(tree.root.is_none());
    assert_eq!(tree.warnings.len(), 1);
    assert!(tree.ledger.is_empty());
}

#[tokio::test]
async fn cancellation_returns_partial_tree() {
    let cancel = CancellationToken::new();
    let resolver = MemoryResolver::default()
        .with(c("root", "1"), vec![dep("a", "1"), dep("b", "1")])
        .with(c("a", "1"), vec![dep("done", "1"), dep("slow", "1"), dep("never", "1")])
        .with(c("done", "1"), vec![])
        .with(c("never", "1"), vec![])
        .with(c("b", "1"), vec![])
        .cancelling_at(c("slow", "1"), &cancel);

    let tree = build_dep_tree(&cancel, &resolver, &c("root", "1"))
        .await
        .expect("no traversal fault");
    assert!(tree.cancelled);
    assert_eq!(tree_shape(&tree), "root@1[a@1[done@1]]");
    assert!(tree.warnings.is_empty());
    let requests = resolver.requests();
    assert!(!requests.contains(&c("never", "1")));
    assert!(!requests.contains(&c("b", "1")));
}

#[tokio::test]
async fn cancelled_before_start() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let resolver = MemoryResolver::default().with(c("root", "1"), vec![]);

    let tree = build_dep_tree(&cancel, &resolver, &c("root", "1"))
        .await
        .expect("no traversal fault");
    assert!(tree.cancelled);
    assert!(tree.root.is_none());
    assert!(resolver.requests().is_empty());
}

#[tokio::test]
async fn reconciliation_aligns_every_node_with_ledger() {
    let resolver = MemoryResolver::default()
        .with(c("root", "1"), vec![dep("b", "1"), dep("e", "1")])
        .with(c("b", "1"), vec![dep("e", "2")])
        .with(c("e", "2"), vec![])
        .with(c("e", "1"), vec![]);

    let mut tree = build(&resolver, c("root", "1")).await;
    tree.reconcile();

    let root = tree.root.as_ref().unwrap();
    root.walk(&mut |node, _| {
        assert_eq!(tree.ledger.get(&node.key()), Some(node.version.as_str()));
    });
}

#[tokio::test]
async fn relocated_manifest_version_is_reconciled() {
    // The manifest for lib:1.0 declares itself as lib:1.1.
    let resolver = MemoryResolver::default()
        .with(c("root", "1"), vec![dep("lib", "1.0")])
        .serving(c("lib", "1.0"), ResolvedManifest::new(c("lib", "1.1"), vec![]));

    let mut tree = build(&resolver, c("root", "1")).await;
    assert_eq!(tree.ledger.get(&PackageKey::new("g", "lib")), Some("1.1"));
    assert_eq!(tree_shape(&tree), "root@1[lib@1.1]");
    assert_eq!(tree.reconcile(), 0);
}

#[tokio::test]
async fn aliased_manifest_does_not_fault() {
    // alias:1 resolves to a manifest for real:1, which is already on the path.
    let resolver = MemoryResolver::default()
        .with(c("real", "1"), vec![dep("alias", "1")])
        .serving(
            c("alias", "1"),
            ResolvedManifest::new(c("real", "1"), vec![dep("alias", "1")]),
        );

    let tree = build(&resolver, c("real", "1")).await;
    assert_eq!(tree_shape(&tree), "real@1");
    assert_eq!(tree.ledger.get(&PackageKey::new("g", "alias")), Some("1"));
}

#[tokio::test]
async fn incomplete_manifest_coordinate_falls_back_to_request() {
    let resolver = MemoryResolver::default().serving(
        c("lib", "1"),
        ResolvedManifest::new(Coordinate::new("g", "lib", ""), vec![]),
    );

    let tree = build(&resolver, c("lib", "1")).await;
    assert_eq!(tree_shape(&tree), "lib@1");
}

#[tokio::test]
async fn children_keep_declaration_order() {
    let resolver = MemoryResolver::default()
        .with(c("root", "1"), vec![dep("z", "1"), dep("a", "1"), dep("m", "1")])
        .with(c("z", "1"), vec![])
        .with(c("a", "1"), vec![])
        .with(c("m", "1"), vec![]);

    let tree = build(&resolver, c("root", "1")).await;
    assert_eq!(tree_shape(&tree), "root@1[z@1,a@1,m@1]");
}

#[tokio::test]
async fn deep_chain_does_not_overflow() {
    let depth = 1_000;
    let mut resolver = MemoryResolver::default();
    for i in 0..depth {
        let next = if i + 1 < depth {
            vec![dep(&format!("n{}", i + 1), "1")]
        } else {
            vec![]
        };
        resolver = resolver.with(c(&format!("n{i}"), "1"), next);
    }

    let tree = build(&resolver, c("n0", "1")).await;
    assert_eq!(tree.ledger.len(), depth);
    assert!(tree.warnings.is_empty());
}

#[test]
fn warnings_serialize_with_kind_tag() {
    let warning = TraversalWarning::IncompleteCoordinate {
        coordinate: c("lib", ""),
        referenced_by: c("root", "1"),
    };
    let json = serde_json::to_value(&warning).unwrap();
    assert_eq!(json["kind"], "incomplete_coordinate");
    assert_eq!(json["referenced_by"]["artifact_id"], "root");
    assert_eq!(
        warning.to_string(),
        "skipped incomplete coordinate g:lib: declared in g:root:1"
    );
}
