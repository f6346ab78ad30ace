//! Post-build version alignment.

use depscan_core::dependency::Dependency;

use crate::state::VersionLedger;

/// Set every node's version to the one recorded in `ledger` for its
/// `group:artifact`. Nodes without a ledger entry are left alone.
///
/// The tree's shape is never changed. Returns the number of nodes rewritten.
pub fn reconcile(root: &mut Dependency, ledger: &VersionLedger) -> usize {
    let mut rewritten = 0;
    root.walk_mut(&mut |node| {
        if let Some(version) = ledger.get(&node.key()) {
            if node.version != version {
                node.version = version.to_string();
                rewritten += 1;
            }
        }
    });
    rewritten
}
