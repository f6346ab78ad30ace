//! Text rendering of a resolved dependency tree.

use depscan_core::dependency::Dependency;

/// Render `root` and its descendants as an indented tree.
///
/// Children deeper than `max_depth` (root = 0) are omitted.
pub fn render_tree(root: &Dependency, max_depth: Option<usize>) -> String {
    let mut output = format!("{root}\n");
    let count = root.children.len();
    for (i, child) in root.children.iter().enumerate() {
        render_subtree(&mut output, child, "", i == count - 1, 1, max_depth);
    }
    output
}

fn render_subtree(
    output: &mut String,
    node: &Dependency,
    prefix: &str,
    is_last: bool,
    depth: usize,
    max_depth: Option<usize>,
) {
    if max_depth.is_some_and(|max| depth > max) {
        return;
    }
    let connector = if is_last { "└── " } else { "├── " };
    output.push_str(&format!("{prefix}{connector}{node}\n"));

    let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        render_subtree(
            output,
            child,
            &child_prefix,
            i == count - 1,
            depth + 1,
            max_depth,
        );
    }
}
