//! Byte-stable DOT rendering of a logic tree.
//!
//! # Responsibility
//! - Emit Graphviz text whose bytes depend only on tree content.
//!
//! # Invariants
//! - Nodes render in id order, edges in contract traversal order.
//! - `TOKEN` nodes (and their edges) are hidden unless requested.
//! - `SEQUENCE` edges render dotted and non-constraining.

use crate::model::node::{EdgeType, LogicTree, NodeType};
use std::fmt::Write as _;

/// Rendering options.
#[derive(Debug, Clone, Copy)]
pub struct DotOptions {
    /// Include `TOKEN` nodes and the edges that reach them.
    pub show_tokens: bool,
    /// Maximum label characters taken from node text.
    pub max_label_chars: usize,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self {
            show_tokens: false,
            max_label_chars: 40,
        }
    }
}

/// Renders with default options (tokens hidden).
pub fn to_dot(tree: &LogicTree) -> String {
    to_dot_with(tree, &DotOptions::default())
}

/// Renders the tree as deterministic DOT text.
pub fn to_dot_with(tree: &LogicTree, options: &DotOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph logic_tree {{");
    let _ = writeln!(out, "  rankdir=TB;");
    let _ = writeln!(out, "  node [shape=box, fontname=\"monospace\"];");

    for node in tree.nodes() {
        if node.node_type == NodeType::Token && !options.show_tokens {
            continue;
        }
        let label = node_label(tree, node.id, options);
        let _ = writeln!(out, "  n{} [label=\"{}\"];", node.id, label);
    }

    for parent_id in tree.preorder() {
        for edge in tree.sorted_children(parent_id) {
            let child = match tree.node(edge.child_id) {
                Some(child) => child,
                None => continue,
            };
            if child.node_type == NodeType::Token && !options.show_tokens {
                continue;
            }
            let attrs = if edge.edge_type == EdgeType::Sequence {
                " [style=dotted, constraint=false]"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "  n{} -> n{} [label=\"{}\"]{};",
                edge.parent_id,
                edge.child_id,
                edge.edge_type.as_str(),
                attrs
            );
        }
    }

    out.push_str("}\n");
    out
}

fn node_label(tree: &LogicTree, id: u32, options: &DotOptions) -> String {
    let node = match tree.node(id) {
        Some(node) => node,
        None => return String::new(),
    };
    let mut label = node.node_type.as_str().to_string();
    if let Some(text) = node.text.as_deref() {
        let snippet: String = text.chars().take(options.max_label_chars).collect();
        if !snippet.is_empty() {
            label.push_str(": ");
            label.push_str(&escape_label(&snippet));
        }
    }
    label
}

fn escape_label(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
