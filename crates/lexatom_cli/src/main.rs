//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `lexatom_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use lexatom_core::{build_logic_tree, to_dot, tokenize_plain};

fn main() {
    println!("lexatom_core version={}", lexatom_core::core_version());

    let tokens =
        tokenize_plain("The operator must keep records. The permit ceases upon revocation.");
    let tree = build_logic_tree(&tokens, "smoke");
    println!(
        "smoke tree nodes={} edges={} clauses={}",
        tree.node_count(),
        tree.edge_count(),
        tree.clause_spans().len()
    );
    print!("{}", to_dot(&tree));
}
