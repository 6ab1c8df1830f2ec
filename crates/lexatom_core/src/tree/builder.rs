//! Deterministic token-stream → logic-tree builder.
//!
//! # Responsibility
//! - Segment the token stream into clause spans.
//! - Classify every token into a typed node; no token is ever dropped.
//!
//! # Invariants
//! - Clause boundaries are `.`, `;`, or tokens ending in those
//!   characters; a trailing partial clause is still emitted.
//! - Classification priority is fixed: exception lexicon, condition
//!   lexicon, modal lexicon/auxiliary POS, verb POS/dependency root,
//!   entity tag, plain token.
//! - The lexicon tables are part of the determinism contract and must
//!   not be reordered or extended casually.

use crate::model::node::{LogicTree, NodeType};
use crate::model::token::Token;

/// Tokens that open an exception (classified `EXCEPTION`).
pub const EXCEPTION_TRIGGERS: &[&str] = &[
    "except",
    "unless",
    "notwithstanding",
    "excluding",
    "save",
    "exempt",
];

/// Tokens that open a condition (classified `CONDITION`).
pub const CONDITION_TRIGGERS: &[&str] = &[
    "if", "where", "when", "while", "provided", "subject", "upon",
];

/// Single-token modal cues (classified `MODAL`).
pub const MODAL_TRIGGERS: &[&str] = &["must", "shall", "may", "should", "cannot", "ought"];

/// Builds the clause tree for one document.
///
/// Empty input yields a tree with only the `ROOT` node and no edges.
pub fn build_logic_tree(tokens: &[Token], source_id: &str) -> LogicTree {
    let mut tree = LogicTree::new(source_id);
    let root_id = tree.root_id();

    for (start, end) in clause_bounds(tokens) {
        let clause_text = join_texts(&tokens[start..end]);
        // Spans come straight from enumeration, so add_child cannot fail
        // here; treat a failure as the programmer error it would be.
        let clause_id = tree
            .add_child(root_id, NodeType::Clause, (start, end), clause_text)
            .unwrap_or_else(|err| unreachable!("builder produced invalid clause span: {err}"));

        for (offset, token) in tokens[start..end].iter().enumerate() {
            let index = start + offset;
            let node_type = classify_token(token);
            tree.add_child(clause_id, node_type, (index, index + 1), token.text.clone())
                .unwrap_or_else(|err| unreachable!("builder produced invalid token span: {err}"));
        }
    }

    tree
}

/// Half-open clause spans over the token stream.
fn clause_bounds(tokens: &[Token]) -> Vec<(usize, usize)> {
    let mut bounds = Vec::new();
    let mut start = 0;
    for (index, token) in tokens.iter().enumerate() {
        if token.is_clause_boundary() {
            bounds.push((start, index + 1));
            start = index + 1;
        }
    }
    if start < tokens.len() {
        bounds.push((start, tokens.len()));
    }
    bounds
}

/// Fixed-priority token classification. Defaults to `TOKEN` so the
/// tree always covers the full stream.
fn classify_token(token: &Token) -> NodeType {
    let surface = token.normalized();
    let lemma = token.normalized_lemma();

    if lexicon_match(EXCEPTION_TRIGGERS, &surface, &lemma) {
        return NodeType::Exception;
    }
    if lexicon_match(CONDITION_TRIGGERS, &surface, &lemma) {
        return NodeType::Condition;
    }
    if lexicon_match(MODAL_TRIGGERS, &surface, &lemma) || token.pos_is("AUX") {
        return NodeType::Modal;
    }
    if token.pos_is("VERB") || token.dependency_is("ROOT") {
        return NodeType::Action;
    }
    if token.has_entity() {
        return NodeType::Reference;
    }
    NodeType::Token
}

fn lexicon_match(lexicon: &[&str], surface: &str, lemma: &str) -> bool {
    lexicon
        .iter()
        .any(|entry| *entry == surface || *entry == lemma)
}

fn join_texts(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| token.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{build_logic_tree, clause_bounds};
    use crate::model::node::NodeType;
    use crate::model::token::{tokenize_plain, Token};

    #[test]
    fn empty_input_yields_root_only() {
        let tree = build_logic_tree(&[], "doc");
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.edge_count(), 0);
    }

    #[test]
    fn trailing_partial_clause_is_emitted() {
        let tokens = tokenize_plain("The operator must keep records. No boundary here");
        let bounds = clause_bounds(&tokens);
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0], (0, 5));
        assert_eq!(bounds[1], (5, 8));
    }

    #[test]
    fn boundary_detection_covers_attached_punctuation() {
        let tokens = tokenize_plain("keep records; then stop.");
        let bounds = clause_bounds(&tokens);
        assert_eq!(bounds, vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn classification_prefers_exception_over_condition() {
        // "unless" sits in the exception lexicon even though it reads
        // like a condition.
        let tree = build_logic_tree(&tokenize_plain("unless revoked."), "doc");
        let clause = tree.clause_spans()[0].node_id;
        let first = tree.sorted_children(clause)[0].child_id;
        assert_eq!(tree.node(first).unwrap().node_type, NodeType::Exception);
    }

    #[test]
    fn aux_pos_classifies_as_modal_and_verb_as_action() {
        let mut tokens = tokenize_plain("operators will comply.");
        tokens[1].pos = Some("AUX".to_string());
        tokens[2].pos = Some("VERB".to_string());
        let tree = build_logic_tree(&tokens, "doc");
        let clause = tree.clause_spans()[0].node_id;
        let children = tree.sorted_children(clause);
        let types: Vec<_> = children
            .iter()
            .map(|edge| tree.node(edge.child_id).unwrap().node_type)
            .collect();
        assert_eq!(
            types,
            vec![NodeType::Token, NodeType::Modal, NodeType::Action]
        );
    }

    #[test]
    fn entity_tag_classifies_as_reference() {
        let mut tokens = tokenize_plain("see the Act.");
        tokens[2].entity_type = Some("LAW".to_string());
        let tree = build_logic_tree(&tokens, "doc");
        let clause = tree.clause_spans()[0].node_id;
        let third = tree.sorted_children(clause)[2].child_id;
        assert_eq!(tree.node(third).unwrap().node_type, NodeType::Reference);
    }

    #[test]
    fn lemma_matches_trigger_lexicons() {
        let mut token = Token::new("Provided,");
        token.lemma = Some("provide".to_string());
        // Surface normalizes to "provided" which is in the condition
        // lexicon; the lemma path must not shadow it with TOKEN.
        let tree = build_logic_tree(&[token], "doc");
        let clause = tree.clause_spans();
        assert_eq!(clause.len(), 1);
        let first = tree.sorted_children(clause[0].node_id)[0].child_id;
        assert_eq!(tree.node(first).unwrap().node_type, NodeType::Condition);
    }

    #[test]
    fn rebuilding_identical_input_is_structurally_equal() {
        let tokens = tokenize_plain("If the permit lapses, the operator must notify the agency.");
        let first = build_logic_tree(&tokens, "doc");
        let second = build_logic_tree(&tokens, "doc");
        assert_eq!(first, second);
    }
}
