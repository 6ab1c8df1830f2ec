//! Logic tree arena: typed nodes, typed edges, deterministic order.
//!
//! # Responsibility
//! - Define the node/edge vocabulary of the clause-structure tree.
//! - Keep sibling ordering and traversal deterministic for identical
//!   input, independent of insertion order.
//!
//! # Invariants
//! - Exactly one `ROOT` node per tree; `ROOT` carries no span.
//! - Every non-root node has exactly one parent.
//! - Sibling order is `(child span start, edge-type priority, child id)`
//!   everywhere; node list order is incidental.
//! - Tree depth is fixed (ROOT → CLAUSE → token-level nodes), so all
//!   traversals are iterative.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Arena index of a node within one tree. Assigned in build order,
/// therefore reproducible for identical input.
pub type NodeId = u32;

/// Half-open token-offset range `[start, end)`.
pub type TokenSpan = (usize, usize);

/// Node vocabulary of the clause-structure tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Root,
    Clause,
    Condition,
    Action,
    Modal,
    Exception,
    Reference,
    Token,
}

impl NodeType {
    /// Stable storage spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "ROOT",
            Self::Clause => "CLAUSE",
            Self::Condition => "CONDITION",
            Self::Action => "ACTION",
            Self::Modal => "MODAL",
            Self::Exception => "EXCEPTION",
            Self::Reference => "REFERENCE",
            Self::Token => "TOKEN",
        }
    }

    /// Parses the storage spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ROOT" => Some(Self::Root),
            "CLAUSE" => Some(Self::Clause),
            "CONDITION" => Some(Self::Condition),
            "ACTION" => Some(Self::Action),
            "MODAL" => Some(Self::Modal),
            "EXCEPTION" => Some(Self::Exception),
            "REFERENCE" => Some(Self::Reference),
            "TOKEN" => Some(Self::Token),
            _ => None,
        }
    }
}

/// Edge vocabulary of the clause-structure tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    Sequence,
    DependsOn,
    Qualifies,
    Excepts,
}

impl EdgeType {
    /// Stable storage spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequence => "SEQUENCE",
            Self::DependsOn => "DEPENDS_ON",
            Self::Qualifies => "QUALIFIES",
            Self::Excepts => "EXCEPTS",
        }
    }

    /// Parses the storage spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SEQUENCE" => Some(Self::Sequence),
            "DEPENDS_ON" => Some(Self::DependsOn),
            "QUALIFIES" => Some(Self::Qualifies),
            "EXCEPTS" => Some(Self::Excepts),
            _ => None,
        }
    }

    /// Sibling-order tiebreak when two children share a span start.
    pub fn priority(self) -> u8 {
        match self {
            Self::Sequence => 0,
            Self::DependsOn => 1,
            Self::Qualifies => 2,
            Self::Excepts => 3,
        }
    }

    /// Edge type implied by a child node's type.
    pub fn for_node_type(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Exception => Self::Excepts,
            NodeType::Condition => Self::DependsOn,
            NodeType::Modal => Self::Qualifies,
            _ => Self::Sequence,
        }
    }
}

/// One typed node in the arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicNode {
    pub id: NodeId,
    pub node_type: NodeType,
    /// Token-offset span; `None` only for `ROOT`.
    pub span: Option<TokenSpan>,
    /// Surface text; not part of the persisted projection.
    pub text: Option<String>,
    pub source_id: String,
}

/// One typed parent→child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicEdge {
    pub parent_id: NodeId,
    pub child_id: NodeId,
    pub edge_type: EdgeType,
}

/// Clause handle surfaced to the extractor and to collaborators.
///
/// `clause_id` is deterministic (`"<source_id>:c<index>"`) so external
/// reference mentions can name clauses without seeing node ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseSpan {
    pub clause_id: String,
    pub clause_index: usize,
    pub node_id: NodeId,
    pub span: TokenSpan,
}

/// Assembly failure for trees rebuilt from external rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeAssemblyError {
    /// No `ROOT` node present.
    MissingRoot,
    /// More than one `ROOT` node present.
    MultipleRoots(usize),
    /// A non-root node carries no span, or span start exceeds span end.
    MalformedSpan(NodeId),
    /// `ROOT` must not carry a span.
    RootWithSpan(NodeId),
    /// An edge references a node id outside the arena.
    DanglingEdge { parent_id: NodeId, child_id: NodeId },
    /// Node ids are not the dense arena range `0..n`.
    NonArenaIds,
}

impl std::fmt::Display for TreeAssemblyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRoot => write!(f, "tree has no ROOT node"),
            Self::MultipleRoots(count) => write!(f, "tree has {count} ROOT nodes"),
            Self::MalformedSpan(id) => write!(f, "node {id} has a malformed span"),
            Self::RootWithSpan(id) => write!(f, "ROOT node {id} must not carry a span"),
            Self::DanglingEdge {
                parent_id,
                child_id,
            } => write!(f, "edge {parent_id}->{child_id} references unknown node"),
            Self::NonArenaIds => write!(f, "node ids do not form a dense arena range"),
        }
    }
}

impl std::error::Error for TreeAssemblyError {}

/// Arena-backed clause-structure tree.
#[derive(Debug, Clone)]
pub struct LogicTree {
    source_id: String,
    root_id: NodeId,
    nodes: Vec<LogicNode>,
    edges: Vec<LogicEdge>,
    children: BTreeMap<NodeId, Vec<usize>>,
}

impl LogicTree {
    /// Creates a tree holding only the `ROOT` node.
    pub fn new(source_id: impl Into<String>) -> Self {
        let source_id = source_id.into();
        let root = LogicNode {
            id: 0,
            node_type: NodeType::Root,
            span: None,
            text: None,
            source_id: source_id.clone(),
        };
        Self {
            source_id,
            root_id: 0,
            nodes: vec![root],
            edges: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    /// Adds a child node under `parent_id` with the implied edge type.
    ///
    /// Span bounds are a caller contract: `start <= end` within the
    /// source token stream. Violations are rejected eagerly.
    pub fn add_child(
        &mut self,
        parent_id: NodeId,
        node_type: NodeType,
        span: TokenSpan,
        text: impl Into<String>,
    ) -> Result<NodeId, TreeAssemblyError> {
        let id = self.nodes.len() as NodeId;
        if span.0 > span.1 {
            return Err(TreeAssemblyError::MalformedSpan(id));
        }
        if self.node(parent_id).is_none() {
            return Err(TreeAssemblyError::DanglingEdge {
                parent_id,
                child_id: id,
            });
        }
        self.nodes.push(LogicNode {
            id,
            node_type,
            span: Some(span),
            text: Some(text.into()),
            source_id: self.source_id.clone(),
        });
        let edge_type = EdgeType::for_node_type(node_type);
        self.push_edge(LogicEdge {
            parent_id,
            child_id: id,
            edge_type,
        });
        Ok(id)
    }

    /// Rebuilds a tree from externally supplied rows.
    ///
    /// Edge order is preserved exactly as given; persistence passes
    /// edges in stored `ord` order so per-parent child order survives
    /// without a secondary sort.
    pub fn assemble(
        source_id: impl Into<String>,
        nodes: Vec<LogicNode>,
        edges: Vec<LogicEdge>,
    ) -> Result<Self, TreeAssemblyError> {
        let source_id = source_id.into();
        let mut root_ids = nodes
            .iter()
            .filter(|node| node.node_type == NodeType::Root);
        let root_id = match (root_ids.next(), root_ids.next()) {
            (None, _) => return Err(TreeAssemblyError::MissingRoot),
            (Some(root), None) => root.id,
            (Some(_), Some(_)) => {
                let count = nodes
                    .iter()
                    .filter(|node| node.node_type == NodeType::Root)
                    .count();
                return Err(TreeAssemblyError::MultipleRoots(count));
            }
        };

        for (index, node) in nodes.iter().enumerate() {
            if node.id as usize != index {
                return Err(TreeAssemblyError::NonArenaIds);
            }
            match (node.node_type, node.span) {
                (NodeType::Root, Some(_)) => {
                    return Err(TreeAssemblyError::RootWithSpan(node.id));
                }
                (NodeType::Root, None) => {}
                (_, None) => return Err(TreeAssemblyError::MalformedSpan(node.id)),
                (_, Some((start, end))) if start > end => {
                    return Err(TreeAssemblyError::MalformedSpan(node.id));
                }
                _ => {}
            }
        }

        let mut tree = Self {
            source_id,
            root_id,
            nodes,
            edges: Vec::new(),
            children: BTreeMap::new(),
        };
        for edge in edges {
            if tree.node(edge.parent_id).is_none() || tree.node(edge.child_id).is_none() {
                return Err(TreeAssemblyError::DanglingEdge {
                    parent_id: edge.parent_id,
                    child_id: edge.child_id,
                });
            }
            tree.push_edge(edge);
        }
        Ok(tree)
    }

    fn push_edge(&mut self, edge: LogicEdge) {
        let index = self.edges.len();
        self.edges.push(edge);
        self.children.entry(edge.parent_id).or_default().push(index);
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn nodes(&self) -> &[LogicNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[LogicEdge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&LogicNode> {
        self.nodes.get(id as usize).filter(|node| node.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Children of `parent_id` in contract order:
    /// `(child span start, edge-type priority, child id)`.
    pub fn sorted_children(&self, parent_id: NodeId) -> Vec<LogicEdge> {
        let mut result: Vec<LogicEdge> = self
            .children
            .get(&parent_id)
            .map(|indices| indices.iter().map(|&index| self.edges[index]).collect())
            .unwrap_or_default();
        result.sort_by_key(|edge| {
            let span_start = self
                .node(edge.child_id)
                .and_then(|node| node.span)
                .map_or(0, |span| span.0);
            (span_start, edge.edge_type.priority(), edge.child_id)
        });
        result
    }

    /// Preorder node ids, visiting children in contract order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root_id];
        while let Some(id) = stack.pop() {
            result.push(id);
            let children = self.sorted_children(id);
            for edge in children.iter().rev() {
                stack.push(edge.child_id);
            }
        }
        result
    }

    /// Postorder node ids, visiting children in contract order.
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root_id, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                result.push(id);
                continue;
            }
            stack.push((id, true));
            let children = self.sorted_children(id);
            for edge in children.iter().rev() {
                stack.push((edge.child_id, false));
            }
        }
        result
    }

    /// All root-to-leaf id paths, leaves ordered by contract order.
    pub fn root_to_leaf_paths(&self) -> Vec<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut stack = vec![vec![self.root_id]];
        while let Some(path) = stack.pop() {
            let last = *path.last().unwrap_or(&self.root_id);
            let children = self.sorted_children(last);
            if children.is_empty() {
                result.push(path);
                continue;
            }
            for edge in children.iter().rev() {
                let mut next = path.clone();
                next.push(edge.child_id);
                stack.push(next);
            }
        }
        result
    }

    /// Clause handles in document order.
    pub fn clause_spans(&self) -> Vec<ClauseSpan> {
        self.sorted_children(self.root_id)
            .into_iter()
            .filter_map(|edge| {
                let node = self.node(edge.child_id)?;
                if node.node_type != NodeType::Clause {
                    return None;
                }
                node.span.map(|span| (node.id, span))
            })
            .enumerate()
            .map(|(clause_index, (node_id, span))| ClauseSpan {
                clause_id: format!("{}:c{}", self.source_id, clause_index),
                clause_index,
                node_id,
                span,
            })
            .collect()
    }

    /// Versioned export payload `{version, root_id, nodes, edges}`.
    ///
    /// Nodes are listed in id order and edges in contract order, so the
    /// payload is byte-stable across rebuilds of identical input.
    pub fn to_payload(&self) -> serde_json::Value {
        let nodes: Vec<serde_json::Value> = self
            .nodes
            .iter()
            .map(|node| {
                serde_json::json!({
                    "id": node.id,
                    "node_type": node.node_type.as_str(),
                    "span": node.span.map(|(start, end)| vec![start, end]),
                    "text": &node.text,
                    "source_id": &node.source_id,
                })
            })
            .collect();
        let mut edges = Vec::with_capacity(self.edges.len());
        for id in self.preorder() {
            for edge in self.sorted_children(id) {
                edges.push(serde_json::json!({
                    "parent_id": edge.parent_id,
                    "child_id": edge.child_id,
                    "edge_type": edge.edge_type.as_str(),
                }));
            }
        }
        serde_json::json!({
            "version": 1,
            "root_id": self.root_id,
            "nodes": nodes,
            "edges": edges,
        })
    }
}

impl PartialEq for LogicTree {
    /// Structural equality: same nodes, same root, same parent/child
    /// relation. Edge insertion order is incidental and ignored.
    fn eq(&self, other: &Self) -> bool {
        if self.source_id != other.source_id
            || self.root_id != other.root_id
            || self.nodes != other.nodes
        {
            return false;
        }
        let mut left = self.edges.clone();
        let mut right = other.edges.clone();
        let key = |edge: &LogicEdge| (edge.parent_id, edge.child_id, edge.edge_type.priority());
        left.sort_by_key(key);
        right.sort_by_key(key);
        left == right
    }
}

impl Eq for LogicTree {}

#[cfg(test)]
mod tests {
    use super::{EdgeType, LogicTree, NodeType, TreeAssemblyError};

    #[test]
    fn empty_tree_has_only_root() {
        let tree = LogicTree::new("doc");
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.edge_count(), 0);
        assert_eq!(tree.node(tree.root_id()).unwrap().node_type, NodeType::Root);
        assert!(tree.node(tree.root_id()).unwrap().span.is_none());
    }

    #[test]
    fn add_child_rejects_inverted_span() {
        let mut tree = LogicTree::new("doc");
        let err = tree
            .add_child(0, NodeType::Clause, (4, 2), "bad")
            .unwrap_err();
        assert!(matches!(err, TreeAssemblyError::MalformedSpan(_)));
    }

    #[test]
    fn sibling_order_ignores_insertion_order() {
        let mut tree = LogicTree::new("doc");
        let clause = tree.add_child(0, NodeType::Clause, (0, 3), "c").unwrap();
        let late = tree.add_child(clause, NodeType::Token, (2, 3), "c").unwrap();
        let early = tree.add_child(clause, NodeType::Token, (0, 1), "a").unwrap();
        let middle = tree.add_child(clause, NodeType::Token, (1, 2), "b").unwrap();

        let order: Vec<_> = tree
            .sorted_children(clause)
            .iter()
            .map(|edge| edge.child_id)
            .collect();
        assert_eq!(order, vec![early, middle, late]);
    }

    #[test]
    fn equal_span_children_order_by_edge_priority() {
        let mut tree = LogicTree::new("doc");
        let clause = tree.add_child(0, NodeType::Clause, (0, 1), "c").unwrap();
        let excepts = tree
            .add_child(clause, NodeType::Exception, (0, 1), "unless")
            .unwrap();
        let sequence = tree
            .add_child(clause, NodeType::Token, (0, 1), "unless")
            .unwrap();

        let order: Vec<_> = tree
            .sorted_children(clause)
            .iter()
            .map(|edge| (edge.child_id, edge.edge_type))
            .collect();
        assert_eq!(
            order,
            vec![(sequence, EdgeType::Sequence), (excepts, EdgeType::Excepts)]
        );
    }

    #[test]
    fn traversals_cover_every_node_once() {
        let mut tree = LogicTree::new("doc");
        let clause = tree.add_child(0, NodeType::Clause, (0, 2), "c").unwrap();
        tree.add_child(clause, NodeType::Token, (0, 1), "a").unwrap();
        tree.add_child(clause, NodeType::Token, (1, 2), "b").unwrap();

        let preorder = tree.preorder();
        let postorder = tree.postorder();
        assert_eq!(preorder.len(), tree.node_count());
        assert_eq!(postorder.len(), tree.node_count());
        assert_eq!(preorder[0], tree.root_id());
        assert_eq!(*postorder.last().unwrap(), tree.root_id());
    }

    #[test]
    fn assemble_rejects_multiple_roots() {
        let tree = LogicTree::new("doc");
        let mut nodes = tree.nodes().to_vec();
        let mut second_root = nodes[0].clone();
        second_root.id = 1;
        nodes.push(second_root);
        let err = LogicTree::assemble("doc", nodes, Vec::new()).unwrap_err();
        assert!(matches!(err, TreeAssemblyError::MultipleRoots(2)));
    }

    #[test]
    fn clause_ids_are_deterministic() {
        let mut tree = LogicTree::new("doc-a");
        tree.add_child(0, NodeType::Clause, (0, 3), "one").unwrap();
        tree.add_child(0, NodeType::Clause, (3, 6), "two").unwrap();
        let spans = tree.clause_spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].clause_id, "doc-a:c0");
        assert_eq!(spans[1].clause_id, "doc-a:c1");
        assert_eq!(spans[1].clause_index, 1);
    }
}
