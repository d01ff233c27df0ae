//! The syntax tree consumed by the rewriter.
//!
//! The tree is produced by an external front end and is read-only to the
//! rewriting core. Nodes live in an arena and refer to each other by
//! [`NodeId`]; parent links are explicit non-owning back-references wired
//! once at build time.

use crate::span::Span;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Kind tag of a tree node. Front ends define their own vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeKind(&'static str);

impl NodeKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// An abstract-syntax-tree element: a kind, a byte range, and children.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    span: Span,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("node {child:?} is claimed by more than one parent")]
    ChildClaimedTwice { child: NodeId },

    #[error("child {child:?} ({child_span}) lies outside its parent {parent:?} ({parent_span})")]
    ChildOutsideParent {
        parent: NodeId,
        parent_span: Span,
        child: NodeId,
        child_span: Span,
    },

    #[error("root {root:?} is itself a child of {parent:?}")]
    RootHasParent { root: NodeId, parent: NodeId },
}

/// An immutable tree of [`Node`]s.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All ids in arena (construction) order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}

/// Bottom-up tree construction: create children first, then the nodes that
/// own them, then [`TreeBuilder::build`] with the root. `build` wires the
/// parent back-references and validates the claimed structure.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.node(kind, span, Vec::new())
    }

    pub fn node(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            children,
            parent: None,
        });
        id
    }

    pub fn build(mut self, root: NodeId) -> Result<SyntaxTree, TreeError> {
        for parent_index in 0..self.nodes.len() {
            let parent = NodeId(parent_index as u32);
            let parent_span = self.nodes[parent_index].span;
            let children = self.nodes[parent_index].children.clone();
            for child in children {
                let child_node = &mut self.nodes[child.index()];
                if let Some(previous) = child_node.parent {
                    if previous != parent {
                        return Err(TreeError::ChildClaimedTwice { child });
                    }
                }
                if !parent_span.contains_span(child_node.span) {
                    return Err(TreeError::ChildOutsideParent {
                        parent,
                        parent_span,
                        child,
                        child_span: child_node.span,
                    });
                }
                child_node.parent = Some(parent);
            }
        }
        if let Some(parent) = self.nodes[root.index()].parent {
            return Err(TreeError::RootHasParent { root, parent });
        }
        Ok(SyntaxTree {
            nodes: self.nodes,
            root,
        })
    }
}
