use crate::buffer::BufferError;
use crate::patch::ranges::BoundsError;
use crate::span::Span;
use crate::tree::NodeKind;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A position-carrying failure bound to the node that raised it.
///
/// Construction is pure; callers wrap it in [`PatchError::Node`] and
/// propagate it. The range defaults to the node's exact range so drivers
/// can cite the offending snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub kind: NodeKind,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, kind: NodeKind, span: Span) -> Self {
        Self {
            message: message.into(),
            kind,
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} at {})", self.message, self.kind, self.span)
    }
}

/// Failures of the rewriting core. None of these are recovered locally:
/// every error is a hard stop of the current rewrite unit, and the buffer
/// keeps whatever was written before the failure.
#[derive(Error, Debug)]
pub enum PatchError {
    /// An ancestor required expression form from a node that cannot be an
    /// expression under any circumstance.
    #[error("{kind} at {span} cannot be patched as an expression")]
    UnrepresentableAsExpression { kind: NodeKind, span: Span },

    /// A node kind offers neither expression nor statement patching, or no
    /// implementation is registered for it at all. A defect in the kind
    /// catalog, not a recoverable input error.
    #[error("no expression or statement patching is implemented for {kind} at {span}")]
    UnimplementedKind { kind: NodeKind, span: Span },

    /// A helper registration walked the parent chain without finding an
    /// ancestor that accepts helpers.
    #[error("no ancestor of {kind} at {span} accepts helper registration")]
    NoHelperSink { kind: NodeKind, span: Span },

    #[error("node {id:?} ({kind}) has no child {index}")]
    MissingChild {
        id: crate::tree::NodeId,
        kind: NodeKind,
        index: usize,
    },

    /// A kind-specific failure constructed through the diagnostic API.
    #[error("{0}")]
    Node(Diagnostic),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Bounds(#[from] BoundsError),
}
