//! Restitch: the patching core of a source-to-source rewriter.
//!
//! Converts programs from one surface syntax into a more
//! statement-oriented target syntax while preserving the original's
//! formatting, comments, and incidental punctuation wherever the
//! semantics allow. Parsing is someone else's job: the crate consumes an
//! already-built token stream and syntax tree and concentrates on precise,
//! compositional text mutation driven by tree structure.
//!
//! # Architecture
//!
//! Every tree node gets a rewriting state that knows exactly which byte
//! range of the original source it owns, how that range widens to absorb
//! flanking parentheses, and how to issue edits against the shared
//! [`TextBuffer`] without corrupting edits made by sibling or ancestor
//! nodes. Intelligence lives in the per-kind rewrite rules registered in a
//! [`KindRegistry`]; the core supplies the substrate:
//!
//! - range resolution with punctuation-aware widening ([`ContentBounds`])
//! - the expression/statement form negotiation protocol and upward
//!   returns propagation ([`Rewriter`])
//! - token-level queries about a node's lexical surroundings ([`NodeView`])
//! - the traced mutation façade over the buffer ([`PatcherRef`])
//!
//! # Example
//!
//! ```
//! use restitch::{
//!     kinds, ParseContext, PatchOptions, Rewriter, Span, Token, TokenKind, TokenStream,
//!     TreeBuilder,
//! };
//!
//! // `not ok` — token stream and tree normally come from a front end.
//! let tokens = TokenStream::from_tokens(vec![
//!     Token::new(TokenKind::Keyword, 0, 3),
//!     Token::new(TokenKind::Identifier, 4, 6),
//! ])?;
//! let context = ParseContext::new("not ok", tokens);
//! let mut builder = TreeBuilder::new();
//! let operand = builder.leaf(kinds::IDENTIFIER, Span::new(4, 6));
//! let root = builder.node(kinds::NOT, Span::new(0, 6), vec![operand]);
//! let tree = builder.build(root)?;
//!
//! let mut rewriter = Rewriter::new(context, tree, kinds::reference_registry())?;
//! rewriter.patch(root, &PatchOptions::default())?;
//! assert_eq!(rewriter.finish().code, "!ok");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod buffer;
pub mod context;
pub mod kind;
pub mod kinds;
pub mod lex;
pub mod patch;
pub mod span;
pub mod tree;

// Re-exports
pub use buffer::{BufferError, TextBuffer};
pub use context::ParseContext;
pub use kind::{KindRegistry, NodeRewrite, PatchOptions};
pub use lex::{LexError, Token, TokenKind, TokenStream};
pub use patch::{
    BoundsError, ContentBounds, Diagnostic, EditLog, EditOp, EditTrace, Form, FormState,
    HelperPool, NodeView, PatchError, PatcherRef, RewriteOutput, Rewriter, TracedText,
};
pub use span::Span;
pub use tree::{Node, NodeId, NodeKind, SyntaxTree, TreeBuilder, TreeError};
