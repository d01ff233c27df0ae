//! The rewriting core: one patch state per tree node, a coordinator that
//! drives form negotiation and dispatch, and the façade through which
//! concrete kinds edit the shared buffer.
//!
//! # Lifecycle
//!
//! A [`Rewriter`] is built once the tree and token stream exist; it
//! eagerly resolves every node's [`ContentBounds`] and wires parent
//! back-references. [`Rewriter::initialize`] runs each kind's cross-node
//! setup hook exactly once after the whole structure exists, then
//! [`Rewriter::patch_root`] walks the tree. The walk is strictly
//! sequential and synchronous; each node performs its edits during its own
//! turn, so ordering of edits against the shared buffer is deterministic.
//!
//! # Dispatch
//!
//! `patch` resolves a node's negotiated form and dispatches to exactly one
//! of three behaviors, in precedence order: forced expression (expression
//! form negotiated against the kind's preference), plain expression, or
//! statement.

mod errors;
mod form;
mod mutate;
mod queries;
mod ranges;

pub use errors::{Diagnostic, PatchError};
pub use form::{Form, FormState};
pub use mutate::{EditLog, EditOp, EditTrace, TracedText};
pub use ranges::{BoundsError, ContentBounds};

use crate::buffer::TextBuffer;
use crate::context::ParseContext;
use crate::kind::{KindRegistry, NodeRewrite, PatchOptions};
use crate::lex::Token;
use crate::span::Span;
use crate::tree::{NodeId, NodeKind, SyntaxTree};
use std::collections::HashMap;

/// Per-node rewriting state: resolved bounds, negotiated form, and the
/// non-owning parent back-reference used for upward propagation.
#[derive(Debug)]
struct PatchState {
    bounds: ContentBounds,
    form: FormState,
    parent: Option<NodeId>,
}

/// Shared runtime helpers registered during patching, deduplicated by
/// name. First registration wins; emission happens at [`Rewriter::finish`].
#[derive(Debug, Default)]
pub struct HelperPool {
    names: Vec<String>,
    code: HashMap<String, String>,
}

impl HelperPool {
    /// Register a helper. Returns whether the name was new; a
    /// re-registration with different code is ignored.
    pub fn register(&mut self, name: &str, code: &str) -> bool {
        if let Some(existing) = self.code.get(name) {
            if existing != code {
                tracing::debug!(helper = name, "ignoring helper re-registration with different code");
            }
            return false;
        }
        self.names.push(name.to_string());
        self.code.insert(name.to_string(), code.to_string());
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.code.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All helper bodies in registration order, blank-line separated.
    pub fn render(&self) -> String {
        self.names
            .iter()
            .map(|name| self.code[name].as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// The rendered result of a completed rewrite.
#[derive(Debug)]
pub struct RewriteOutput {
    pub code: String,
    pub log: EditLog,
}

/// Coordinator for a whole-tree rewrite.
pub struct Rewriter {
    context: ParseContext,
    tree: SyntaxTree,
    buffer: TextBuffer,
    registry: KindRegistry,
    states: Vec<PatchState>,
    log: EditLog,
    helpers: HelperPool,
    /// Nearest helper-accepting ancestor, resolved once on first use.
    helper_sink: Option<NodeId>,
    indent_unit: String,
    initialized: bool,
}

impl Rewriter {
    /// Build the rewriter, eagerly resolving every node's bounds.
    pub fn new(
        context: ParseContext,
        tree: SyntaxTree,
        registry: KindRegistry,
    ) -> Result<Self, PatchError> {
        let mut states = Vec::with_capacity(tree.len());
        for id in tree.ids() {
            let node = tree.node(id);
            states.push(PatchState {
                bounds: ContentBounds::resolve(node.span(), context.tokens())?,
                form: FormState::default(),
                parent: node.parent(),
            });
        }
        let buffer = TextBuffer::new(context.source_arc());
        let indent_unit = mutate::detect_indent_unit(context.source());
        Ok(Self {
            context,
            tree,
            buffer,
            registry,
            states,
            log: EditLog::default(),
            helpers: HelperPool::default(),
            helper_sink: None,
            indent_unit,
            initialized: false,
        })
    }

    pub fn context(&self) -> &ParseContext {
        &self.context
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn log(&self) -> &EditLog {
        &self.log
    }

    pub fn helpers(&self) -> &HelperPool {
        &self.helpers
    }

    pub fn bounds(&self, id: NodeId) -> &ContentBounds {
        &self.states[id.index()].bounds
    }

    fn kind_of(&self, id: NodeId) -> NodeKind {
        self.tree.node(id).kind()
    }

    /// Run each kind's cross-node setup hook, once. Invoked lazily by
    /// `patch` when the driver has not called it explicitly.
    pub fn initialize(&mut self) -> Result<(), PatchError> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;
        let ids: Vec<NodeId> = self.tree.ids().collect();
        for id in ids {
            if let Some(rewrite) = self.registry.get(self.kind_of(id)) {
                let mut patcher = PatcherRef { rw: self, id };
                rewrite.initialize(&mut patcher)?;
            }
        }
        Ok(())
    }

    /// Patch the root node in statement form.
    pub fn patch_root(&mut self, options: &PatchOptions) -> Result<(), PatchError> {
        let root = self.tree.root();
        self.patch(root, options)
    }

    /// Dispatch a node to exactly one of its patching behaviors.
    pub fn patch(&mut self, id: NodeId, options: &PatchOptions) -> Result<(), PatchError> {
        self.initialize()?;
        let kind = self.kind_of(id);
        let rewrite =
            self.registry
                .get(kind)
                .ok_or_else(|| PatchError::UnimplementedKind {
                    kind,
                    span: self.bounds(id).content_span(),
                })?;
        let as_expression = self.states[id.index()].form.is_expression();
        let forced =
            as_expression && !rewrite.prefers_to_patch_as_expression(&NodeView { rw: self, id });
        let mut patcher = PatcherRef { rw: self, id };
        if forced {
            rewrite.patch_as_forced_expression(&mut patcher, options)
        } else if as_expression {
            rewrite.patch_as_expression(&mut patcher, options)
        } else {
            rewrite.patch_as_statement(&mut patcher, options)
        }
    }

    /// Demand expression form unconditionally. Errors when the kind cannot
    /// be an expression at all, leaving the node's form untouched.
    pub fn set_requires_expression(&mut self, id: NodeId) -> Result<(), PatchError> {
        let kind = self.kind_of(id);
        let can = match self.registry.get(kind) {
            Some(rewrite) => rewrite.can_patch_as_expression(&NodeView { rw: self, id }),
            None => false,
        };
        if !can {
            return Err(PatchError::UnrepresentableAsExpression {
                kind,
                span: self.bounds(id).content_span(),
            });
        }
        self.states[id.index()].form.resolve_expression();
        Ok(())
    }

    /// Negotiate expression form. With `force` this behaves like
    /// [`Rewriter::set_requires_expression`]; without it, the flag is set
    /// only when the kind prefers expression form, and the call never
    /// errors — it reports whether negotiation succeeded.
    pub fn set_expression(&mut self, id: NodeId, force: bool) -> Result<bool, PatchError> {
        if force {
            self.set_requires_expression(id)?;
            return Ok(true);
        }
        let prefers = match self.registry.get(self.kind_of(id)) {
            Some(rewrite) => rewrite.prefers_to_patch_as_expression(&NodeView { rw: self, id }),
            None => false,
        };
        if prefers {
            self.states[id.index()].form.resolve_expression();
        }
        Ok(prefers)
    }

    pub fn will_patch_as_expression(&self, id: NodeId) -> bool {
        self.states[id.index()].form.is_expression()
    }

    /// Mark the node and every strict ancestor as containing an explicit
    /// return. The closure is established here, at set time.
    pub fn set_explicitly_returns(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            let state = &mut self.states[node.index()];
            state.form.mark_explicitly_returns();
            current = state.parent;
        }
    }

    /// Mark only this node as the implicit tail value of an enclosing
    /// function body. A purely local fact; nothing propagates.
    pub fn set_implicitly_returns(&mut self, id: NodeId) {
        self.states[id.index()].form.mark_implicitly_returns();
    }

    pub fn explicitly_returns(&self, id: NodeId) -> bool {
        self.states[id.index()].form.explicitly_returns()
    }

    pub fn implicitly_returns(&self, id: NodeId) -> bool {
        self.states[id.index()].form.implicitly_returns()
    }

    /// Whether a statement-form rendering of this node requires the
    /// target's statement terminator. Unregistered kinds default to yes.
    pub fn statement_needs_semicolon(&self, id: NodeId) -> bool {
        match self.registry.get(self.kind_of(id)) {
            Some(rewrite) => rewrite.statement_needs_semicolon(&NodeView { rw: self, id }),
            None => true,
        }
    }

    /// Register a shared runtime helper on behalf of `from`, delegating up
    /// the parent chain to the nearest ancestor that accepts helpers. The
    /// sink is resolved once and cached; the pool deduplicates by name.
    pub fn register_helper(
        &mut self,
        from: NodeId,
        name: &str,
        code: &str,
    ) -> Result<(), PatchError> {
        if self.helper_sink.is_none() {
            self.helper_sink = Some(self.resolve_helper_sink(from)?);
        }
        self.helpers.register(name, code);
        Ok(())
    }

    fn resolve_helper_sink(&self, from: NodeId) -> Result<NodeId, PatchError> {
        let mut current = Some(from);
        while let Some(id) = current {
            let accepts = match self.registry.get(self.kind_of(id)) {
                Some(rewrite) => rewrite.accepts_helpers(),
                None => false,
            };
            if accepts {
                return Ok(id);
            }
            current = self.states[id.index()].parent;
        }
        Err(PatchError::NoHelperSink {
            kind: self.kind_of(from),
            span: self.bounds(from).content_span(),
        })
    }

    /// Render the rewritten document, appending registered helpers after
    /// the program, and hand back the edit journal.
    pub fn finish(self) -> RewriteOutput {
        let mut code = self.buffer.render();
        if !self.helpers.is_empty() {
            if !code.ends_with('\n') {
                code.push('\n');
            }
            code.push('\n');
            code.push_str(&self.helpers.render());
            code.push('\n');
        }
        RewriteOutput {
            code,
            log: self.log,
        }
    }
}

/// A read-only view of one node's rewriting state, handed to the
/// overridable kind predicates and usable for lexical queries.
pub struct NodeView<'a> {
    pub(crate) rw: &'a Rewriter,
    pub(crate) id: NodeId,
}

impl<'a> NodeView<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.rw.kind_of(self.id)
    }

    pub fn bounds(&self) -> ContentBounds {
        *self.rw.bounds(self.id)
    }

    pub fn content_span(&self) -> Span {
        self.bounds().content_span()
    }

    pub fn widened_span(&self) -> Span {
        self.bounds().widened_span()
    }

    /// The node's original text, untouched by any edits.
    pub fn text(&self) -> &'a str {
        self.rw.context.text_of(self.content_span())
    }

    pub fn children(&self) -> &'a [NodeId] {
        self.rw.tree.node(self.id).children()
    }

    pub fn child(&self, index: usize) -> Result<NodeId, PatchError> {
        self.children()
            .get(index)
            .copied()
            .ok_or(PatchError::MissingChild {
                id: self.id,
                kind: self.kind(),
                index,
            })
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.rw.states[self.id.index()].parent
    }

    /// A view of another node in the same tree.
    pub fn at(&self, id: NodeId) -> NodeView<'a> {
        NodeView { rw: self.rw, id }
    }

    pub fn token(&self, index: usize) -> Option<Token> {
        self.rw.context.token_at(index).copied()
    }

    pub fn token_text(&self, index: usize) -> Option<&'a str> {
        let token = self.rw.context.token_at(index)?;
        Some(self.rw.context.token_text(token))
    }

    pub fn will_patch_as_expression(&self) -> bool {
        self.rw.will_patch_as_expression(self.id)
    }

    pub fn explicitly_returns(&self) -> bool {
        self.rw.explicitly_returns(self.id)
    }

    pub fn implicitly_returns(&self) -> bool {
        self.rw.implicitly_returns(self.id)
    }
}

/// The handle a concrete kind patches through: reads, negotiation with
/// children, and the mutation façade over the shared buffer.
pub struct PatcherRef<'a> {
    pub(crate) rw: &'a mut Rewriter,
    pub(crate) id: NodeId,
}

impl PatcherRef<'_> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.rw.kind_of(self.id)
    }

    pub fn view(&self) -> NodeView<'_> {
        NodeView {
            rw: self.rw,
            id: self.id,
        }
    }

    /// A read-only view of another node in the same tree.
    pub fn at(&self, id: NodeId) -> NodeView<'_> {
        NodeView { rw: self.rw, id }
    }

    pub fn bounds(&self) -> ContentBounds {
        *self.rw.bounds(self.id)
    }

    pub fn bounds_of(&self, id: NodeId) -> ContentBounds {
        *self.rw.bounds(id)
    }

    pub fn content_span(&self) -> Span {
        self.bounds().content_span()
    }

    pub fn start(&self) -> usize {
        self.bounds().start
    }

    pub fn end(&self) -> usize {
        self.bounds().end
    }

    pub fn before_offset(&self) -> usize {
        self.bounds().before_offset
    }

    pub fn after_offset(&self) -> usize {
        self.bounds().after_offset
    }

    pub fn child(&self, index: usize) -> Result<NodeId, PatchError> {
        self.view().child(index)
    }

    pub fn children(&self) -> Vec<NodeId> {
        self.view().children().to_vec()
    }

    pub fn patch(&mut self, id: NodeId, options: &PatchOptions) -> Result<(), PatchError> {
        self.rw.patch(id, options)
    }

    pub fn set_requires_expression(&mut self, id: NodeId) -> Result<(), PatchError> {
        self.rw.set_requires_expression(id)
    }

    pub fn set_expression(&mut self, id: NodeId, force: bool) -> Result<bool, PatchError> {
        self.rw.set_expression(id, force)
    }

    pub fn will_patch_as_expression(&self) -> bool {
        self.rw.will_patch_as_expression(self.id)
    }

    pub fn set_explicitly_returns(&mut self) {
        self.rw.set_explicitly_returns(self.id);
    }

    pub fn set_implicitly_returns(&mut self) {
        self.rw.set_implicitly_returns(self.id);
    }

    pub fn statement_needs_semicolon(&self, id: NodeId) -> bool {
        self.rw.statement_needs_semicolon(id)
    }

    pub fn register_helper(&mut self, name: &str, code: &str) -> Result<(), PatchError> {
        self.rw.register_helper(self.id, name, code)
    }

    /// A position-carrying failure bound to this node's exact range.
    /// Construction is pure; the caller raises it.
    pub fn error(&self, message: impl Into<String>) -> PatchError {
        PatchError::Node(Diagnostic::new(message, self.kind(), self.content_span()))
    }

    /// As [`PatcherRef::error`], with an explicit range.
    pub fn error_at(&self, message: impl Into<String>, start: usize, end: usize) -> PatchError {
        PatchError::Node(Diagnostic::new(message, self.kind(), Span::new(start, end)))
    }
}
