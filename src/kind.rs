//! Per-kind rewriting behavior and its registry.
//!
//! Each node kind supplies its patching behaviors by implementing
//! [`NodeRewrite`]; the rewriter dispatches through an explicit
//! [`KindRegistry`] mapping kind tags to implementations. The trait
//! defaults chain statement → expression → unimplemented-kind error, so a
//! kind that overrides neither patching operation fails loudly rather
//! than silently doing nothing.

use crate::patch::{NodeView, PatchError, PatcherRef};
use crate::tree::NodeKind;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Open, kind-defined options passed through [`crate::patch::Rewriter::patch`].
/// The core does not constrain its contents; kinds agree on keys among
/// themselves (flags altering how a kind renders itself in special
/// contexts, for example).
#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    entries: HashMap<String, Value>,
}

impl PatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Boolean convenience: true only for an explicit `true` entry.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The patching behaviors and predicates of one node kind.
///
/// `patch_as_expression` and `patch_as_statement` are the two fundamental
/// operations; the rewriter picks one per node according to the negotiated
/// form. `patch_as_forced_expression` runs instead when expression form was
/// demanded *against* the kind's preference — override it to synthesize an
/// expression-capable wrapper (an immediately-invoked function, say) around
/// otherwise statement-only content.
pub trait NodeRewrite {
    fn patch_as_expression(
        &self,
        p: &mut PatcherRef<'_>,
        _options: &PatchOptions,
    ) -> Result<(), PatchError> {
        Err(PatchError::UnimplementedKind {
            kind: p.kind(),
            span: p.content_span(),
        })
    }

    fn patch_as_statement(
        &self,
        p: &mut PatcherRef<'_>,
        options: &PatchOptions,
    ) -> Result<(), PatchError> {
        self.patch_as_expression(p, options)
    }

    fn patch_as_forced_expression(
        &self,
        p: &mut PatcherRef<'_>,
        options: &PatchOptions,
    ) -> Result<(), PatchError> {
        self.patch_as_expression(p, options)
    }

    /// Whether this kind can be rendered as an expression at all.
    fn can_patch_as_expression(&self, _node: &NodeView<'_>) -> bool {
        true
    }

    /// Whether this kind *prefers* expression form when the caller leaves
    /// the choice open. By default, a kind that can be an expression is
    /// assumed to prefer it.
    fn prefers_to_patch_as_expression(&self, node: &NodeView<'_>) -> bool {
        self.can_patch_as_expression(node)
    }

    /// Whether a statement-form rendering needs the target's statement
    /// terminator appended.
    fn statement_needs_semicolon(&self, _node: &NodeView<'_>) -> bool {
        true
    }

    /// Cross-node setup, invoked once after the whole rewriter exists.
    fn initialize(&self, _p: &mut PatcherRef<'_>) -> Result<(), PatchError> {
        Ok(())
    }

    /// Whether this kind terminates the helper-registration delegation
    /// chain. Conventionally only the tree root does.
    fn accepts_helpers(&self) -> bool {
        false
    }
}

/// Explicit mapping from kind tag to rewriting behavior.
#[derive(Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<NodeKind, Arc<dyn NodeRewrite>>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: NodeKind, rewrite: impl NodeRewrite + 'static) {
        self.kinds.insert(kind, Arc::new(rewrite));
    }

    /// Register a shared implementation (one instance serving several
    /// kinds, or one a caller keeps a handle to).
    pub fn register_shared(&mut self, kind: NodeKind, rewrite: Arc<dyn NodeRewrite>) {
        self.kinds.insert(kind, rewrite);
    }

    /// Builder-style registration.
    pub fn with(mut self, kind: NodeKind, rewrite: impl NodeRewrite + 'static) -> Self {
        self.register(kind, rewrite);
        self
    }

    pub fn get(&self, kind: NodeKind) -> Option<Arc<dyn NodeRewrite>> {
        self.kinds.get(&kind).cloned()
    }

    pub fn contains(&self, kind: NodeKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.kinds.keys().map(NodeKind::name).collect();
        names.sort_unstable();
        f.debug_struct("KindRegistry").field("kinds", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_bag_is_open() {
        let options = PatchOptions::new()
            .with("needs_parens", true)
            .with("label", "loop0")
            .with("depth", 3);

        assert!(options.flag("needs_parens"));
        assert!(!options.flag("label"));
        assert!(!options.flag("missing"));
        assert_eq!(options.get("depth"), Some(&Value::from(3)));
        assert!(!options.is_empty());
    }

    #[test]
    fn registry_lookup_and_debug() {
        struct Noop;
        impl NodeRewrite for Noop {}

        const A: NodeKind = NodeKind::new("alpha");
        const B: NodeKind = NodeKind::new("beta");

        let registry = KindRegistry::new().with(A, Noop);
        assert!(registry.contains(A));
        assert!(!registry.contains(B));
        assert!(registry.get(A).is_some());
        assert!(registry.get(B).is_none());
        assert_eq!(format!("{registry:?}"), r#"KindRegistry { kinds: ["alpha"] }"#);
    }
}
