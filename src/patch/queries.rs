//! Read-only queries about a node's lexical surroundings.
//!
//! Everything here resolves through the token stream and the *original*
//! source; nothing consults or mutates the buffer. Boundary queries work
//! on the widened token indices, so a node that absorbed flanking
//! parentheses looks before/after the parens, not inside them.

use crate::lex::TokenKind;
use crate::patch::NodeView;
use crate::tree::NodeId;

impl NodeView<'_> {
    fn token_matches(&self, index: usize, kind: TokenKind, payload: Option<&str>) -> bool {
        let Some(token) = self.rw.context().token_at(index) else {
            return false;
        };
        if token.kind != kind {
            return false;
        }
        match payload {
            Some(expected) => self.rw.context().token_text(token) == expected,
            None => true,
        }
    }

    /// Whether the token at `index` exists and matches the kind, and the
    /// payload when one is given (absent payload = kind-only match).
    pub fn token_at_index_is(&self, index: usize, kind: TokenKind, payload: Option<&str>) -> bool {
        self.token_matches(index, kind, payload)
    }

    /// Whether a matching token sits immediately before the widened range.
    pub fn has_token_before(&self, kind: TokenKind, payload: Option<&str>) -> bool {
        match self.bounds().before_token.checked_sub(1) {
            Some(index) => self.token_matches(index, kind, payload),
            None => false,
        }
    }

    /// Whether a matching token sits immediately after the widened range.
    pub fn has_token_after(&self, kind: TokenKind, payload: Option<&str>) -> bool {
        self.token_matches(self.bounds().after_token + 1, kind, payload)
    }

    /// Whether a matching token immediately follows the token at `index`.
    pub fn has_token_after_index(
        &self,
        index: usize,
        kind: TokenKind,
        payload: Option<&str>,
    ) -> bool {
        self.token_matches(index + 1, kind, payload)
    }

    /// Index of the first matching token lexically between two sibling
    /// nodes, scanning the exact token slice in order.
    pub fn first_token_between(
        &self,
        left: NodeId,
        right: NodeId,
        kind: TokenKind,
        payload: Option<&str>,
    ) -> Option<usize> {
        let left_span = self.rw.bounds(left).content_span();
        let right_span = self.rw.bounds(right).content_span();
        self.rw
            .context()
            .tokens()
            .indices_between(left_span, right_span)
            .find(|&index| self.token_matches(index, kind, payload))
    }

    /// Whether the widened range is bracketed by a parenthesis pair at its
    /// boundary tokens.
    pub fn surrounded_by_parens(&self) -> bool {
        let bounds = self.bounds();
        self.token_matches(bounds.before_token, TokenKind::LParen, None)
            && self.token_matches(bounds.after_token, TokenKind::RParen, None)
    }

    /// Whether the node's original (unedited) text starts with `prefix`.
    pub fn text_starts_with(&self, prefix: &str) -> bool {
        self.text().starts_with(prefix)
    }

    /// Whether the node's original (unedited) text ends with `suffix`.
    pub fn text_ends_with(&self, suffix: &str) -> bool {
        self.text().ends_with(suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;
    use crate::kind::KindRegistry;
    use crate::lex::{Token, TokenStream};
    use crate::patch::Rewriter;
    use crate::span::Span;
    use crate::tree::{NodeKind, TreeBuilder};

    const ATOM: NodeKind = NodeKind::new("atom");
    const PAIR: NodeKind = NodeKind::new("pair");

    /// `x ( a ) y` with the rewrite node owning only `a`.
    fn widened_fixture() -> (Rewriter, crate::tree::NodeId) {
        let tokens = TokenStream::from_tokens(vec![
            Token::new(TokenKind::Identifier, 0, 1),
            Token::new(TokenKind::LParen, 2, 3),
            Token::new(TokenKind::Identifier, 4, 5),
            Token::new(TokenKind::RParen, 6, 7),
            Token::new(TokenKind::Identifier, 8, 9),
        ])
        .unwrap();
        let context = ParseContext::new("x ( a ) y", tokens);
        let mut builder = TreeBuilder::new();
        let node = builder.leaf(ATOM, Span::new(4, 5));
        let tree = builder.build(node).unwrap();
        let rewriter = Rewriter::new(context, tree, KindRegistry::new()).unwrap();
        (rewriter, node)
    }

    #[test]
    fn boundary_queries_use_the_widened_token_indices() {
        let (rewriter, node) = widened_fixture();
        let view = crate::patch::NodeView { rw: &rewriter, id: node };

        // The token before the *widened* range is the identifier `x`, not
        // the absorbed opening paren.
        assert!(view.has_token_before(TokenKind::Identifier, Some("x")));
        assert!(!view.has_token_before(TokenKind::LParen, None));
        assert!(view.has_token_after(TokenKind::Identifier, Some("y")));
        assert!(!view.has_token_after(TokenKind::RParen, None));
    }

    #[test]
    fn surrounded_by_parens_checks_the_boundary_tokens() {
        let (rewriter, node) = widened_fixture();
        let view = crate::patch::NodeView { rw: &rewriter, id: node };
        assert!(view.surrounded_by_parens());
    }

    #[test]
    fn unwidened_node_is_not_surrounded() {
        let tokens = TokenStream::from_tokens(vec![
            Token::new(TokenKind::Identifier, 0, 1),
        ])
        .unwrap();
        let context = ParseContext::new("a", tokens);
        let mut builder = TreeBuilder::new();
        let node = builder.leaf(ATOM, Span::new(0, 1));
        let tree = builder.build(node).unwrap();
        let rewriter = Rewriter::new(context, tree, KindRegistry::new()).unwrap();

        let view = crate::patch::NodeView { rw: &rewriter, id: node };
        assert!(!view.surrounded_by_parens());
        assert!(!view.has_token_before(TokenKind::Identifier, None));
        assert!(!view.has_token_after(TokenKind::Identifier, None));
    }

    #[test]
    fn token_payload_filter_is_optional() {
        let (rewriter, node) = widened_fixture();
        let view = crate::patch::NodeView { rw: &rewriter, id: node };

        assert!(view.token_at_index_is(2, TokenKind::Identifier, None));
        assert!(view.token_at_index_is(2, TokenKind::Identifier, Some("a")));
        assert!(!view.token_at_index_is(2, TokenKind::Identifier, Some("b")));
        assert!(!view.token_at_index_is(2, TokenKind::Keyword, None));
        assert!(!view.token_at_index_is(99, TokenKind::Identifier, None));
    }

    #[test]
    fn has_token_after_index_looks_one_past() {
        let (rewriter, node) = widened_fixture();
        let view = crate::patch::NodeView { rw: &rewriter, id: node };

        assert!(view.has_token_after_index(1, TokenKind::Identifier, Some("a")));
        assert!(!view.has_token_after_index(1, TokenKind::RParen, None));
        assert!(!view.has_token_after_index(4, TokenKind::Identifier, None));
    }

    #[test]
    fn first_token_between_scans_in_order() {
        // a , + , b — first structural comma match wins.
        let tokens = TokenStream::from_tokens(vec![
            Token::new(TokenKind::Identifier, 0, 1),
            Token::new(TokenKind::Comma, 2, 3),
            Token::new(TokenKind::Operator, 4, 5),
            Token::new(TokenKind::Comma, 6, 7),
            Token::new(TokenKind::Identifier, 8, 9),
        ])
        .unwrap();
        let context = ParseContext::new("a , + , b", tokens);
        let mut builder = TreeBuilder::new();
        let left = builder.leaf(ATOM, Span::new(0, 1));
        let right = builder.leaf(ATOM, Span::new(8, 9));
        let root = builder.node(PAIR, Span::new(0, 9), vec![left, right]);
        let tree = builder.build(root).unwrap();
        let rewriter = Rewriter::new(context, tree, KindRegistry::new()).unwrap();

        let view = crate::patch::NodeView { rw: &rewriter, id: root };
        assert_eq!(view.first_token_between(left, right, TokenKind::Comma, None), Some(1));
        assert_eq!(
            view.first_token_between(left, right, TokenKind::Operator, Some("+")),
            Some(2)
        );
        assert_eq!(
            view.first_token_between(left, right, TokenKind::Semicolon, None),
            None
        );
    }

    #[test]
    fn text_queries_compare_against_the_original_source() {
        let (mut rewriter, node) = widened_fixture();
        // Edit the buffer first; the original-text queries must not notice.
        let mut patcher = crate::patch::PatcherRef { rw: &mut rewriter, id: node };
        patcher.overwrite(4, 5, "replacement").unwrap();

        let view = patcher.view();
        assert!(view.text_starts_with("a"));
        assert!(view.text_ends_with("a"));
        assert!(!view.text_starts_with("replacement"));
    }
}
