//! The shared parse context handed to every rewrite node.

use crate::lex::{Token, TokenStream};
use crate::span::Span;
use crate::tree::Node;
use std::sync::Arc;

/// Original source plus the token stream over it.
///
/// Shared read-only by the whole rewriter; the source text is also shared
/// with the text buffer, which addresses it by the same offsets.
#[derive(Debug, Clone)]
pub struct ParseContext {
    source: Arc<str>,
    tokens: TokenStream,
}

impl ParseContext {
    pub fn new(source: impl Into<Arc<str>>, tokens: TokenStream) -> Self {
        Self {
            source: source.into(),
            tokens,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn source_arc(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    pub fn token_at(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn index_of_token_at(&self, offset: usize) -> Option<usize> {
        self.tokens.index_at_offset(offset)
    }

    /// The token's literal payload: its original source text.
    pub fn token_text(&self, token: &Token) -> &str {
        &self.source[token.span.start..token.span.end]
    }

    /// All tokens spanned exactly by a node.
    pub fn tokens_for_node<'a>(&'a self, node: &Node) -> impl Iterator<Item = &'a Token> + 'a {
        let range = self.tokens.indices_within(node.span());
        range.filter_map(|index| self.tokens.get(index))
    }

    /// All tokens lexically between two nodes, in order.
    pub fn tokens_between<'a>(
        &'a self,
        left: &Node,
        right: &Node,
    ) -> impl Iterator<Item = &'a Token> + 'a {
        let range = self.tokens.indices_between(left.span(), right.span());
        range.filter_map(|index| self.tokens.get(index))
    }

    /// Original text of a span, untouched by any edits.
    pub fn text_of(&self, span: Span) -> &str {
        &self.source[span.start..span.end]
    }
}
