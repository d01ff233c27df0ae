//! Per-node byte-range resolution, including punctuation-aware widening.

use crate::lex::{TokenKind, TokenStream};
use crate::span::Span;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoundsError {
    #[error("no token at offset {offset} for node spanning {span}")]
    NoTokenAtStart { offset: usize, span: Span },

    #[error("node spanning {span} covers no tokens")]
    NoTokensWithin { span: Span },
}

/// A node's exact and punctuation-widened byte ranges, with the token
/// indices backing them. Resolved eagerly at construction and never
/// recomputed; resolution is pure, so re-resolving from an unmodified
/// stream yields identical offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentBounds {
    /// The node's exact original-source range.
    pub start: usize,
    pub end: usize,
    /// The widened range after absorbing flanking parenthesis pairs.
    /// Always `before_offset <= start <= end <= after_offset`.
    pub before_offset: usize,
    pub after_offset: usize,
    /// Tokens spanned exactly by the node.
    pub start_token: usize,
    pub last_token: usize,
    /// Token indices corresponding to the widened range.
    pub before_token: usize,
    pub after_token: usize,
}

impl ContentBounds {
    /// Resolve bounds for a node span against the token stream.
    ///
    /// Widening is greedy and symmetric, one token pair per pass: while the
    /// token just before the window is an opening parenthesis and the token
    /// just after is a closing one, both are absorbed. The two parentheses
    /// are never checked against each other structurally, only by kind, so
    /// a window flanked by parens from different groups still widens.
    pub fn resolve(span: Span, tokens: &TokenStream) -> Result<Self, BoundsError> {
        let start_token =
            tokens
                .index_at_offset(span.start)
                .ok_or(BoundsError::NoTokenAtStart {
                    offset: span.start,
                    span,
                })?;
        let spanned = tokens.count_within(span);
        if spanned == 0 {
            return Err(BoundsError::NoTokensWithin { span });
        }
        let last_token = start_token + spanned - 1;

        let mut before_token = start_token;
        let mut after_token = last_token;
        loop {
            let previous = before_token.checked_sub(1).and_then(|i| tokens.get(i));
            let next = tokens.get(after_token + 1);
            match (previous, next) {
                (Some(p), Some(n))
                    if p.kind == TokenKind::LParen && n.kind == TokenKind::RParen =>
                {
                    before_token -= 1;
                    after_token += 1;
                }
                _ => break,
            }
        }

        let before_offset = span
            .start
            .min(tokens.get(before_token).map_or(span.start, |t| t.span.start));
        let after_offset = span
            .end
            .max(tokens.get(after_token).map_or(span.end, |t| t.span.end));

        Ok(Self {
            start: span.start,
            end: span.end,
            before_offset,
            after_offset,
            start_token,
            last_token,
            before_token,
            after_token,
        })
    }

    pub fn content_span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn widened_span(&self) -> Span {
        Span::new(self.before_offset, self.after_offset)
    }

    /// Whether widening absorbed any punctuation at all.
    pub fn is_widened(&self) -> bool {
        self.before_token != self.start_token
    }
}
