//! Tokens and the token stream accessor.
//!
//! The stream is produced by an external front end; this module only
//! indexes it. All queries are by original-source offset or token index,
//! and the stream itself is immutable once constructed.

use crate::span::Span;
use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

/// Lexical class of a token.
///
/// The range resolver only cares about the parenthesis classes; the rest
/// exist so front ends can hand over a complete stream and kinds can query
/// their surroundings by class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Identifier,
    Keyword,
    Operator,
    Number,
    Str,
    Newline,
    Comment,
}

/// A lexical unit with a byte range, independent of tree structure.
///
/// A token's literal payload is its original source text, recovered via
/// [`crate::context::ParseContext::token_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

#[derive(Error, Debug)]
pub enum LexError {
    #[error("token {index} at {span} is out of order or overlaps its predecessor")]
    UnorderedToken { index: usize, span: Span },

    #[error("token {index} has an inverted range {span}")]
    InvertedToken { index: usize, span: Span },
}

/// An ordered, non-overlapping sequence of tokens over the original source.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Build a stream, validating that tokens are ordered and disjoint.
    /// Gaps (whitespace the lexer skipped) are fine.
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self, LexError> {
        let mut last_end = 0;
        for (index, token) in tokens.iter().enumerate() {
            if token.span.start > token.span.end {
                return Err(LexError::InvertedToken {
                    index,
                    span: token.span,
                });
            }
            if token.span.start < last_end {
                return Err(LexError::UnorderedToken {
                    index,
                    span: token.span,
                });
            }
            last_end = token.span.end;
        }
        Ok(Self { tokens })
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    /// Index of the token containing `offset` (start inclusive, end
    /// exclusive). `None` when the offset falls in a gap or past the end.
    pub fn index_at_offset(&self, offset: usize) -> Option<usize> {
        let candidate = self.tokens.partition_point(|t| t.span.start <= offset);
        let index = candidate.checked_sub(1)?;
        let token = &self.tokens[index];
        token.span.contains(offset).then_some(index)
    }

    /// Indices of the tokens spanned exactly by `span`: every token lying
    /// entirely within it. Empty range when none do.
    pub fn indices_within(&self, span: Span) -> Range<usize> {
        let first = self.tokens.partition_point(|t| t.span.start < span.start);
        let mut last = first;
        while let Some(token) = self.tokens.get(last) {
            if token.span.end > span.end {
                break;
            }
            last += 1;
        }
        first..last
    }

    pub fn count_within(&self, span: Span) -> usize {
        self.indices_within(span).len()
    }

    /// The exact token slice lexically between two spans, in order:
    /// tokens starting at or after `left.end` and ending at or before
    /// `right.start`.
    pub fn indices_between(&self, left: Span, right: Span) -> Range<usize> {
        if left.end > right.start {
            return 0..0;
        }
        self.indices_within(Span::new(left.end, right.start))
    }
}
