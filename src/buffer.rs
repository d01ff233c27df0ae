//! The mutable overlay on the immutable original source.
//!
//! All addressing is by *original-source* byte offset; offsets never shift
//! as edits accumulate. Internally the document is an ordered list of
//! chunks, each owning an original subrange with optional replacement
//! content plus insertion strings anchored to the chunk's boundaries.
//!
//! Anchoring is what makes edit composition work: an insertion made at a
//! node's start boundary travels with the node's content, so a later
//! `slice`/`overwrite` of the enclosing range captures it, while an
//! insertion a *sibling* made at the same offset (anchored the other way)
//! does not. The buffer is the sole authority on composition conflicts;
//! callers above it log and forward unconditionally.

use crate::span::Span;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("offset {offset} is beyond the end of the source (len {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("offset {offset} is not a character boundary")]
    NotCharBoundary { offset: usize },

    #[error("invalid range {start}..{end}")]
    InvalidRange { start: usize, end: usize },

    #[error("offset {offset} falls inside already-replaced content")]
    InsideReplacedContent { offset: usize },
}

#[derive(Debug, Clone)]
struct Chunk {
    span: Span,
    /// Replacement for the chunk's original content, once overwritten.
    content: Option<String>,
    /// Insertions anchored to the chunk's content at its start boundary.
    intro: String,
    /// Insertions anchored to the chunk's content at its end boundary.
    outro: String,
}

impl Chunk {
    fn pristine(span: Span) -> Self {
        Self {
            span,
            content: None,
            intro: String::new(),
            outro: String::new(),
        }
    }

    fn is_edited(&self) -> bool {
        self.content.is_some()
    }
}

/// A mutable overlay on the original source, addressed by original offsets.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    original: Arc<str>,
    /// Insertions before the whole document (anchored left at offset 0).
    leading: String,
    /// Insertions after the whole document (anchored right at the end).
    trailing: String,
    chunks: Vec<Chunk>,
}

impl TextBuffer {
    pub fn new(original: impl Into<Arc<str>>) -> Self {
        let original = original.into();
        let chunks = if original.is_empty() {
            Vec::new()
        } else {
            vec![Chunk::pristine(Span::new(0, original.len()))]
        };
        Self {
            original,
            leading: String::new(),
            trailing: String::new(),
            chunks,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    fn check_offset(&self, offset: usize) -> Result<(), BufferError> {
        if offset > self.original.len() {
            return Err(BufferError::OffsetOutOfBounds {
                offset,
                len: self.original.len(),
            });
        }
        if !self.original.is_char_boundary(offset) {
            return Err(BufferError::NotCharBoundary { offset });
        }
        Ok(())
    }

    /// Index of the chunk containing `offset` (start inclusive, end
    /// exclusive). Assumes a validated in-range offset below len.
    fn chunk_at(&self, offset: usize) -> usize {
        self.chunks
            .partition_point(|c| c.span.start <= offset)
            .saturating_sub(1)
    }

    /// Ensure a chunk boundary exists at `offset`; returns the index of the
    /// chunk starting there (`chunks.len()` when `offset` is the end of the
    /// source). Splitting replaced content is impossible: the offset no
    /// longer corresponds to a position inside it.
    fn split_at(&mut self, offset: usize) -> Result<usize, BufferError> {
        if offset == 0 {
            return Ok(0);
        }
        if offset == self.original.len() {
            return Ok(self.chunks.len());
        }
        let index = self.chunk_at(offset);
        let chunk = &mut self.chunks[index];
        if chunk.span.start == offset {
            return Ok(index);
        }
        if chunk.is_edited() {
            return Err(BufferError::InsideReplacedContent { offset });
        }
        let right = Chunk {
            span: Span::new(offset, chunk.span.end),
            content: None,
            intro: String::new(),
            outro: std::mem::take(&mut chunk.outro),
        };
        chunk.span = Span::new(chunk.span.start, offset);
        self.chunks.insert(index + 1, right);
        Ok(index + 1)
    }

    /// Zero-width insertion anchored to the content *preceding* `offset`.
    /// Repeated inserts at one offset render in call order.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), BufferError> {
        self.check_offset(offset)?;
        if offset == 0 {
            self.leading.push_str(text);
            return Ok(());
        }
        let index = self.split_at(offset)?;
        self.chunks[index - 1].outro.push_str(text);
        Ok(())
    }

    /// Zero-width insertion anchored to the content *following* `offset`.
    /// Repeated inserts at one offset render with later calls outermost, so
    /// an ancestor wrapping after its descendant lands outside.
    pub fn insert_before(&mut self, offset: usize, text: &str) -> Result<(), BufferError> {
        self.check_offset(offset)?;
        if offset == self.original.len() {
            self.trailing.insert_str(0, text);
            return Ok(());
        }
        let index = self.split_at(offset)?;
        self.chunks[index].intro.insert_str(0, text);
        Ok(())
    }

    /// Replace the buffer's *current* content in `[start, end)`. Edits and
    /// content-anchored insertions lying inside the range are subsumed; a
    /// boundary strictly inside previously replaced content is an error.
    pub fn overwrite(&mut self, start: usize, end: usize, text: &str) -> Result<(), BufferError> {
        if start >= end {
            return Err(BufferError::InvalidRange { start, end });
        }
        self.check_offset(start)?;
        self.check_offset(end)?;
        let first = self.split_at(start)?;
        let last = self.split_at(end)?;
        let replacement = Chunk {
            span: Span::new(start, end),
            content: Some(text.to_string()),
            intro: String::new(),
            outro: String::new(),
        };
        self.chunks.splice(first..last, [replacement]);
        Ok(())
    }

    /// Delete the buffer's current content in `[start, end)`.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<(), BufferError> {
        self.overwrite(start, end, "")
    }

    /// Read the current (possibly already edited) content of `[start, end)`,
    /// including the insertions an `overwrite` of the same range would
    /// subsume. Used when a rewrite reuses already-transformed child text.
    pub fn slice(&self, start: usize, end: usize) -> Result<String, BufferError> {
        if start > end {
            return Err(BufferError::InvalidRange { start, end });
        }
        self.check_offset(start)?;
        self.check_offset(end)?;
        if start == end {
            return Ok(String::new());
        }

        let mut out = String::new();
        for chunk in &self.chunks {
            if chunk.span.end <= start || chunk.span.start >= end {
                continue;
            }
            let head_clipped = chunk.span.start < start;
            let tail_clipped = chunk.span.end > end;
            if (head_clipped || tail_clipped) && chunk.is_edited() {
                let offset = if head_clipped { start } else { end };
                return Err(BufferError::InsideReplacedContent { offset });
            }
            if !head_clipped {
                out.push_str(&chunk.intro);
            }
            match &chunk.content {
                Some(content) => out.push_str(content),
                None => {
                    let from = chunk.span.start.max(start);
                    let to = chunk.span.end.min(end);
                    out.push_str(&self.original[from..to]);
                }
            }
            if !tail_clipped {
                out.push_str(&chunk.outro);
            }
        }
        Ok(out)
    }

    /// Render the full current document.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.original.len());
        out.push_str(&self.leading);
        for chunk in &self.chunks {
            out.push_str(&chunk.intro);
            match &chunk.content {
                Some(content) => out.push_str(content),
                None => out.push_str(&self.original[chunk.span.start..chunk.span.end]),
            }
            out.push_str(&chunk.outro);
        }
        out.push_str(&self.trailing);
        out
    }
}
