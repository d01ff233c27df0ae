//! The mutation façade: the only path a kind edits the buffer through.
//!
//! Every primitive records a structured trace of the pre-edit state and
//! forwards unconditionally — the buffer, not this layer, is the authority
//! on edit-composition conflicts. Traces keep small pre-edit content
//! verbatim and digest anything over 1 KiB.

use crate::patch::{PatchError, PatcherRef};
use crate::tree::NodeKind;
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_64;

/// Literal threshold above which traced content is stored as a digest.
const TRACE_LITERAL_MAX: usize = 1024;

/// Pre-edit content captured in a trace: verbatim when small, an xxh3
/// digest when large.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TracedText {
    Literal(String),
    Digest(u64),
}

impl TracedText {
    pub fn from_text(text: &str) -> Self {
        if text.len() > TRACE_LITERAL_MAX {
            TracedText::Digest(xxh3_64(text.as_bytes()))
        } else {
            TracedText::Literal(text.to_string())
        }
    }

    /// Whether `text` matches the captured content.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TracedText::Literal(expected) => expected == text,
            TracedText::Digest(expected) => *expected == xxh3_64(text.as_bytes()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOp {
    Insert,
    Overwrite,
    Remove,
    Slice,
}

/// One façade operation against the buffer, as issued by a node.
#[derive(Debug, Clone, Serialize)]
pub struct EditTrace {
    pub op: EditOp,
    /// Kind of the node that issued the edit.
    pub node: NodeKind,
    pub start: usize,
    pub end: usize,
    /// Buffer content at the range before the edit (reads capture what was
    /// read). Absent for zero-width insertions.
    pub before: Option<TracedText>,
    /// Inserted or replacement text. Absent for removals and reads.
    pub text: Option<String>,
}

/// The journal of every façade operation, in issue order.
#[derive(Debug, Default, Serialize)]
pub struct EditLog {
    entries: Vec<EditTrace>,
}

impl EditLog {
    pub(crate) fn push(&mut self, trace: EditTrace) {
        self.entries.push(trace);
    }

    pub fn entries(&self) -> &[EditTrace] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Detect the document's indentation unit: the leading whitespace of the
/// first indented line, a tab when tabs lead, two spaces as the fallback.
pub(crate) fn detect_indent_unit(source: &str) -> String {
    for line in source.lines() {
        let indent: String = line
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        if indent.is_empty() || indent.len() == line.len() {
            continue;
        }
        if indent.starts_with('\t') {
            return "\t".to_string();
        }
        return indent;
    }
    "  ".to_string()
}

impl PatcherRef<'_> {
    fn trace(
        &mut self,
        op: EditOp,
        start: usize,
        end: usize,
        before: Option<TracedText>,
        text: Option<&str>,
    ) {
        let node = self.kind();
        tracing::trace!(?op, %node, start, end, "buffer edit");
        self.rw.log.push(EditTrace {
            op,
            node,
            start,
            end,
            before,
            text: text.map(str::to_string),
        });
    }

    /// Zero-width insertion at an original-source offset, anchored to the
    /// content preceding it.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), PatchError> {
        self.trace(EditOp::Insert, offset, offset, None, Some(text));
        self.rw.buffer.insert(offset, text)?;
        Ok(())
    }

    /// Zero-width insertion anchored to the content following the offset,
    /// so the inserted text travels with what comes after it.
    fn insert_anchored_after(&mut self, offset: usize, text: &str) -> Result<(), PatchError> {
        self.trace(EditOp::Insert, offset, offset, None, Some(text));
        self.rw.buffer.insert_before(offset, text)?;
        Ok(())
    }

    /// Replace the buffer's current content in `[start, end)`.
    pub fn overwrite(&mut self, start: usize, end: usize, text: &str) -> Result<(), PatchError> {
        let before = self.rw.buffer.slice(start, end)?;
        self.trace(
            EditOp::Overwrite,
            start,
            end,
            Some(TracedText::from_text(&before)),
            Some(text),
        );
        self.rw.buffer.overwrite(start, end, text)?;
        Ok(())
    }

    /// Delete the buffer's current content in `[start, end)`.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<(), PatchError> {
        let before = self.rw.buffer.slice(start, end)?;
        self.trace(
            EditOp::Remove,
            start,
            end,
            Some(TracedText::from_text(&before)),
            None,
        );
        self.rw.buffer.remove(start, end)?;
        Ok(())
    }

    /// Read the current (possibly already edited) content of a range —
    /// used to reuse the already-transformed text of a child.
    pub fn slice(&mut self, start: usize, end: usize) -> Result<String, PatchError> {
        let content = self.rw.buffer.slice(start, end)?;
        self.trace(
            EditOp::Slice,
            start,
            end,
            Some(TracedText::from_text(&content)),
            None,
        );
        Ok(content)
    }

    /// Insert at the node's exact start. The text is anchored to the node
    /// content, so slicing or overwriting the node range captures it.
    pub fn insert_at_start(&mut self, text: &str) -> Result<(), PatchError> {
        let offset = self.start();
        self.insert_anchored_after(offset, text)
    }

    /// Insert at the node's exact end, anchored to the node content.
    pub fn insert_at_end(&mut self, text: &str) -> Result<(), PatchError> {
        let offset = self.end();
        self.insert(offset, text)
    }

    /// Insert at the widened start, outside any absorbed punctuation.
    pub fn insert_before(&mut self, text: &str) -> Result<(), PatchError> {
        let offset = self.before_offset();
        self.insert_anchored_after(offset, text)
    }

    /// Insert at the widened end, outside any absorbed punctuation.
    pub fn insert_after(&mut self, text: &str) -> Result<(), PatchError> {
        let offset = self.after_offset();
        self.insert(offset, text)
    }

    /// Append `text` on a new line after the source line containing the
    /// node's widened end, reproducing the node's line indentation.
    pub fn append_on_new_line(&mut self, text: &str) -> Result<(), PatchError> {
        self.append_on_new_line_indented(text, 0)
    }

    /// As [`PatcherRef::append_on_new_line`], indented `levels` deeper
    /// using the document's detected indentation unit.
    pub fn append_on_new_line_indented(
        &mut self,
        text: &str,
        levels: usize,
    ) -> Result<(), PatchError> {
        let bounds = self.bounds();
        let source = self.rw.context.source();
        let line_end = source[bounds.after_offset..]
            .find('\n')
            .map_or(source.len(), |i| bounds.after_offset + i);
        let line_start = source[..bounds.before_offset]
            .rfind('\n')
            .map_or(0, |i| i + 1);
        let indent: String = source[line_start..]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        let appended = format!(
            "\n{indent}{}{text}",
            self.rw.indent_unit.repeat(levels)
        );
        self.insert(line_end, &appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;
    use crate::kind::KindRegistry;
    use crate::lex::{Token, TokenKind, TokenStream};
    use crate::patch::Rewriter;
    use crate::span::Span;
    use crate::tree::{NodeId, NodeKind, TreeBuilder};

    const ATOM: NodeKind = NodeKind::new("atom");

    /// One node spanning `[20, 30)` of a forty-character source.
    fn fixture() -> (Rewriter, NodeId) {
        let source = "0123456789abcdefghijklmnopqrstuvwxyzABCD";
        let tokens =
            TokenStream::from_tokens(vec![Token::new(TokenKind::Identifier, 20, 30)]).unwrap();
        let context = ParseContext::new(source, tokens);
        let mut builder = TreeBuilder::new();
        let node = builder.leaf(ATOM, Span::new(20, 30));
        let tree = builder.build(node).unwrap();
        let rewriter = Rewriter::new(context, tree, KindRegistry::new()).unwrap();
        (rewriter, node)
    }

    #[test]
    fn boundary_inserts_log_the_exact_offsets_in_order() {
        let (mut rewriter, node) = fixture();
        let mut patcher = PatcherRef {
            rw: &mut rewriter,
            id: node,
        };
        patcher.insert_at_start("(").unwrap();
        patcher.insert_at_end(")").unwrap();

        let entries = rewriter.log().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].op, EditOp::Insert);
        assert_eq!((entries[0].start, entries[0].end), (20, 20));
        assert_eq!(entries[0].text.as_deref(), Some("("));
        assert_eq!(entries[1].op, EditOp::Insert);
        assert_eq!((entries[1].start, entries[1].end), (30, 30));
        assert_eq!(entries[1].text.as_deref(), Some(")"));

        let rendered = rewriter.finish().code;
        assert_eq!(&rendered[20..32], "(klmnopqrst)");
    }

    #[test]
    fn overwrite_records_the_pre_edit_state() {
        let (mut rewriter, node) = fixture();
        let mut patcher = PatcherRef {
            rw: &mut rewriter,
            id: node,
        };
        patcher.overwrite(20, 30, "TEN").unwrap();

        let entry = &rewriter.log().entries()[0];
        assert_eq!(entry.op, EditOp::Overwrite);
        assert_eq!(
            entry.before,
            Some(TracedText::Literal("klmnopqrst".to_string()))
        );
        assert_eq!(entry.text.as_deref(), Some("TEN"));
    }

    #[test]
    fn slice_is_traced_as_a_read() {
        let (mut rewriter, node) = fixture();
        let mut patcher = PatcherRef {
            rw: &mut rewriter,
            id: node,
        };
        patcher.overwrite(20, 30, "TEN").unwrap();
        let content = patcher.slice(20, 30).unwrap();
        assert_eq!(content, "TEN");

        let entry = &rewriter.log().entries()[1];
        assert_eq!(entry.op, EditOp::Slice);
        assert_eq!(entry.before, Some(TracedText::Literal("TEN".to_string())));
        assert_eq!(entry.text, None);
    }

    #[test]
    fn start_insertions_travel_with_the_node_content() {
        let (mut rewriter, node) = fixture();
        let mut patcher = PatcherRef {
            rw: &mut rewriter,
            id: node,
        };
        patcher.insert_at_start("(").unwrap();
        patcher.insert_at_end(")").unwrap();
        let wrapped = patcher.slice(20, 30).unwrap();
        assert_eq!(wrapped, "(klmnopqrst)");
    }

    #[test]
    fn widened_inserts_stay_outside_absorbed_parens() {
        let tokens = TokenStream::from_tokens(vec![
            Token::new(TokenKind::LParen, 0, 1),
            Token::new(TokenKind::Identifier, 1, 2),
            Token::new(TokenKind::RParen, 2, 3),
        ])
        .unwrap();
        let context = ParseContext::new("(x)", tokens);
        let mut builder = TreeBuilder::new();
        let node = builder.leaf(ATOM, Span::new(1, 2));
        let tree = builder.build(node).unwrap();
        let mut rewriter = Rewriter::new(context, tree, KindRegistry::new()).unwrap();

        let mut patcher = PatcherRef {
            rw: &mut rewriter,
            id: node,
        };
        patcher.insert_before("!").unwrap();
        patcher.insert_after("?").unwrap();
        assert_eq!(rewriter.finish().code, "!(x)?");
    }

    #[test]
    fn append_on_new_line_reproduces_indentation() {
        let source = "begin\n  first\nend\n";
        let tokens =
            TokenStream::from_tokens(vec![Token::new(TokenKind::Identifier, 8, 13)]).unwrap();
        let context = ParseContext::new(source, tokens);
        let mut builder = TreeBuilder::new();
        let node = builder.leaf(ATOM, Span::new(8, 13));
        let tree = builder.build(node).unwrap();
        let mut rewriter = Rewriter::new(context, tree, KindRegistry::new()).unwrap();

        let mut patcher = PatcherRef {
            rw: &mut rewriter,
            id: node,
        };
        patcher.append_on_new_line("second").unwrap();
        patcher.append_on_new_line_indented("third", 1).unwrap();

        assert_eq!(
            rewriter.finish().code,
            "begin\n  first\n  second\n    third\nend\n"
        );
    }

    #[test]
    fn append_on_new_line_at_end_of_file_without_newline() {
        let source = "lone";
        let tokens =
            TokenStream::from_tokens(vec![Token::new(TokenKind::Identifier, 0, 4)]).unwrap();
        let context = ParseContext::new(source, tokens);
        let mut builder = TreeBuilder::new();
        let node = builder.leaf(ATOM, Span::new(0, 4));
        let tree = builder.build(node).unwrap();
        let mut rewriter = Rewriter::new(context, tree, KindRegistry::new()).unwrap();

        let mut patcher = PatcherRef {
            rw: &mut rewriter,
            id: node,
        };
        patcher.append_on_new_line("next").unwrap();
        assert_eq!(rewriter.finish().code, "lone\nnext");
    }

    #[test]
    fn traced_text_digests_large_content() {
        let small = TracedText::from_text("short");
        assert!(matches!(small, TracedText::Literal(_)));
        assert!(small.matches("short"));
        assert!(!small.matches("other"));

        let big_source = "x".repeat(4096);
        let big = TracedText::from_text(&big_source);
        assert!(matches!(big, TracedText::Digest(_)));
        assert!(big.matches(&big_source));
        assert!(!big.matches("y"));
    }

    #[test]
    fn indent_unit_detection() {
        assert_eq!(detect_indent_unit("a\n    b\n"), "    ");
        assert_eq!(detect_indent_unit("a\n\tb\n"), "\t");
        assert_eq!(detect_indent_unit("flat\nlines\n"), "  ");
        // whitespace-only lines are skipped
        assert_eq!(detect_indent_unit("a\n   \n  b\n"), "  ");
    }

    #[test]
    fn log_serializes_for_external_journals() {
        let (mut rewriter, node) = fixture();
        let mut patcher = PatcherRef {
            rw: &mut rewriter,
            id: node,
        };
        patcher.remove(20, 22).unwrap();

        let json = serde_json::to_value(rewriter.log()).unwrap();
        let entry = &json["entries"][0];
        assert_eq!(entry["op"], "remove");
        assert_eq!(entry["start"], 20);
        assert_eq!(entry["end"], 22);
    }
}
