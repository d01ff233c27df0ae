//! Reference rewrite kinds for a small expression-oriented surface syntax
//! rendered into a statement-oriented C-like target.
//!
//! These exist to exercise and demonstrate the core protocol end to end:
//! form negotiation, forced-expression wrapping, returns propagation,
//! token queries, buffer reuse through `slice`, and helper registration.
//! A production rewriter supplies its own, much larger catalog.

use crate::kind::{KindRegistry, NodeRewrite, PatchOptions};
use crate::lex::TokenKind;
use crate::patch::{NodeView, PatchError, PatcherRef};
use crate::span::Span;
use crate::tree::{NodeId, NodeKind};

pub const PROGRAM: NodeKind = NodeKind::new("program");
pub const IDENTIFIER: NodeKind = NodeKind::new("identifier");
pub const NUMBER: NodeKind = NodeKind::new("number");
pub const NOT: NodeKind = NodeKind::new("not");
pub const LOGICAL: NodeKind = NodeKind::new("logical");
pub const POWER: NodeKind = NodeKind::new("power");
pub const CONDITIONAL: NodeKind = NodeKind::new("conditional");
pub const RETURN: NodeKind = NodeKind::new("return");

const POW_HELPER: &str = "function __pow__(base, exponent) {\n  return Math.pow(base, exponent);\n}";

/// A registry covering the whole toy syntax.
pub fn reference_registry() -> KindRegistry {
    let mut registry = KindRegistry::new();
    registry.register(PROGRAM, Program);
    registry.register(IDENTIFIER, Leaf);
    registry.register(NUMBER, Leaf);
    registry.register(NOT, Not);
    registry.register(LOGICAL, Logical);
    registry.register(POWER, Power);
    registry.register(CONDITIONAL, Conditional);
    registry.register(RETURN, Return);
    registry
}

/// Patch a child in statement form and terminate it the way the target
/// syntax expects, unless the source already carries a terminator.
fn patch_statement_child(p: &mut PatcherRef<'_>, child: NodeId) -> Result<(), PatchError> {
    p.patch(child, &PatchOptions::default())?;
    if p.statement_needs_semicolon(child) && !p.at(child).has_token_after(TokenKind::Semicolon, None)
    {
        let after = p.bounds_of(child).after_offset;
        p.insert(after, ";")?;
    }
    Ok(())
}

fn token_span(p: &PatcherRef<'_>, index: usize, what: &str) -> Result<Span, PatchError> {
    p.view()
        .token(index)
        .map(|token| token.span)
        .ok_or_else(|| p.error(format!("{what} token vanished from the stream")))
}

/// Top of the tree. Renders every child in statement form and terminates
/// the helper-registration chain.
struct Program;

impl NodeRewrite for Program {
    fn patch_as_statement(
        &self,
        p: &mut PatcherRef<'_>,
        _options: &PatchOptions,
    ) -> Result<(), PatchError> {
        for child in p.children() {
            patch_statement_child(p, child)?;
        }
        Ok(())
    }

    fn can_patch_as_expression(&self, _node: &NodeView<'_>) -> bool {
        false
    }

    fn statement_needs_semicolon(&self, _node: &NodeView<'_>) -> bool {
        false
    }

    fn accepts_helpers(&self) -> bool {
        true
    }
}

/// Identifiers and number literals survive unchanged in either form.
struct Leaf;

impl NodeRewrite for Leaf {
    fn patch_as_expression(
        &self,
        _p: &mut PatcherRef<'_>,
        _options: &PatchOptions,
    ) -> Result<(), PatchError> {
        Ok(())
    }
}

/// `not x` → `!x`. The operand keeps any parentheses it already has, and
/// the replacement collapses the keyword together with the gap after it.
struct Not;

impl NodeRewrite for Not {
    fn patch_as_expression(
        &self,
        p: &mut PatcherRef<'_>,
        _options: &PatchOptions,
    ) -> Result<(), PatchError> {
        let operand = p.child(0)?;
        let operand_before = p.bounds_of(operand).before_offset;
        p.overwrite(p.start(), operand_before, "!")?;
        p.set_requires_expression(operand)?;
        p.patch(operand, &PatchOptions::default())
    }
}

/// `a and b` / `a or b` → `a && b` / `a || b`.
struct Logical;

impl NodeRewrite for Logical {
    fn patch_as_expression(
        &self,
        p: &mut PatcherRef<'_>,
        _options: &PatchOptions,
    ) -> Result<(), PatchError> {
        let left = p.child(0)?;
        let right = p.child(1)?;
        let op_index = p
            .view()
            .first_token_between(left, right, TokenKind::Operator, None)
            .ok_or_else(|| p.error("no operator between logical operands"))?;
        let replacement = match p.view().token_text(op_index) {
            Some("and") => "&&",
            Some("or") => "||",
            other => {
                let found = other.unwrap_or_default().to_string();
                return Err(p.error(format!("unsupported logical operator `{found}`")));
            }
        };
        let op_span = token_span(p, op_index, "logical operator")?;
        p.overwrite(op_span.start, op_span.end, replacement)?;

        p.set_requires_expression(left)?;
        p.patch(left, &PatchOptions::default())?;
        p.set_requires_expression(right)?;
        p.patch(right, &PatchOptions::default())
    }
}

/// `base ** exponent` → `__pow__(base, exponent)`. Operands are patched
/// first, then their transformed text is sliced back out of the buffer and
/// rebuilt into the call.
struct Power;

impl NodeRewrite for Power {
    fn patch_as_expression(
        &self,
        p: &mut PatcherRef<'_>,
        _options: &PatchOptions,
    ) -> Result<(), PatchError> {
        let base = p.child(0)?;
        let exponent = p.child(1)?;
        p.set_requires_expression(base)?;
        p.patch(base, &PatchOptions::default())?;
        p.set_requires_expression(exponent)?;
        p.patch(exponent, &PatchOptions::default())?;

        let base_bounds = p.bounds_of(base);
        let exponent_bounds = p.bounds_of(exponent);
        let base_text = p.slice(base_bounds.before_offset, base_bounds.after_offset)?;
        let exponent_text = p.slice(exponent_bounds.before_offset, exponent_bounds.after_offset)?;

        let call = format!("__pow__({base_text}, {exponent_text})");
        p.overwrite(p.start(), p.end(), &call)?;
        p.register_helper("__pow__", POW_HELPER)
    }
}

/// `if c then t else f`. As a statement this becomes a braced conditional;
/// forced into expression position it collapses to the ternary instead.
/// Only a conditional with both arms can be an expression.
struct Conditional;

impl NodeRewrite for Conditional {
    fn can_patch_as_expression(&self, node: &NodeView<'_>) -> bool {
        node.children().len() == 3
    }

    fn prefers_to_patch_as_expression(&self, _node: &NodeView<'_>) -> bool {
        false
    }

    fn statement_needs_semicolon(&self, _node: &NodeView<'_>) -> bool {
        false
    }

    fn patch_as_statement(
        &self,
        p: &mut PatcherRef<'_>,
        _options: &PatchOptions,
    ) -> Result<(), PatchError> {
        let condition = p.child(0)?;
        let consequent = p.child(1)?;

        p.set_requires_expression(condition)?;
        p.patch(condition, &PatchOptions::default())?;
        if !p.at(condition).surrounded_by_parens() {
            let bounds = p.bounds_of(condition);
            p.insert(bounds.before_offset, "(")?;
            p.insert(bounds.after_offset, ")")?;
        }

        let then_index = p
            .view()
            .first_token_between(condition, consequent, TokenKind::Keyword, Some("then"))
            .ok_or_else(|| p.error("conditional is missing `then`"))?;
        let then_span = token_span(p, then_index, "`then`")?;
        p.overwrite(then_span.start, then_span.end, "{")?;
        patch_statement_child(p, consequent)?;

        if p.children().len() > 2 {
            let alternate = p.child(2)?;
            let else_index = p
                .view()
                .first_token_between(consequent, alternate, TokenKind::Keyword, Some("else"))
                .ok_or_else(|| p.error("conditional is missing `else`"))?;
            let else_span = token_span(p, else_index, "`else`")?;
            p.overwrite(else_span.start, else_span.end, "} else {")?;
            patch_statement_child(p, alternate)?;
        }

        p.insert_at_end(" }")
    }

    fn patch_as_forced_expression(
        &self,
        p: &mut PatcherRef<'_>,
        _options: &PatchOptions,
    ) -> Result<(), PatchError> {
        let condition = p.child(0)?;
        let consequent = p.child(1)?;
        let alternate = p.child(2)?;

        p.remove(p.start(), p.bounds_of(condition).before_offset)?;

        let then_index = p
            .view()
            .first_token_between(condition, consequent, TokenKind::Keyword, Some("then"))
            .ok_or_else(|| p.error("conditional is missing `then`"))?;
        let then_span = token_span(p, then_index, "`then`")?;
        p.overwrite(then_span.start, then_span.end, "?")?;

        let else_index = p
            .view()
            .first_token_between(consequent, alternate, TokenKind::Keyword, Some("else"))
            .ok_or_else(|| p.error("conditional is missing `else`"))?;
        let else_span = token_span(p, else_index, "`else`")?;
        p.overwrite(else_span.start, else_span.end, ":")?;

        for child in [condition, consequent, alternate] {
            p.set_requires_expression(child)?;
            p.patch(child, &PatchOptions::default())?;
        }
        Ok(())
    }
}

/// `return x`. Statement-only; records the explicit return on itself and
/// every enclosing construct.
struct Return;

impl NodeRewrite for Return {
    fn can_patch_as_expression(&self, _node: &NodeView<'_>) -> bool {
        false
    }

    fn patch_as_statement(
        &self,
        p: &mut PatcherRef<'_>,
        _options: &PatchOptions,
    ) -> Result<(), PatchError> {
        p.set_explicitly_returns();
        if let Some(value) = p.children().first().copied() {
            p.set_requires_expression(value)?;
            p.patch(value, &PatchOptions::default())?;
        }
        Ok(())
    }
}
