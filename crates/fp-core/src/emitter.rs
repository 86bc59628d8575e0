//! Emitter: syntax tree → canonical source text.
//!
//! The dual of [`crate::parser`]: `parse_program(emit_program(tree))`
//! reproduces an equivalent tree, and a single statement re-parses from
//! its own `statement_string` minus the terminator. Pure functions of
//! tree state — nothing here mutates a node.

use crate::model::{NodeKind, SyntaxTree};
use petgraph::graph::NodeIndex;
use std::fmt::Write;

/// One indentation step inside compound statements.
pub const INDENT: &str = "    ";

/// Canonical source text for a node, terminator included: `;\n` for
/// simple statements, a trailing newline after the closing brace for
/// if/else.
#[must_use]
pub fn statement_string(tree: &SyntaxTree, idx: NodeIndex) -> String {
    let mut out = String::new();
    emit_statement(&mut out, tree, idx, 0);
    out
}

/// Emit the whole program: the root's statement sequence at depth 0.
#[must_use]
pub fn emit_program(tree: &SyntaxTree) -> String {
    statement_string(tree, tree.root)
}

/// Strip the statement terminator: trailing whitespace, then the `;`.
pub fn strip_terminator(s: &str) -> &str {
    let s = s.trim_end();
    s.strip_suffix(';').unwrap_or(s)
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn emit_statement(out: &mut String, tree: &SyntaxTree, idx: NodeIndex, depth: usize) {
    let Some(node) = tree.get(idx) else {
        return;
    };

    for comment in &node.comments {
        indent(out, depth);
        writeln!(out, "// {comment}").unwrap();
    }

    match &node.kind {
        NodeKind::Root => {
            for &child in tree.children(idx) {
                emit_statement(out, tree, child, depth);
            }
        }
        NodeKind::Block => {
            for &child in tree.children(idx) {
                emit_statement(out, tree, child, depth);
            }
        }
        NodeKind::Assignment { target, value } => {
            indent(out, depth);
            writeln!(out, "{target} = {value};").unwrap();
        }
        NodeKind::VariableDefinition {
            type_name,
            name,
            value,
        } => {
            indent(out, depth);
            match value {
                Some(value) => writeln!(out, "{type_name} {name} = {value};").unwrap(),
                None => writeln!(out, "{type_name} {name};").unwrap(),
            }
        }
        NodeKind::Return { value } => {
            indent(out, depth);
            match value {
                Some(value) => writeln!(out, "return {value};").unwrap(),
                None => writeln!(out, "return;").unwrap(),
            }
        }
        NodeKind::Break => {
            indent(out, depth);
            out.push_str("break;\n");
        }
        NodeKind::IfElse { condition } => {
            indent(out, depth);
            writeln!(out, "if ({condition}) {{").unwrap();

            let blocks: Vec<NodeIndex> = tree
                .children(idx)
                .iter()
                .copied()
                .filter(|&c| matches!(tree.graph[c].kind, NodeKind::Block))
                .collect();

            if let Some(&then_block) = blocks.first() {
                for &child in tree.children(then_block) {
                    emit_statement(out, tree, child, depth + 1);
                }
            }

            indent(out, depth);
            if let Some(&else_block) = blocks.get(1) {
                out.push_str("} else {\n");
                for &child in tree.children(else_block) {
                    emit_statement(out, tree, child, depth + 1);
                }
                indent(out, depth);
            }
            out.push_str("}\n");
        }
        NodeKind::Expression { text } => {
            out.push_str(text);
        }
    }
}
