//! Structural diagnostics for syntax trees.
//!
//! Reports issues without modifying the tree. Results feed the sync
//! engine's validity reporting; the editor shell decides how to surface
//! them.

use crate::id::NodeId;
use crate::model::{NodeKind, SyntaxTree};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Should be fixed — likely a mistake.
    Warning,
    /// Informational.
    Info,
}

/// A single diagnostic for an AST node.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The node this diagnostic refers to.
    pub node_id: NodeId,
    /// Human-readable message.
    pub message: String,
    /// Severity level.
    pub severity: Severity,
    /// Short rule identifier (e.g. "unreachable-code").
    pub rule: &'static str,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Run all rules over the tree and return diagnostics.
#[must_use]
pub fn validate_tree(tree: &SyntaxTree) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    check_sequence(tree, tree.root, &mut diags);
    for idx in tree.graph.node_indices() {
        if matches!(tree.graph[idx].kind, NodeKind::Block) {
            check_sequence(tree, idx, &mut diags);
        }
        check_condition(tree, idx, &mut diags);
    }
    diags
}

// ─── Rules ───────────────────────────────────────────────────────────────

/// One statement sequence: flag code after a `return`/`break` and variable
/// names defined twice in the same block.
fn check_sequence(tree: &SyntaxTree, parent: NodeIndex, diags: &mut Vec<Diagnostic>) {
    let mut terminated_by: Option<&'static str> = None;
    let mut seen_names: HashSet<&str> = HashSet::new();

    for &child in tree.children(parent) {
        let node = &tree.graph[child];
        if !node.kind.is_statement() {
            continue;
        }

        if let Some(kw) = terminated_by {
            diags.push(Diagnostic {
                node_id: node.id,
                message: format!(
                    "Statement after `{kw}` never executes — move it above or remove it."
                ),
                severity: Severity::Warning,
                rule: "unreachable-code",
            });
        }

        match &node.kind {
            NodeKind::Return { .. } => terminated_by = Some("return"),
            NodeKind::Break => terminated_by = Some("break"),
            NodeKind::VariableDefinition { name, .. } => {
                if !seen_names.insert(name.as_str()) {
                    diags.push(Diagnostic {
                        node_id: node.id,
                        message: format!("Variable `{name}` is already defined in this block."),
                        severity: Severity::Warning,
                        rule: "duplicate-variable",
                    });
                }
            }
            _ => {}
        }
    }
}

/// Info on an if/else whose condition is still the empty shell.
fn check_condition(tree: &SyntaxTree, idx: NodeIndex, diags: &mut Vec<Diagnostic>) {
    let node = &tree.graph[idx];
    if let NodeKind::IfElse { condition } = &node.kind
        && condition.trim().is_empty()
    {
        diags.push(Diagnostic {
            node_id: node.id,
            message: "If statement has no condition yet.".to_string(),
            severity: Severity::Info,
            rule: "empty-condition",
        });
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    #[test]
    fn unreachable_after_return() {
        let tree = parse_program("if (x) {\n    return 0;\n    a = b;\n}\n").unwrap();
        let diags = validate_tree(&tree);
        assert!(
            diags.iter().any(|d| d.rule == "unreachable-code"),
            "expected unreachable-code diagnostic"
        );
    }

    #[test]
    fn unreachable_after_break_at_top_level() {
        let tree = parse_program("break;\na = b;\n").unwrap();
        let diags = validate_tree(&tree);
        assert!(diags.iter().any(|d| d.rule == "unreachable-code"));
    }

    #[test]
    fn duplicate_variable_in_block() {
        let tree = parse_program("int i = 0;\nint i = 1;\n").unwrap();
        let diags = validate_tree(&tree);
        assert!(diags.iter().any(|d| d.rule == "duplicate-variable"));
    }

    #[test]
    fn same_name_in_different_blocks_is_fine() {
        let input = "if (x) {\n    int i = 0;\n} else {\n    int i = 1;\n}\n";
        let tree = parse_program(input).unwrap();
        let diags = validate_tree(&tree);
        assert!(!diags.iter().any(|d| d.rule == "duplicate-variable"));
    }

    #[test]
    fn empty_condition_reported() {
        let mut tree = SyntaxTree::new();
        let idx = tree.add_detached(crate::factory::create_if_else_statement());
        tree.append_child(tree.root, idx).unwrap();
        let diags = validate_tree(&tree);
        assert!(diags.iter().any(|d| d.rule == "empty-condition"));
    }

    #[test]
    fn clean_program_has_no_diags() {
        let tree = parse_program("int i = 0;\nif (i == 0) {\n    i = 1;\n}\nreturn i;\n").unwrap();
        let diags = validate_tree(&tree);
        assert!(diags.is_empty(), "clean program should have no diagnostics");
    }
}
