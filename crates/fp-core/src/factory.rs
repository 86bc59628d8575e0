//! Statement factory: typed constructors, string-keyed dispatch, and kind
//! predicates.
//!
//! Constructors return detached shells — the minimal valid form of each
//! kind, ready for `set_statement_from_string`. The factory never attaches
//! view state; geometry is the editor shell's job. The [`defaults`] module
//! is the tool-palette companion: same kinds, pre-seeded with the canonical
//! fragment a freshly dropped statement shows.

use crate::error::UnsupportedKindError;
use crate::model::{AstNode, NodeKind};

pub fn create_assignment_statement() -> AstNode {
    AstNode::new(NodeKind::Assignment {
        target: String::new(),
        value: String::new(),
    })
}

pub fn create_variable_definition_statement() -> AstNode {
    AstNode::new(NodeKind::VariableDefinition {
        type_name: String::new(),
        name: String::new(),
        value: None,
    })
}

pub fn create_return_statement() -> AstNode {
    AstNode::new(NodeKind::Return { value: None })
}

/// A break statement is complete from birth — its canonical text is the
/// fixed keyword form.
pub fn create_break_statement() -> AstNode {
    AstNode::new(NodeKind::Break)
}

pub fn create_if_else_statement() -> AstNode {
    AstNode::new(NodeKind::IfElse {
        condition: String::new(),
    })
}

pub fn create_block() -> AstNode {
    AstNode::new(NodeKind::Block)
}

pub fn create_expression(text: impl Into<String>) -> AstNode {
    AstNode::new(NodeKind::Expression { text: text.into() })
}

/// String-keyed dispatch over the closed kind set. Unknown names fail —
/// the factory never guesses.
pub fn create(kind: &str) -> Result<AstNode, UnsupportedKindError> {
    match kind {
        "assignment" => Ok(create_assignment_statement()),
        "variable-definition" => Ok(create_variable_definition_statement()),
        "return" => Ok(create_return_statement()),
        "break" => Ok(create_break_statement()),
        "if-else" => Ok(create_if_else_statement()),
        "block" => Ok(create_block()),
        "expression" => Ok(create_expression("")),
        other => Err(UnsupportedKindError(other.to_string())),
    }
}

// ─── Kind predicates ─────────────────────────────────────────────────────

pub fn is_assignment(node: &AstNode) -> bool {
    matches!(node.kind, NodeKind::Assignment { .. })
}

pub fn is_variable_definition(node: &AstNode) -> bool {
    matches!(node.kind, NodeKind::VariableDefinition { .. })
}

pub fn is_return(node: &AstNode) -> bool {
    matches!(node.kind, NodeKind::Return { .. })
}

pub fn is_break(node: &AstNode) -> bool {
    matches!(node.kind, NodeKind::Break)
}

pub fn is_if_else(node: &AstNode) -> bool {
    matches!(node.kind, NodeKind::IfElse { .. })
}

pub fn is_block(node: &AstNode) -> bool {
    matches!(node.kind, NodeKind::Block)
}

pub fn is_expression(node: &AstNode) -> bool {
    matches!(node.kind, NodeKind::Expression { .. })
}

pub fn is_statement(node: &AstNode) -> bool {
    node.kind.is_statement()
}

/// Control-flow-only check used by palette filtering.
pub fn is_control_flow(node: &AstNode) -> bool {
    node.kind.is_control_flow()
}

// ─── Default factory ─────────────────────────────────────────────────────

/// Constructors seeded with the canonical fragments the tool palette drops
/// onto the canvas.
pub mod defaults {
    use super::*;

    pub fn create_assignment_statement() -> AstNode {
        AstNode::new(NodeKind::Assignment {
            target: "a".into(),
            value: "b".into(),
        })
    }

    pub fn create_variable_definition_statement() -> AstNode {
        AstNode::new(NodeKind::VariableDefinition {
            type_name: "int".into(),
            name: "i".into(),
            value: Some("0".into()),
        })
    }

    pub fn create_return_statement() -> AstNode {
        AstNode::new(NodeKind::Return {
            value: Some("0".into()),
        })
    }

    pub fn create_break_statement() -> AstNode {
        super::create_break_statement()
    }

    pub fn create_if_else_statement() -> AstNode {
        AstNode::new(NodeKind::IfElse {
            condition: "true".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::statement_string;
    use crate::model::SyntaxTree;

    #[test]
    fn create_dispatch_matches_typed_constructors() {
        for kind in [
            "assignment",
            "variable-definition",
            "return",
            "break",
            "if-else",
            "block",
            "expression",
        ] {
            let node = create(kind).expect("known kind must construct");
            if kind != "block" && kind != "expression" {
                assert!(is_statement(&node), "{kind} should be a statement");
            }
        }
    }

    #[test]
    fn unknown_kind_is_refused() {
        let err = create("goto").unwrap_err();
        assert_eq!(err.0, "goto");
    }

    #[test]
    fn break_shell_is_already_canonical() {
        let mut tree = SyntaxTree::new();
        let brk = tree.add_detached(create_break_statement());
        tree.append_child(tree.root, brk).unwrap();
        assert_eq!(statement_string(&tree, brk), "break;\n");
    }

    #[test]
    fn default_factory_seeds_canonical_fragments() {
        let mut tree = SyntaxTree::new();
        let a = tree.add_detached(defaults::create_assignment_statement());
        let v = tree.add_detached(defaults::create_variable_definition_statement());
        let r = tree.add_detached(defaults::create_return_statement());
        let i = tree.add_detached(defaults::create_if_else_statement());
        for idx in [a, v, r, i] {
            tree.append_child(tree.root, idx).unwrap();
        }
        assert_eq!(statement_string(&tree, a), "a = b;\n");
        assert_eq!(statement_string(&tree, v), "int i = 0;\n");
        assert_eq!(statement_string(&tree, r), "return 0;\n");
        assert_eq!(statement_string(&tree, i), "if (true) {\n}\n");
    }

    #[test]
    fn control_flow_predicate() {
        assert!(is_control_flow(&create_break_statement()));
        assert!(is_control_flow(&create_return_statement()));
        assert!(is_control_flow(&create_if_else_statement()));
        assert!(!is_control_flow(&create_assignment_statement()));
    }
}
