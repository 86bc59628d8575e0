//! Integration tests: bidirectional sync engine (fp-editor ↔ fp-core).
//!
//! Round-trips between text edits and tree mutations, exercising the
//! cross-crate boundary.

use fp_core::id::NodeId;
use fp_core::model::NodeKind;
use fp_editor::sync::{SyncEngine, TreeMutation};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ─── Text → Tree ─────────────────────────────────────────────────────────

#[test]
fn text_to_tree_builds_statements() {
    init_logging();
    let input = include_str!("fixtures/branching.fp");
    let engine = SyncEngine::from_text(input).unwrap();

    let children = engine.tree.children(engine.tree.root);
    assert_eq!(children.len(), 4);
    assert!(matches!(
        engine.tree.graph[children[0]].kind,
        NodeKind::VariableDefinition { .. }
    ));
    assert!(matches!(
        engine.tree.graph[children[2]].kind,
        NodeKind::IfElse { .. }
    ));
}

#[test]
fn fixture_text_is_already_canonical() {
    init_logging();
    let input = include_str!("fixtures/branching.fp");
    let mut engine = SyncEngine::from_text(input).unwrap();
    assert_eq!(engine.current_text(), input);
}

// ─── Tree → Text ─────────────────────────────────────────────────────────

#[test]
fn statement_edit_reflects_in_text() {
    init_logging();
    let input = include_str!("fixtures/branching.fp");
    let mut engine = SyncEngine::from_text(input).unwrap();

    let limit_idx = engine.tree.children(engine.tree.root)[1];
    let limit_id = engine.tree.graph[limit_idx].id;
    engine
        .apply_mutation(TreeMutation::SetStatement {
            id: limit_id,
            source: "int limit = 5".into(),
        })
        .unwrap();

    assert!(engine.current_text().contains("int limit = 5;\n"));
    assert!(!engine.current_text().contains("int limit = 3"));
}

#[test]
fn insert_and_remove_reflect_in_text() {
    init_logging();
    let mut engine = SyncEngine::from_text("a = b;\n").unwrap();

    engine
        .apply_mutation(TreeMutation::InsertStatement {
            parent: NodeId::intern("root"),
            index: 1,
            node: Box::new(fp_core::factory::defaults::create_break_statement()),
        })
        .unwrap();
    assert_eq!(engine.current_text(), "a = b;\nbreak;\n");

    let brk_idx = engine.tree.children(engine.tree.root)[1];
    let brk_id = engine.tree.graph[brk_idx].id;
    engine
        .apply_mutation(TreeMutation::RemoveStatement { id: brk_id })
        .unwrap();
    assert_eq!(engine.current_text(), "a = b;\n");
}

// ─── Full bidirectional round-trip ───────────────────────────────────────

#[test]
fn bidi_roundtrip_edit_and_reparse() {
    init_logging();
    let input = include_str!("fixtures/branching.fp");
    let mut engine = SyncEngine::from_text(input).unwrap();

    let first = engine.tree.children(engine.tree.root)[0];
    let first_id = engine.tree.graph[first].id;
    engine
        .apply_mutation(TreeMutation::SetStatement {
            id: first_id,
            source: "int attempts = 10".into(),
        })
        .unwrap();
    let text_after = engine.current_text().to_string();

    // Simulate the text editor receiving the update and sending it back.
    let engine2 = SyncEngine::from_text(&text_after).unwrap();
    let first2 = engine2.tree.children(engine2.tree.root)[0];
    match &engine2.tree.graph[first2].kind {
        NodeKind::VariableDefinition { name, value, .. } => {
            assert_eq!(name, "attempts");
            assert_eq!(value.as_deref(), Some("10"));
        }
        other => panic!("expected VariableDefinition, got {other:?}"),
    }
}

#[test]
fn set_text_then_mutate_then_reparse() {
    init_logging();
    let mut engine = SyncEngine::new();
    engine.set_text("int i = 0;\n").unwrap();

    let idx = engine.tree.children(engine.tree.root)[0];
    let id = engine.tree.graph[idx].id;
    engine
        .apply_mutation(TreeMutation::SetStatement {
            id,
            source: "int i = 42".into(),
        })
        .unwrap();

    let text = engine.current_text().to_string();
    assert_eq!(text, "int i = 42;\n");

    let engine2 = SyncEngine::from_text(&text).unwrap();
    assert_eq!(engine2.tree.children(engine2.tree.root).len(), 1);
}

// ─── Validity reporting ──────────────────────────────────────────────────

#[test]
fn diagnostics_follow_edits() {
    init_logging();
    let mut engine = SyncEngine::from_text("int i = 0;\nreturn i;\n").unwrap();
    assert!(engine.diagnostics().is_empty());

    engine
        .apply_mutation(TreeMutation::InsertStatement {
            parent: NodeId::intern("root"),
            index: 99,
            node: Box::new(fp_core::factory::defaults::create_assignment_statement()),
        })
        .unwrap();

    let diags = engine.diagnostics();
    assert!(
        diags.iter().any(|d| d.rule == "unreachable-code"),
        "statement inserted after return must be flagged"
    );
}
