//! Bidirectional sync engine: syntax tree ↔ source text.
//!
//! The engine holds the authoritative tree and keeps the two surfaces
//! consistent:
//!
//! - **Canvas → Text**: committed canvas edits arrive as [`TreeMutation`]
//!   values; the tree is mutated in place and the text is re-emitted
//!   lazily on the next `current_text`/`flush_to_text`.
//! - **Text → Canvas**: a source-editor update arrives as a full document
//!   via `set_text`; the text is re-parsed into a fresh tree. Parse
//!   failures leave the previous tree and text untouched.
//!
//! Every mutation either applies completely — including dirty propagation
//! to the root — or fails without touching the tree.

use fp_core::NodeIndex;
use fp_core::emitter::{emit_program, statement_string};
use fp_core::error::CoreError;
use fp_core::id::NodeId;
use fp_core::model::{AstNode, SyntaxTree};
use fp_core::parser::{parse_program, set_statement_from_string};
use fp_core::validate::{Diagnostic, validate_tree};
use fp_core::view::{BBox, Region, ViewState};

/// The sync engine: authoritative tree plus the current text rendering.
pub struct SyncEngine {
    /// The current syntax tree (single source of truth).
    pub tree: SyntaxTree,

    /// The current text representation (kept in sync with the tree).
    pub text: String,

    /// Set when the tree changed and the text needs a re-emit.
    text_dirty: bool,
}

impl SyncEngine {
    /// Create an engine from program source text. The stored text is the
    /// canonical re-emission, so formatting is normalized up front.
    pub fn from_text(text: &str) -> Result<Self, CoreError> {
        let tree = parse_program(text)?;
        let canonical = emit_program(&tree);
        Ok(Self {
            tree,
            text: canonical,
            text_dirty: false,
        })
    }

    /// Create an engine holding an empty program.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: SyntaxTree::new(),
            text: String::new(),
            text_dirty: false,
        }
    }

    // ─── Canvas → Text direction ─────────────────────────────────────────

    /// Apply one committed edit. Structure and parse errors surface
    /// synchronously and leave the tree as it was.
    pub fn apply_mutation(&mut self, mutation: TreeMutation) -> Result<(), CoreError> {
        match mutation {
            TreeMutation::SetStatement { id, source } => {
                let Some(idx) = self.tree.index_of(id) else {
                    log::warn!("set-statement for unknown node {id}");
                    return Ok(());
                };
                set_statement_from_string(&mut self.tree, idx, &source)?;
                self.refresh_view_text(idx);
                self.text_dirty = true;
            }
            TreeMutation::InsertStatement {
                parent,
                index,
                node,
            } => {
                let parent_idx = self.tree.index_of(parent).unwrap_or(self.tree.root);
                let idx = self.tree.add_detached(*node);
                if let Err(e) = self.tree.insert_child(parent_idx, index, idx) {
                    self.tree.delete_subtree(idx);
                    return Err(e.into());
                }
                self.text_dirty = true;
            }
            TreeMutation::RemoveStatement { id } => {
                if let Some(idx) = self.tree.index_of(id) {
                    self.tree.delete_subtree(idx);
                    self.text_dirty = true;
                }
            }
            TreeMutation::MoveStatement {
                id,
                new_parent,
                index,
            } => {
                let (Some(idx), Some(target_idx)) =
                    (self.tree.index_of(id), self.tree.index_of(new_parent))
                else {
                    log::warn!("move for unknown node {id} or parent {new_parent}");
                    return Ok(());
                };
                self.move_statement(idx, target_idx, index)?;
                self.text_dirty = true;
            }
            TreeMutation::AttachViewState { id, view } => {
                if let Some(idx) = self.tree.index_of(id) {
                    self.tree.attach_view_state(idx, *view)?;
                }
            }
            TreeMutation::SetRegion { id, region, b_box } => {
                if let Some(idx) = self.tree.index_of(id) {
                    self.tree.set_region(idx, region, b_box)?;
                }
            }
            TreeMutation::MarkDirty { id } => {
                if let Some(idx) = self.tree.index_of(id) {
                    self.tree.mark_dirty(idx);
                }
            }
            TreeMutation::SetHidden { id, hidden } => {
                if let Some(idx) = self.tree.index_of(id)
                    && let Some(node) = self.tree.get_mut(idx)
                {
                    node.view.get_or_insert_with(ViewState::default).hidden = hidden;
                }
            }
        }
        Ok(())
    }

    /// Detach + re-insert as one observable step: when the insertion is
    /// refused the node goes back to its old position.
    fn move_statement(
        &mut self,
        idx: NodeIndex,
        target: NodeIndex,
        index: usize,
    ) -> Result<(), CoreError> {
        let Some(old_parent) = self.tree.parent(idx) else {
            self.tree.insert_child(target, index, idx)?;
            return Ok(());
        };
        let old_index = self
            .tree
            .children(old_parent)
            .iter()
            .position(|&c| c == idx)
            .unwrap_or(0);

        self.tree.remove_child(old_parent, idx)?;
        if let Err(e) = self.tree.insert_child(target, index, idx) {
            let _ = self.tree.insert_child(old_parent, old_index, idx);
            return Err(e.into());
        }
        Ok(())
    }

    /// After a statement re-parse, refresh the view-state text fields so
    /// `full_expression` stays the canonical string minus its terminator.
    fn refresh_view_text(&mut self, idx: NodeIndex) {
        let canonical = statement_string(&self.tree, idx);
        if let Some(node) = self.tree.get_mut(idx)
            && let Some(view) = node.view.as_mut()
        {
            view.source = canonical.clone();
            view.sync_expressions(&canonical);
        }
    }

    /// Flush: re-emit the text from the current tree state. Called after a
    /// batch of mutations (e.g. at the end of a drag gesture).
    pub fn flush_to_text(&mut self) {
        if self.text_dirty {
            self.text = emit_program(&self.tree);
            self.text_dirty = false;
        }
    }

    // ─── Text → Canvas direction ─────────────────────────────────────────

    /// Replace the entire text and re-parse into a fresh tree.
    /// Used when the text editor sends a full document update.
    pub fn set_text(&mut self, new_text: &str) -> Result<(), CoreError> {
        let new_tree = parse_program(new_text)?;
        self.tree = new_tree;
        self.text = new_text.to_string();
        self.text_dirty = false;
        Ok(())
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Get current text (synced).
    pub fn current_text(&mut self) -> &str {
        self.flush_to_text();
        &self.text
    }

    /// Run the structural rules over the current tree.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        validate_tree(&self.tree)
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// One committed edit applied to the tree.
#[derive(Debug, Clone)]
pub enum TreeMutation {
    /// Re-parse a node's statement from a source fragment.
    SetStatement { id: NodeId, source: String },
    /// Insert a detached node under `parent` (index clamped).
    InsertStatement {
        parent: NodeId,
        index: usize,
        node: Box<AstNode>,
    },
    /// Delete a statement and its subtree.
    RemoveStatement { id: NodeId },
    /// Re-home a statement under a new parent. Issued by the drop manager
    /// when a drag gesture commits.
    MoveStatement {
        id: NodeId,
        new_parent: NodeId,
        index: usize,
    },
    /// Replace a node's view state wholesale.
    AttachViewState { id: NodeId, view: Box<ViewState> },
    /// Set one named region box on a node's view state.
    SetRegion {
        id: NodeId,
        region: Region,
        b_box: BBox,
    },
    /// Flag a node's geometry (and its ancestors') as stale.
    MarkDirty { id: NodeId },
    /// Toggle a node's visibility in the layout pass.
    SetHidden { id: NodeId, hidden: bool },
}
