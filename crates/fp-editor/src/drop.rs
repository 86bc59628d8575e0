//! Drag-and-drop boundary between pointer gestures and the tree.
//!
//! The manager is an explicitly injected collaborator: the shell
//! constructs one and passes it to whatever component needs it — it is
//! never ambient state. A gesture is pending state inside the manager
//! only; the tree sees either one committed `MoveStatement` on drop or
//! nothing at all on cancel.

use crate::sync::{SyncEngine, TreeMutation};
use fp_core::NodeIndex;
use fp_core::error::{CoreError, InvalidStructureError};
use fp_core::id::NodeId;
use fp_core::model::{NodeKind, SyntaxTree};
use fp_core::view::Region;

/// The statement being dragged and where it came from.
#[derive(Debug, Clone, Copy)]
pub struct DragState {
    pub node: NodeId,
    pub from_parent: NodeId,
    pub from_index: usize,
}

/// Where a drop would land: before `index` under `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub parent: NodeId,
    pub index: usize,
}

/// Tracks at most one pending drag gesture.
#[derive(Debug, Default)]
pub struct DropManager {
    drag: Option<DragState>,
}

impl DropManager {
    #[must_use]
    pub fn new() -> Self {
        Self { drag: None }
    }

    pub fn dragging(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Begin a gesture on an attached statement. Records where the node
    /// came from; the tree is not touched.
    pub fn start_drag(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
    ) -> Result<(), InvalidStructureError> {
        let not_draggable = |reason: &'static str| InvalidStructureError {
            parent: "root",
            child: tree
                .index_of(id)
                .and_then(|i| tree.get(i))
                .map(|n| n.kind.keyword())
                .unwrap_or("unknown"),
            reason,
        };

        let idx = tree
            .index_of(id)
            .ok_or_else(|| not_draggable("no such node"))?;
        let parent_idx = tree
            .parent(idx)
            .ok_or_else(|| not_draggable("only attached statements can be dragged"))?;
        let from_index = tree
            .children(parent_idx)
            .iter()
            .position(|&c| c == idx)
            .unwrap_or(0);

        log::debug!("drag start {id}");
        self.drag = Some(DragState {
            node: id,
            from_parent: tree.graph[parent_idx].id,
            from_index,
        });
        Ok(())
    }

    /// Would the dragged node be accepted under `parent`? False when no
    /// gesture is pending, when kinds don't fit, or when the drop would
    /// put a node inside its own subtree.
    pub fn can_drop(&self, tree: &SyntaxTree, parent: NodeId) -> bool {
        let Some(state) = self.drag else {
            return false;
        };
        let (Some(node_idx), Some(parent_idx)) =
            (tree.index_of(state.node), tree.index_of(parent))
        else {
            return false;
        };
        tree.can_adopt(parent_idx, node_idx).is_ok()
    }

    /// Resolve a pointer position to a drop target using the view-state
    /// drop zones. Walks children in reverse order so the topmost zone
    /// wins. Hitting a statement's zone means "insert before it"; hitting
    /// a block's zone means "append inside it".
    pub fn drop_target_at(&self, tree: &SyntaxTree, x: f32, y: f32) -> Option<DropTarget> {
        self.drag?;
        let hit = self.hit_drop_zone(tree, tree.root, x, y)?;
        let node = &tree.graph[hit];
        let target = if matches!(node.kind, NodeKind::Block) {
            DropTarget {
                parent: node.id,
                index: tree.children(hit).len(),
            }
        } else {
            let parent_idx = tree.parent(hit)?;
            let index = tree
                .children(parent_idx)
                .iter()
                .position(|&c| c == hit)
                .unwrap_or(0);
            DropTarget {
                parent: tree.graph[parent_idx].id,
                index,
            }
        };
        self.can_drop(tree, target.parent).then_some(target)
    }

    fn hit_drop_zone(
        &self,
        tree: &SyntaxTree,
        idx: NodeIndex,
        x: f32,
        y: f32,
    ) -> Option<NodeIndex> {
        // Check children in reverse (topmost first)
        for &child in tree.children(idx).iter().rev() {
            if let Some(hit) = self.hit_drop_zone(tree, child, x, y) {
                return Some(hit);
            }
        }

        let node = tree.get(idx)?;
        if let Some(view) = node.view.as_ref()
            && !view.hidden
            && let Some(zone) = view.component(Region::DropZone)
            && zone.contains(x, y)
        {
            return Some(idx);
        }
        None
    }

    /// Commit the gesture: exactly one `MoveStatement` through the engine.
    /// The pending state is cleared whether or not the move is accepted.
    pub fn drop_at(
        &mut self,
        engine: &mut SyncEngine,
        target: DropTarget,
    ) -> Result<(), CoreError> {
        let Some(state) = self.drag.take() else {
            log::warn!("drop without a pending drag");
            return Ok(());
        };
        log::debug!("drop {} under {} at {}", state.node, target.parent, target.index);
        engine.apply_mutation(TreeMutation::MoveStatement {
            id: state.node,
            new_parent: target.parent,
            index: target.index,
        })
    }

    /// Abort the gesture. The tree was never touched.
    pub fn cancel(&mut self) {
        if self.drag.take().is_some() {
            log::debug!("drag cancelled");
        }
    }
}
