//! Core AST data model for FlowPad programs.
//!
//! The program is a tree of typed statement nodes stored in a
//! `StableDiGraph` where edges run parent→child. Ownership is strictly
//! downward: a node has at most one parent, and the child→parent lookup
//! walks the incoming edge — a non-owning index relation used only for
//! upward dirty propagation. Sibling order is semantic (statements execute
//! in sequence) and is kept in an explicit per-parent order vector rather
//! than relying on graph adjacency iteration.

use crate::error::{InvalidStructureError, UnknownRegionError};
use crate::id::NodeId;
use crate::view::{BBox, Region, ViewState};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The closed set of node kinds in the syntax tree.
///
/// Statement kinds carry their operand text directly; `IfElse` owns
/// `Block` children (then-branch, optional else-branch), and simple
/// statements own `Expression` children mirroring their operands so the
/// canvas can target them individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Root of the program — holds the top-level statement sequence.
    Root,

    /// A braced statement sequence (if/else branch body).
    Block,

    /// `target = value;`
    Assignment { target: String, value: String },

    /// `type name = value;` — `value` is optional (`int i;` declares only).
    VariableDefinition {
        type_name: String,
        name: String,
        value: Option<String>,
    },

    /// `return value?;`
    Return { value: Option<String> },

    /// `break;`
    Break,

    /// `if (condition) { ... } else { ... }` — branches are Block children.
    IfElse { condition: String },

    /// An operand expression, stored as its source text.
    Expression { text: String },
}

impl NodeKind {
    /// Stable keyword for this kind — used in error messages, factory
    /// dispatch, and region validation.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Block => "block",
            Self::Assignment { .. } => "assignment",
            Self::VariableDefinition { .. } => "variable-definition",
            Self::Return { .. } => "return",
            Self::Break => "break",
            Self::IfElse { .. } => "if-else",
            Self::Expression { .. } => "expression",
        }
    }

    /// Prefix for auto-generated node ids.
    pub(crate) fn id_prefix(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Block => "block",
            Self::Assignment { .. } => "assignment",
            Self::VariableDefinition { .. } => "var_def",
            Self::Return { .. } => "return",
            Self::Break => "break",
            Self::IfElse { .. } => "if_else",
            Self::Expression { .. } => "expr",
        }
    }

    /// True for the executable statement kinds.
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Self::Assignment { .. }
                | Self::VariableDefinition { .. }
                | Self::Return { .. }
                | Self::Break
                | Self::IfElse { .. }
        )
    }

    /// True for statements that alter control flow.
    pub fn is_control_flow(&self) -> bool {
        matches!(self, Self::Return { .. } | Self::Break | Self::IfElse { .. })
    }
}

/// Which child kinds a parent kind accepts.
pub fn accepts_child(parent: &NodeKind, child: &NodeKind) -> bool {
    match parent {
        NodeKind::Root => matches!(child, NodeKind::Block) || child.is_statement(),
        NodeKind::Block => child.is_statement(),
        NodeKind::IfElse { .. } => matches!(child, NodeKind::Block),
        NodeKind::Assignment { .. }
        | NodeKind::VariableDefinition { .. }
        | NodeKind::Return { .. } => matches!(child, NodeKind::Expression { .. }),
        NodeKind::Break => false,
        NodeKind::Expression { .. } => matches!(child, NodeKind::Expression { .. }),
    }
}

// ─── AST node ────────────────────────────────────────────────────────────

/// A single node in the syntax tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    /// Interned identifier (auto-generated per kind, e.g. `assignment_3`).
    pub id: NodeId,

    /// Kind discriminant plus operand text.
    pub kind: NodeKind,

    /// `//` comment lines that preceded this statement in the source.
    /// Preserved across parse/emit round-trips.
    pub comments: Vec<String>,

    /// Rendering metadata, attached by the editor shell after construction.
    pub view: Option<ViewState>,
}

impl AstNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::fresh(kind.id_prefix()),
            kind,
            comments: Vec::new(),
            view: None,
        }
    }

    pub fn with_id(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            comments: Vec::new(),
            view: None,
        }
    }
}

// ─── Syntax tree ─────────────────────────────────────────────────────────

const UNKNOWN: &str = "unknown";

/// The complete program tree.
///
/// Nodes live in the graph arena whether attached or detached; a detached
/// node simply has no incoming edge. The structural-edit API refuses to
/// give a node two parents, so the tree can never silently become a DAG.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    /// The underlying directed graph (edges parent→child).
    pub graph: StableDiGraph<AstNode, ()>,

    /// The root node index.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    id_index: HashMap<NodeId, NodeIndex>,

    /// Authoritative sibling order per parent.
    order: HashMap<NodeIndex, SmallVec<[NodeIndex; 4]>>,
}

impl SyntaxTree {
    /// Create an empty tree holding only the root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_node = AstNode::with_id(NodeId::intern("root"), NodeKind::Root);
        let root = graph.add_node(root_node);

        let mut id_index = HashMap::new();
        id_index.insert(NodeId::intern("root"), root);

        Self {
            graph,
            root,
            id_index,
            order: HashMap::new(),
        }
    }

    /// Bring a factory-made node into the arena without attaching it.
    pub fn add_detached(&mut self, node: AstNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        idx
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&AstNode> {
        self.graph.node_weight(idx)
    }

    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut AstNode> {
        self.graph.node_weight_mut(idx)
    }

    /// Look up a node by its id.
    pub fn get_by_id(&self, id: NodeId) -> Option<&AstNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Get the index for a NodeId.
    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    /// Children of a node in statement order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.order.get(&idx).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The parent of a node, if it is attached.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Check if `ancestor` sits on the parent chain above `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeIndex, descendant: NodeIndex) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = self.parent(descendant);
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            current = self.parent(idx);
        }
        false
    }

    fn kind_keyword(&self, idx: NodeIndex) -> &'static str {
        self.graph
            .node_weight(idx)
            .map(|n| n.kind.keyword())
            .unwrap_or(UNKNOWN)
    }

    /// Check kind constraints for hanging `child` under `parent`, ignoring
    /// whatever parent the child currently has. Used both by insertion and
    /// by the drop manager's hover feedback.
    pub fn can_adopt(
        &self,
        parent: NodeIndex,
        child: NodeIndex,
    ) -> Result<(), InvalidStructureError> {
        let err = |reason: &'static str| InvalidStructureError {
            parent: self.kind_keyword(parent),
            child: self.kind_keyword(child),
            reason,
        };

        let parent_node = self.graph.node_weight(parent).ok_or(err("no such parent"))?;
        let child_node = self.graph.node_weight(child).ok_or(err("no such child"))?;

        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(err("insertion would create a cycle"));
        }
        if !accepts_child(&parent_node.kind, &child_node.kind) {
            return Err(err("parent kind does not accept this child kind"));
        }
        if matches!(parent_node.kind, NodeKind::IfElse { .. }) {
            let blocks = self
                .children(parent)
                .iter()
                .filter(|&&c| matches!(self.graph[c].kind, NodeKind::Block))
                .count();
            if blocks >= 2 {
                return Err(err("if/else already has both branches"));
            }
        }
        Ok(())
    }

    /// Validate an insertion without performing it. The child must be
    /// detached — a node never gets a second parent.
    pub fn can_insert(
        &self,
        parent: NodeIndex,
        child: NodeIndex,
    ) -> Result<(), InvalidStructureError> {
        if self.graph.node_weight(child).is_some() && self.parent(child).is_some() {
            return Err(InvalidStructureError {
                parent: self.kind_keyword(parent),
                child: self.kind_keyword(child),
                reason: "child already has a parent",
            });
        }
        self.can_adopt(parent, child)
    }

    /// Insert a detached node as a child of `parent`. The index is clamped
    /// to `[0, len]`; the clamped position is returned. Invalidates
    /// `dimensions_synced` on the parent and all its ancestors.
    pub fn insert_child(
        &mut self,
        parent: NodeIndex,
        index: usize,
        child: NodeIndex,
    ) -> Result<usize, InvalidStructureError> {
        self.can_insert(parent, child)?;
        let len = self.children(parent).len();
        let index = index.min(len);
        self.graph.add_edge(parent, child, ());
        self.order.entry(parent).or_default().insert(index, child);
        log::debug!(
            "insert {} under {} at {index}",
            self.graph[child].id,
            self.graph[parent].id
        );
        self.mark_dirty(parent);
        Ok(index)
    }

    /// Insert at the end of the child sequence.
    pub fn append_child(
        &mut self,
        parent: NodeIndex,
        child: NodeIndex,
    ) -> Result<usize, InvalidStructureError> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    /// Detach `child` from `parent`, clearing the parent link so the node
    /// can be re-inserted elsewhere. The subtree stays alive in the arena.
    pub fn remove_child(
        &mut self,
        parent: NodeIndex,
        child: NodeIndex,
    ) -> Result<(), InvalidStructureError> {
        let edge = self
            .graph
            .find_edge(parent, child)
            .ok_or(InvalidStructureError {
                parent: self.kind_keyword(parent),
                child: self.kind_keyword(child),
                reason: "node is not a child of this parent",
            })?;
        self.graph.remove_edge(edge);
        if let Some(order) = self.order.get_mut(&parent) {
            order.retain(|&c| c != child);
        }
        self.mark_dirty(parent);
        Ok(())
    }

    /// Destroy a subtree, detaching it first when still attached.
    pub fn delete_subtree(&mut self, idx: NodeIndex) {
        if let Some(parent) = self.parent(idx) {
            if let Some(edge) = self.graph.find_edge(parent, idx) {
                self.graph.remove_edge(edge);
            }
            if let Some(order) = self.order.get_mut(&parent) {
                order.retain(|&c| c != idx);
            }
            self.mark_dirty(parent);
        }
        self.delete_recursive(idx);
    }

    fn delete_recursive(&mut self, idx: NodeIndex) {
        let children: Vec<NodeIndex> = self.children(idx).to_vec();
        for child in children {
            self.delete_recursive(child);
        }
        self.order.remove(&idx);
        if let Some(node) = self.graph.remove_node(idx) {
            self.id_index.remove(&node.id);
        }
    }

    // ─── View state ──────────────────────────────────────────────────────

    /// Replace the node's view state wholesale (last-write-wins). Region
    /// keys are validated against the node kind's allowed set.
    pub fn attach_view_state(
        &mut self,
        idx: NodeIndex,
        view: ViewState,
    ) -> Result<(), UnknownRegionError> {
        let Some(node) = self.graph.node_weight_mut(idx) else {
            return Ok(());
        };
        view.validate_for(&node.kind)?;
        node.view = Some(view);
        Ok(())
    }

    /// Set one named region box, creating a default view state if the node
    /// has none yet.
    pub fn set_region(
        &mut self,
        idx: NodeIndex,
        region: Region,
        b_box: BBox,
    ) -> Result<(), UnknownRegionError> {
        let Some(node) = self.graph.node_weight_mut(idx) else {
            return Ok(());
        };
        if !crate::view::allowed_regions(&node.kind).contains(&region) {
            return Err(UnknownRegionError {
                region: region.name().to_string(),
                kind: node.kind.keyword(),
            });
        }
        node.view
            .get_or_insert_with(ViewState::default)
            .components
            .insert(region, b_box);
        Ok(())
    }

    /// Flag the node's geometry as stale and propagate upward: every
    /// ancestor with a view state loses `dimensions_synced`, all the way
    /// to the root, before this call returns.
    pub fn mark_dirty(&mut self, idx: NodeIndex) {
        let mut current = Some(idx);
        while let Some(i) = current {
            if let Some(node) = self.graph.node_weight_mut(i)
                && let Some(view) = node.view.as_mut()
            {
                view.dimensions_synced = false;
            }
            current = self.parent(i);
        }
    }
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(target: &str, value: &str) -> AstNode {
        AstNode::new(NodeKind::Assignment {
            target: target.into(),
            value: value.into(),
        })
    }

    #[test]
    fn insert_keeps_statement_order() {
        let mut tree = SyntaxTree::new();
        let a = tree.add_detached(assignment("a", "1"));
        let b = tree.add_detached(assignment("b", "2"));
        let c = tree.add_detached(assignment("c", "3"));

        tree.append_child(tree.root, a).unwrap();
        tree.append_child(tree.root, c).unwrap();
        tree.insert_child(tree.root, 1, b).unwrap();

        assert_eq!(tree.children(tree.root), &[a, b, c]);
    }

    #[test]
    fn insert_index_is_clamped() {
        let mut tree = SyntaxTree::new();
        let a = tree.add_detached(assignment("a", "1"));
        let pos = tree.insert_child(tree.root, 99, a).unwrap();
        assert_eq!(pos, 0);
        assert_eq!(tree.children(tree.root), &[a]);
    }

    #[test]
    fn statement_under_expression_parent_is_rejected() {
        let mut tree = SyntaxTree::new();
        let ret = tree.add_detached(AstNode::new(NodeKind::Return { value: None }));
        tree.append_child(tree.root, ret).unwrap();

        let stmt = tree.add_detached(assignment("a", "b"));
        let err = tree.append_child(ret, stmt).unwrap_err();
        assert_eq!(err.parent, "return");
        assert_eq!(err.child, "assignment");
        assert_eq!(tree.children(ret).len(), 0, "children must be unchanged");
    }

    #[test]
    fn break_accepts_nothing() {
        let mut tree = SyntaxTree::new();
        let brk = tree.add_detached(AstNode::new(NodeKind::Break));
        tree.append_child(tree.root, brk).unwrap();

        let expr = tree.add_detached(AstNode::new(NodeKind::Expression { text: "x".into() }));
        assert!(tree.append_child(brk, expr).is_err());
    }

    #[test]
    fn if_else_accepts_at_most_two_blocks() {
        let mut tree = SyntaxTree::new();
        let ifelse = tree.add_detached(AstNode::new(NodeKind::IfElse {
            condition: "a == b".into(),
        }));
        tree.append_child(tree.root, ifelse).unwrap();

        let then_block = tree.add_detached(AstNode::new(NodeKind::Block));
        let else_block = tree.add_detached(AstNode::new(NodeKind::Block));
        let third = tree.add_detached(AstNode::new(NodeKind::Block));

        tree.append_child(ifelse, then_block).unwrap();
        tree.append_child(ifelse, else_block).unwrap();
        let err = tree.append_child(ifelse, third).unwrap_err();
        assert_eq!(err.reason, "if/else already has both branches");
    }

    #[test]
    fn node_never_has_two_parents() {
        let mut tree = SyntaxTree::new();
        let block = tree.add_detached(AstNode::new(NodeKind::Block));
        let ifelse = tree.add_detached(AstNode::new(NodeKind::IfElse {
            condition: "x".into(),
        }));
        tree.append_child(tree.root, ifelse).unwrap();
        tree.append_child(ifelse, block).unwrap();

        let stmt = tree.add_detached(assignment("a", "b"));
        tree.append_child(block, stmt).unwrap();

        // Attached elsewhere → refused until removed.
        let err = tree.append_child(tree.root, stmt).unwrap_err();
        assert_eq!(err.reason, "child already has a parent");

        // Remove, then re-insert elsewhere: exactly one parent at all times.
        tree.remove_child(block, stmt).unwrap();
        assert_eq!(tree.parent(stmt), None);
        tree.append_child(tree.root, stmt).unwrap();
        assert_eq!(tree.parent(stmt), Some(tree.root));
        assert!(!tree.children(block).contains(&stmt));
    }

    #[test]
    fn reattaching_own_ancestor_is_a_cycle() {
        let mut tree = SyntaxTree::new();
        let ifelse = tree.add_detached(AstNode::new(NodeKind::IfElse {
            condition: "x".into(),
        }));
        let block = tree.add_detached(AstNode::new(NodeKind::Block));
        tree.append_child(tree.root, ifelse).unwrap();
        tree.append_child(ifelse, block).unwrap();

        // Detach the if/else, then try to hang it under its own block.
        tree.remove_child(tree.root, ifelse).unwrap();
        let err = tree.append_child(block, ifelse).unwrap_err();
        assert_eq!(err.reason, "insertion would create a cycle");
    }

    #[test]
    fn dirty_propagates_to_root() {
        let mut tree = SyntaxTree::new();
        let ifelse = tree.add_detached(AstNode::new(NodeKind::IfElse {
            condition: "x".into(),
        }));
        let block = tree.add_detached(AstNode::new(NodeKind::Block));
        let stmt = tree.add_detached(assignment("a", "b"));
        tree.append_child(tree.root, ifelse).unwrap();
        tree.append_child(ifelse, block).unwrap();
        tree.append_child(block, stmt).unwrap();

        for idx in [tree.root, ifelse, block, stmt] {
            let mut vs = ViewState::default();
            vs.dimensions_synced = true;
            tree.graph[idx].view = Some(vs);
        }

        tree.mark_dirty(stmt);

        for idx in [tree.root, ifelse, block, stmt] {
            assert!(
                !tree.graph[idx].view.as_ref().unwrap().dimensions_synced,
                "every node on the chain must be dirty"
            );
        }
    }

    #[test]
    fn structural_edit_dirties_ancestors() {
        let mut tree = SyntaxTree::new();
        let block = tree.add_detached(AstNode::new(NodeKind::Block));
        let ifelse = tree.add_detached(AstNode::new(NodeKind::IfElse {
            condition: "x".into(),
        }));
        tree.append_child(tree.root, ifelse).unwrap();
        tree.append_child(ifelse, block).unwrap();

        let mut vs = ViewState::default();
        vs.dimensions_synced = true;
        tree.graph[ifelse].view = Some(vs.clone());
        tree.graph[block].view = Some(vs);

        let stmt = tree.add_detached(assignment("a", "b"));
        tree.append_child(block, stmt).unwrap();

        assert!(!tree.graph[block].view.as_ref().unwrap().dimensions_synced);
        assert!(!tree.graph[ifelse].view.as_ref().unwrap().dimensions_synced);
    }

    #[test]
    fn attach_view_state_validates_regions() {
        let mut tree = SyntaxTree::new();
        let brk = tree.add_detached(AstNode::new(NodeKind::Break));
        tree.append_child(tree.root, brk).unwrap();

        let mut vs = ViewState::new(BBox::new(145.0, 275.0, 120.0, 55.0, 0.0, 0.0));
        vs.components
            .insert(Region::DropZone, BBox::new(145.0, 275.0, 120.0, 25.0, 0.0, 0.0));
        tree.attach_view_state(brk, vs).unwrap();

        let mut bad = ViewState::default();
        bad.components.insert(Region::ElseBody, BBox::default());
        assert!(tree.attach_view_state(brk, bad).is_err());
        // Last valid attach survives the failed one.
        assert!(tree.graph[brk].view.is_some());
        assert!(
            tree.graph[brk]
                .view
                .as_ref()
                .unwrap()
                .components
                .contains_key(&Region::DropZone)
        );
    }

    #[test]
    fn set_region_checks_kind() {
        let mut tree = SyntaxTree::new();
        let stmt = tree.add_detached(assignment("a", "b"));
        tree.append_child(tree.root, stmt).unwrap();

        tree.set_region(stmt, Region::StatementBox, BBox::default())
            .unwrap();
        let err = tree
            .set_region(stmt, Region::ConditionBox, BBox::default())
            .unwrap_err();
        assert_eq!(err.kind, "assignment");
    }

    #[test]
    fn delete_subtree_drops_descendants() {
        let mut tree = SyntaxTree::new();
        let ifelse = tree.add_detached(AstNode::new(NodeKind::IfElse {
            condition: "x".into(),
        }));
        let block = tree.add_detached(AstNode::new(NodeKind::Block));
        let stmt = tree.add_detached(assignment("a", "b"));
        tree.append_child(tree.root, ifelse).unwrap();
        tree.append_child(ifelse, block).unwrap();
        tree.append_child(block, stmt).unwrap();

        let stmt_id = tree.graph[stmt].id;
        tree.delete_subtree(ifelse);

        assert_eq!(tree.children(tree.root).len(), 0);
        assert!(tree.get_by_id(stmt_id).is_none());
        assert!(tree.graph.node_weight(block).is_none());
    }
}
