//! Per-node rendering metadata: bounding boxes, named regions, and sync
//! flags. Semantic content lives in [`crate::model`]; this module only
//! describes where a node sits on the canvas and whether that geometry is
//! still trustworthy. The core never computes layout — an external layout
//! pass reads `dimensions_synced` and writes fresh boxes back.

use crate::error::UnknownRegionError;
use crate::model::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Bounding box ────────────────────────────────────────────────────────

/// Axis-aligned rectangle with horizontal margins. Treated as a value:
/// replaced wholesale, never mutated field-by-field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub left_margin: f32,
    pub right_margin: f32,
}

impl BBox {
    pub const fn new(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        left_margin: f32,
        right_margin: f32,
    ) -> Self {
        Self {
            x,
            y,
            width,
            height,
            left_margin,
            right_margin,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// AABB overlap test against a raw rectangle.
    pub fn intersects_rect(&self, rx: f32, ry: f32, rw: f32, rh: f32) -> bool {
        self.x < rx + rw
            && self.x + self.width > rx
            && self.y < ry + rh
            && self.y + self.height > ry
    }

    /// Width including both margins — what a parent reserves for this node.
    pub fn outer_width(&self) -> f32 {
        self.left_margin + self.width + self.right_margin
    }
}

// ─── Regions ─────────────────────────────────────────────────────────────

/// Named sub-rectangles of a node's bounding box. A closed set: region
/// names coming in from the editor shell resolve through [`Region::from_name`]
/// and are validated against the node kind's allowed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Strip above a statement that accepts drops before it.
    DropZone,
    /// The statement's own rendered box.
    StatementBox,
    /// The condition header of an if/else.
    ConditionBox,
    /// The then-branch body area of an if/else.
    ThenBody,
    /// The else-branch body area of an if/else.
    ElseBody,
}

impl Region {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "drop-zone" => Some(Self::DropZone),
            "statement-box" => Some(Self::StatementBox),
            "condition-box" => Some(Self::ConditionBox),
            "then-body" => Some(Self::ThenBody),
            "else-body" => Some(Self::ElseBody),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DropZone => "drop-zone",
            Self::StatementBox => "statement-box",
            Self::ConditionBox => "condition-box",
            Self::ThenBody => "then-body",
            Self::ElseBody => "else-body",
        }
    }
}

/// The regions a node kind may carry. Simple statements get a drop zone
/// and their own box; if/else adds the condition header and branch bodies.
pub fn allowed_regions(kind: &NodeKind) -> &'static [Region] {
    use Region::*;
    match kind {
        NodeKind::Assignment { .. }
        | NodeKind::VariableDefinition { .. }
        | NodeKind::Return { .. }
        | NodeKind::Break => &[DropZone, StatementBox],
        NodeKind::IfElse { .. } => &[DropZone, StatementBox, ConditionBox, ThenBody, ElseBody],
        NodeKind::Block => &[DropZone],
        NodeKind::Root | NodeKind::Expression { .. } => &[],
    }
}

// ─── Display vs storage source ───────────────────────────────────────────

/// Visible line-break marker used in display-form source fragments.
pub const LINE_MARK: char = '↵';

/// Convert storage form (`\n`) to display form (`↵`).
pub fn display_source(s: &str) -> String {
    s.replace('\n', &LINE_MARK.to_string())
}

/// Convert display form (`↵`) back to storage form (`\n`).
pub fn storage_source(s: &str) -> String {
    s.replace(LINE_MARK, "\n")
}

// ─── View state ──────────────────────────────────────────────────────────

/// Rendering metadata owned exclusively by one AST node.
///
/// `source` holds the exact textual rendering the caller last set — either
/// storage form or '↵'-marked display form; both are preserved as-is and
/// converted only through [`display_source`]/[`storage_source`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewState {
    /// The node's own extent.
    pub b_box: BBox,

    /// Named sub-regions. Keys are already closed by [`Region`]; per-kind
    /// validity is checked on attach and on [`crate::model::SyntaxTree::set_region`].
    pub components: HashMap<Region, BBox>,

    /// Exact textual rendering of the node, terminator included.
    pub source: String,

    /// The statement text without its terminator.
    pub expression: String,

    /// Canonical statement string with the terminator stripped.
    pub full_expression: String,

    /// Layout offset applied by the external layout pass.
    pub offset: f32,

    /// False when geometry is stale relative to tree content.
    pub dimensions_synced: bool,

    /// Node excluded from the visible layout pass.
    pub hidden: bool,
}

impl ViewState {
    pub fn new(b_box: BBox) -> Self {
        Self {
            b_box,
            ..Self::default()
        }
    }

    pub fn component(&self, region: Region) -> Option<&BBox> {
        self.components.get(&region)
    }

    /// Check every region key against the allowed set for `kind`.
    pub fn validate_for(&self, kind: &NodeKind) -> Result<(), UnknownRegionError> {
        let allowed = allowed_regions(kind);
        for region in self.components.keys() {
            if !allowed.contains(region) {
                return Err(UnknownRegionError {
                    region: region.name().to_string(),
                    kind: kind.keyword(),
                });
            }
        }
        Ok(())
    }

    /// Refresh the derived expression views from the canonical statement
    /// string (terminator included, as produced by the emitter).
    pub fn sync_expressions(&mut self, canonical: &str) {
        let stripped = crate::emitter::strip_terminator(canonical);
        self.expression = stripped.to_string();
        self.full_expression = stripped.to_string();
    }
}
