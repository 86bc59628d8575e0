//! Error taxonomy for the AST core.
//!
//! Every failure surfaces to the caller synchronously; the core never
//! recovers by guessing, and a failed operation leaves prior state
//! untouched. The editor shell renders these — the core only supplies
//! the detail (offset, expected token, kind names).

use thiserror::Error;

/// Malformed source text. Carries the byte offset of the failure and the
/// token class the parser was expecting there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at offset {offset}: expected {expected}, found {found}")]
pub struct ParseError {
    pub offset: usize,
    pub expected: String,
    /// The offending input fragment, or `"end of input"`.
    pub found: String,
}

/// The factory was asked to construct a statement kind it does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported statement kind `{0}`")]
pub struct UnsupportedKindError(pub String);

/// A structural edit would violate the kind constraints of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid structure: {reason} ({parent} <- {child})")]
pub struct InvalidStructureError {
    pub parent: &'static str,
    pub child: &'static str,
    pub reason: &'static str,
}

/// A view-state region name that is not in the allowed set for the
/// node's kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("region `{region}` is not valid for {kind} nodes")]
pub struct UnknownRegionError {
    pub region: String,
    pub kind: &'static str,
}

/// Umbrella error for callers that drive the whole core (the sync engine).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    UnsupportedKind(#[from] UnsupportedKindError),
    #[error(transparent)]
    InvalidStructure(#[from] InvalidStructureError),
    #[error(transparent)]
    UnknownRegion(#[from] UnknownRegionError),
}
