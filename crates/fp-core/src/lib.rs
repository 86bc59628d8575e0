pub mod emitter;
pub mod error;
pub mod factory;
pub mod id;
pub mod model;
pub mod parser;
pub mod validate;
pub mod view;

pub use emitter::{emit_program, statement_string, strip_terminator};
pub use error::{
    CoreError, InvalidStructureError, ParseError, UnknownRegionError, UnsupportedKindError,
};
pub use id::NodeId;
pub use model::*;
pub use parser::{parse_program, set_statement_from_string};
pub use validate::{Diagnostic, Severity, validate_tree};
pub use view::{BBox, Region, ViewState, allowed_regions, display_source, storage_source};

// Re-export petgraph's index type so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
