pub mod drop;
pub mod sync;

pub use drop::{DragState, DropManager, DropTarget};
pub use sync::{SyncEngine, TreeMutation};
