//! Pagemark editor core.
//!
//! Annotation scene model, tool state machine, page store, bulk page
//! operations, and the flatten/export compositor.

pub mod annotation;
pub mod bulk;
pub mod compose;
pub mod geometry;
mod glyphs;
pub mod raster;
pub mod scene;
pub mod store;
pub mod tools;

pub use annotation::{AnnotationKind, ObjectId, ObjectRole, SceneObject};
pub use bulk::{apply_to_all, page_numbers, watermark, BulkError, NumberPosition};
pub use compose::{export, flatten_page, ExportArtifact, ExportError};
pub use geometry::{to_page_space, Color, DisplayBounds, Point, Rect};
pub use scene::{Scene, SceneError};
pub use store::{PageState, PageStore, StoreError};
pub use tools::{GestureOutcome, Tool, ToolEvent, ToolMachine, ToolSettings};
