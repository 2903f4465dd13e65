// ============================================================================
// COMPONENTS MODULE — editor state that outlives a single render
// ============================================================================
//
//   annotation.rs — brush / eraser strokes and their rasterization
//   history.rs    — snapshot undo/redo over the annotation layer
//   layers.rs     — layer list metadata
// ============================================================================

pub mod annotation;
pub mod history;
pub mod layers;

pub use annotation::{AnnotationLayer, Stroke, StrokeTool};
pub use history::HistoryManager;
pub use layers::{BlendMode, LayerInfo, LayerStack};
