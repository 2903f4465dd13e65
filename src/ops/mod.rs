// ============================================================================
// OPS MODULE — pixel operations on whole rasters
// ============================================================================
//
//   adjustments.rs — per-pixel colour math (brightness, contrast, matrices)
//   filters.rs     — the filter chain and its Gaussian blur
//   transform.rs   — quarter-turn rotation and flips
//   crop.rs        — display-to-raster crop mapping and extraction
// ============================================================================

pub mod adjustments;
pub mod crop;
pub mod filters;
pub mod transform;

pub use crop::{CropRegion, PixelRect};
pub use filters::{FilterParam, FilterState};
pub use transform::TransformState;
