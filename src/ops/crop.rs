// ============================================================================
// CROP — map a display-space rectangle onto the raster and cut it out
// ============================================================================

use image::{RgbaImage, imageops};

/// Crop rectangle in display (on-screen, pre-scale) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Crop rectangle in raster pixels, always inside the raster and non-empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// The centred half-size region proposed when crop mode opens.
    pub fn centered_half(width: f32, height: f32) -> Self {
        Self {
            x: width * 0.25,
            y: height * 0.25,
            width: width * 0.5,
            height: height * 0.5,
        }
    }

    /// Map into raster pixels using the raster/display size ratio, then
    /// clamp.  Each edge is at least `min_size` (or the whole raster edge
    /// when the raster is smaller than that) and at most the raster edge;
    /// the origin is pulled back so the rectangle fits.
    pub fn to_pixels(&self, display: (f32, f32), raster: (u32, u32), min_size: u32) -> PixelRect {
        let (rw, rh) = raster;
        let scale_x = if display.0 > 0.0 { rw as f32 / display.0 } else { 1.0 };
        let scale_y = if display.1 > 0.0 { rh as f32 / display.1 } else { 1.0 };

        let (x, width) = clamp_axis(self.x * scale_x, self.width * scale_x, rw, min_size);
        let (y, height) = clamp_axis(self.y * scale_y, self.height * scale_y, rh, min_size);
        PixelRect { x, y, width, height }
    }
}

fn clamp_axis(start: f32, len: f32, limit: u32, min_size: u32) -> (u32, u32) {
    let limit = limit.max(1);
    let floor = min_size.clamp(1, limit);
    let len = if len.is_finite() { len.round().max(0.0) as u32 } else { 0 };
    let len = len.clamp(floor, limit);
    let start = if start.is_finite() { start.round().max(0.0) as u32 } else { 0 };
    (start.min(limit - len), len)
}

/// Copy the pixels inside `rect` into a new image of exactly that size.
pub fn crop_raster(src: &RgbaImage, rect: PixelRect) -> RgbaImage {
    imageops::crop_imm(src, rect.x, rect.y, rect.width, rect.height).to_image()
}
