// ============================================================================
// CANVAS — immutable source raster + per-pixel compositing helpers
// ============================================================================

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::error::Result;

/// An immutable RGBA raster.  Cloning is cheap (shared pixel buffer); the
/// pixels are never modified once wrapped, a crop produces a new raster.
#[derive(Clone, Debug)]
pub struct RasterImage {
    pixels: Arc<RgbaImage>,
}

impl RasterImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels: Arc::new(pixels) }
    }

    /// Decode any format the `image` crate understands into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::new(img))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl From<RgbaImage> for RasterImage {
    fn from(pixels: RgbaImage) -> Self {
        Self::new(pixels)
    }
}

/// Paint `color` over `base` with the given coverage (0..1), straight alpha
/// source-over.
pub fn source_over(base: Rgba<u8>, color: [u8; 3], coverage: f32) -> Rgba<u8> {
    if coverage <= 0.0 {
        return base;
    }
    if coverage >= 1.0 {
        return Rgba([color[0], color[1], color[2], 255]);
    }

    let top_a = coverage;
    let base_a = base[3] as f32 / 255.0;
    let out_a = top_a + base_a * (1.0 - top_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mix = |top: u8, bot: u8| -> u8 {
        let v = (top as f32 * top_a + bot as f32 * base_a * (1.0 - top_a)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(color[0], base[0]),
        mix(color[1], base[1]),
        mix(color[2], base[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Destination-out: remove `coverage` of the existing pixel's alpha.
pub fn destination_out(base: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    if coverage <= 0.0 {
        return base;
    }
    if coverage >= 1.0 {
        return Rgba([base[0], base[1], base[2], 0]);
    }
    let a = base[3] as f32 * (1.0 - coverage);
    Rgba([base[0], base[1], base[2], a.round().clamp(0.0, 255.0) as u8])
}

/// Composite the image over opaque black, as a canvas without alpha would
/// display it.  Used before encoding to formats that carry no alpha channel.
pub fn flatten_over_black(src: &RgbaImage) -> image::RgbImage {
    let (w, h) = src.dimensions();
    let src_raw = src.as_raw();
    let mut dst_raw = vec![0u8; w as usize * h as usize * 3];
    if dst_raw.is_empty() {
        return image::RgbImage::new(w, h);
    }

    dst_raw
        .par_chunks_mut(w as usize * 3)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src_raw[y * w as usize * 4..(y + 1) * w as usize * 4];
            for x in 0..w as usize {
                let a = row_in[x * 4 + 3] as u32;
                for c in 0..3 {
                    row_out[x * 3 + c] = ((row_in[x * 4 + c] as u32 * a + 127) / 255) as u8;
                }
            }
        });

    image::RgbImage::from_raw(w, h, dst_raw).unwrap_or_else(|| image::RgbImage::new(w, h))
}
