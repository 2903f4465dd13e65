// ============================================================================
// ADJUSTMENT OPERATIONS — per-pixel colour functions used by the filter chain
// ============================================================================
//
// Each adjustment is a pure function of one pixel's straight-alpha RGB
// (0..255 floats).  They are chained by `apply_pixel_transform`, which runs
// rows in parallel via rayon.  Matrices follow the Filter Effects colour
// matrix definitions so results match what a browser canvas filter shows.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

/// 3×3 colour matrix applied to (r, g, b).
pub type ColorMatrix = [[f32; 3]; 3];

// ============================================================================
// HELPER: per-pixel transform
// ============================================================================

/// Apply a per-pixel transform to `src`, returning a new image.
/// `transform` receives (r, g, b, a) as f32 and returns (r, g, b, a) as f32;
/// results are rounded and clamped to 0..255.
pub fn apply_pixel_transform<F>(src: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let mut dst_raw = vec![0u8; w * h * 4];
    let stride = w * 4;

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let r = row_in[pi] as f32;
            let g = row_in[pi + 1] as f32;
            let b = row_in[pi + 2] as f32;
            let a = row_in[pi + 3] as f32;
            let (nr, ng, nb, na) = transform(r, g, b, a);
            row_out[pi]     = nr.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| src.clone())
}

// ============================================================================
// SCALAR ADJUSTMENTS
// ============================================================================

/// Linear brightness: `amount` 1.0 is identity, 0.0 is black.
pub fn brightness(r: f32, g: f32, b: f32, amount: f32) -> (f32, f32, f32) {
    (
        (r * amount).clamp(0.0, 255.0),
        (g * amount).clamp(0.0, 255.0),
        (b * amount).clamp(0.0, 255.0),
    )
}

/// Contrast around mid-grey: `amount` 1.0 is identity, 0.0 is flat grey.
pub fn contrast(r: f32, g: f32, b: f32, amount: f32) -> (f32, f32, f32) {
    let offset = 127.5 * (1.0 - amount);
    (
        (r * amount + offset).clamp(0.0, 255.0),
        (g * amount + offset).clamp(0.0, 255.0),
        (b * amount + offset).clamp(0.0, 255.0),
    )
}

/// Multiply (r, g, b) by `m` and clamp.
pub fn apply_matrix(m: &ColorMatrix, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    (
        (m[0][0] * r + m[0][1] * g + m[0][2] * b).clamp(0.0, 255.0),
        (m[1][0] * r + m[1][1] * g + m[1][2] * b).clamp(0.0, 255.0),
        (m[2][0] * r + m[2][1] * g + m[2][2] * b).clamp(0.0, 255.0),
    )
}

// ============================================================================
// COLOUR MATRICES
// ============================================================================

/// Saturation matrix: `s` 1.0 is identity, 0.0 is greyscale.
pub fn saturate_matrix(s: f32) -> ColorMatrix {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

/// Hue rotation by `degrees` around the luminance axis.
pub fn hue_rotate_matrix(degrees: f32) -> ColorMatrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

/// Sepia tone blended by `amount` (0.0 = none, 1.0 = full sepia).
pub fn sepia_matrix(amount: f32) -> ColorMatrix {
    let inv = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * inv, 0.769 - 0.769 * inv, 0.189 - 0.189 * inv],
        [0.349 - 0.349 * inv, 0.686 + 0.314 * inv, 0.168 - 0.168 * inv],
        [0.272 - 0.272 * inv, 0.534 - 0.534 * inv, 0.131 + 0.869 * inv],
    ]
}
