// ============================================================================
// FILTER CHAIN — brightness, contrast, saturation, hue, blur, sepia
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::ops::adjustments::{
    ColorMatrix, apply_matrix, apply_pixel_transform, brightness, contrast, hue_rotate_matrix,
    saturate_matrix, sepia_matrix,
};

pub const PERCENT_MAX: f32 = 200.0;
pub const BLUR_MAX: f32 = 10.0;
pub const SEPIA_MAX: f32 = 100.0;

/// Slider values for the filter chain.  Percentages are in `0..=200` with
/// 100 as identity; hue is in degrees `0..360`; blur is a radius in pixels
/// `0..=10`; sepia is a percentage `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterState {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    hue: f32,
    blur: f32,
    sepia: f32,
}

/// One filter setting, as sent by a slider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterParam {
    Brightness(f32),
    Contrast(f32),
    Saturation(f32),
    Hue(f32),
    Blur(f32),
    Sepia(f32),
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            hue: 0.0,
            blur: 0.0,
            sepia: 0.0,
        }
    }
}

impl FilterState {
    /// Set one parameter, clamping it into its range.  Parameters are
    /// independent: no setter changes another's value or range.
    pub fn set(&mut self, param: FilterParam) {
        let clean = |v: f32, max: f32| if v.is_finite() { v.clamp(0.0, max) } else { 0.0 };
        match param {
            FilterParam::Brightness(v) => self.brightness = clean(v, PERCENT_MAX),
            FilterParam::Contrast(v) => self.contrast = clean(v, PERCENT_MAX),
            FilterParam::Saturation(v) => self.saturation = clean(v, PERCENT_MAX),
            FilterParam::Hue(v) => self.hue = if v.is_finite() { v.rem_euclid(360.0) } else { 0.0 },
            FilterParam::Blur(v) => self.blur = clean(v, BLUR_MAX),
            FilterParam::Sepia(v) => self.sepia = clean(v, SEPIA_MAX),
        }
    }

    pub fn with(mut self, param: FilterParam) -> Self {
        self.set(param);
        self
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn brightness(&self) -> f32 { self.brightness }
    pub fn contrast(&self) -> f32 { self.contrast }
    pub fn saturation(&self) -> f32 { self.saturation }
    pub fn hue(&self) -> f32 { self.hue }
    pub fn blur(&self) -> f32 { self.blur }
    pub fn sepia(&self) -> f32 { self.sepia }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Run the whole chain over `src`.  Stages sitting at their identity value
/// are skipped, so an identity state returns the input bytes unchanged.
pub fn apply_filters(src: &RgbaImage, state: &FilterState) -> RgbaImage {
    if state.is_identity() {
        return src.clone();
    }

    let b = (state.brightness != 100.0).then_some(state.brightness / 100.0);
    let c = (state.contrast != 100.0).then_some(state.contrast / 100.0);
    let s: Option<ColorMatrix> =
        (state.saturation != 100.0).then(|| saturate_matrix(state.saturation / 100.0));
    let h: Option<ColorMatrix> = (state.hue != 0.0).then(|| hue_rotate_matrix(state.hue));

    let mut out = if b.is_some() || c.is_some() || s.is_some() || h.is_some() {
        apply_pixel_transform(src, |mut r, mut g, mut bl, a| {
            if let Some(amount) = b {
                (r, g, bl) = brightness(r, g, bl, amount);
            }
            if let Some(amount) = c {
                (r, g, bl) = contrast(r, g, bl, amount);
            }
            if let Some(m) = &s {
                (r, g, bl) = apply_matrix(m, r, g, bl);
            }
            if let Some(m) = &h {
                (r, g, bl) = apply_matrix(m, r, g, bl);
            }
            (r, g, bl, a)
        })
    } else {
        src.clone()
    };

    if state.blur > 0.0 {
        out = parallel_gaussian_blur(&out, state.blur);
    }

    if state.sepia > 0.0 {
        let m = sepia_matrix(state.sepia / 100.0);
        out = apply_pixel_transform(&out, |r, g, b, a| {
            let (r, g, b) = apply_matrix(&m, r, g, b);
            (r, g, b, a)
        });
    }

    out
}

// ---------------------------------------------------------------------------
//  Parallel separable Gaussian blur (rayon)
// ---------------------------------------------------------------------------

/// Build a 1-D Gaussian kernel truncated at ceil(3*sigma).
fn build_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..len)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let inv = 1.0 / kernel.iter().sum::<f32>();
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Separable Gaussian blur with edge clamping, rows processed in parallel.
///
/// Colour is blurred premultiplied by alpha, so fully transparent pixels
/// contribute coverage but no colour.
pub fn parallel_gaussian_blur(src: &RgbaImage, sigma: f32) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 || sigma <= 0.0 {
        return src.clone();
    }

    let kernel = build_gaussian_kernel(sigma);
    let radius = kernel.len() / 2;
    let buf_in: Vec<f32> = src
        .as_raw()
        .chunks_exact(4)
        .flat_map(|p| {
            let a = p[3] as f32;
            let k = a / 255.0;
            [p[0] as f32 * k, p[1] as f32 * k, p[2] as f32 * k, a]
        })
        .collect();
    let pixel_count = w * h * 4;

    // --- Horizontal pass ---
    let mut buf_h = vec![0.0f32; pixel_count];
    buf_h.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
        let row_in_start = y * w * 4;
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius as isize).clamp(0, w as isize - 1) as usize;
                let idx = row_in_start + sx * 4;
                for c in 0..4 {
                    acc[c] += buf_in[idx + c] * kv;
                }
            }
            row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
        }
    });

    // --- Vertical pass, then back to straight alpha ---
    let mut dst_raw = vec![0u8; pixel_count];
    dst_raw.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius as isize).clamp(0, h as isize - 1) as usize;
                let idx = sy * w * 4 + x * 4;
                for c in 0..4 {
                    acc[c] += buf_h[idx + c] * kv;
                }
            }
            let alpha = acc[3];
            let unpremul = if alpha > 1e-3 { 255.0 / alpha } else { 0.0 };
            for c in 0..3 {
                row_out[x * 4 + c] = (acc[c] * unpremul).round().clamp(0.0, 255.0) as u8;
            }
            row_out[x * 4 + 3] = alpha.round().clamp(0.0, 255.0) as u8;
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| src.clone())
}
