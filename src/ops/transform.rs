// ============================================================================
// TRANSFORM OPERATIONS — quarter-turn rotation and axis flips
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

/// Rotation (quarter turns, clockwise) and flips applied to the source raster
/// before filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransformState {
    rotation_degrees: u16,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl TransformState {
    /// Build a state, normalising `rotation_degrees` to the nearest lower
    /// quarter turn in `0..360`.
    pub fn new(rotation_degrees: i32, flip_horizontal: bool, flip_vertical: bool) -> Self {
        let quarter = rotation_degrees.div_euclid(90).rem_euclid(4);
        Self {
            rotation_degrees: (quarter * 90) as u16,
            flip_horizontal,
            flip_vertical,
        }
    }

    pub fn rotation_degrees(&self) -> u16 {
        self.rotation_degrees
    }

    /// Rotate a further 90° clockwise.
    pub fn rotate_cw(&mut self) {
        self.rotation_degrees = (self.rotation_degrees + 90) % 360;
    }

    pub fn toggle_flip_horizontal(&mut self) {
        self.flip_horizontal = !self.flip_horizontal;
    }

    pub fn toggle_flip_vertical(&mut self) {
        self.flip_vertical = !self.flip_vertical;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// (cos, sin) of the rotation, exact for quarter turns.
    fn cos_sin(&self) -> (i64, i64) {
        match self.rotation_degrees {
            90 => (0, 1),
            180 => (-1, 0),
            270 => (0, -1),
            _ => (1, 0),
        }
    }
}

/// Draw `src` centred on a canvas of the same size, rotated then flipped in
/// the rotated frame.
///
/// The canvas keeps the source dimensions even for 90°/270°, so a non-square
/// image is clipped on its long axis and padded with transparency on its
/// short axis.  Sampling works in doubled integer coordinates around the
/// centre, which keeps every quarter turn pixel-exact.
pub fn apply_transform(src: &RgbaImage, state: &TransformState) -> RgbaImage {
    if state.is_identity() {
        return src.clone();
    }

    let (w, h) = src.dimensions();
    let mut dst = RgbaImage::new(w, h);
    if w == 0 || h == 0 {
        return dst;
    }

    let (cos, sin) = state.cos_sin();
    let fx: i64 = if state.flip_horizontal { -1 } else { 1 };
    let fy: i64 = if state.flip_vertical { -1 } else { 1 };
    let (wi, hi) = (w as i64, h as i64);

    let src_raw = src.as_raw();
    let stride = w as usize * 4;

    dst.as_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(dy, row)| {
            let v = 2 * dy as i64 + 1 - hi;
            for dx in 0..w as usize {
                let u = 2 * dx as i64 + 1 - wi;

                // Undo the rotation, then the flips (they were applied last
                // in the rotated local frame).
                let px = (u * cos + v * sin) * fx;
                let py = (-u * sin + v * cos) * fy;

                let sx = (px + wi - 1).div_euclid(2);
                let sy = (py + hi - 1).div_euclid(2);
                if sx < 0 || sy < 0 || sx >= wi || sy >= hi {
                    continue;
                }

                let si = sy as usize * stride + sx as usize * 4;
                row[dx * 4..dx * 4 + 4].copy_from_slice(&src_raw[si..si + 4]);
            }
        });
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn numbered(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, (x * 7 + y) as u8, 255]))
    }

    #[test]
    fn rotation_normalises_to_quarter_turns() {
        assert_eq!(TransformState::new(450, false, false).rotation_degrees(), 90);
        assert_eq!(TransformState::new(-90, false, false).rotation_degrees(), 270);
        let mut t = TransformState::new(270, false, false);
        t.rotate_cw();
        assert_eq!(t.rotation_degrees(), 0);
    }

    #[test]
    fn reset_state_round_trips_every_combination() {
        let src = numbered(6, 4);
        for rot in [0, 90, 180, 270] {
            for (fh, fv) in [(false, false), (true, false), (false, true), (true, true)] {
                let mut state = TransformState::new(rot, fh, fv);
                let _ = apply_transform(&src, &state);
                state.reset();
                let out = apply_transform(&src, &state);
                assert_eq!(out, src, "rot {} flips {:?}", rot, (fh, fv));
            }
        }
    }

    #[test]
    fn quarter_turn_moves_top_left_to_top_right() {
        let src = numbered(3, 3);
        let out = apply_transform(&src, &TransformState::new(90, false, false));
        assert_eq!(out.get_pixel(2, 0), src.get_pixel(0, 0));
        assert_eq!(out.get_pixel(1, 1), src.get_pixel(1, 1));
        assert_eq!(out.get_pixel(0, 2), src.get_pixel(2, 2));
    }

    #[test]
    fn half_turn_is_pixel_exact_on_non_square() {
        let src = numbered(5, 2);
        let out = apply_transform(&src, &TransformState::new(180, false, false));
        for y in 0..2 {
            for x in 0..5 {
                assert_eq!(out.get_pixel(x, y), src.get_pixel(4 - x, 1 - y));
            }
        }
    }

    #[test]
    fn quarter_turn_keeps_canvas_size() {
        let src = numbered(8, 4);
        let out = apply_transform(&src, &TransformState::new(90, false, false));
        assert_eq!(out.dimensions(), (8, 4));
        // Left and right margins fall outside the rotated source.
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(7, 3)[3], 0);
        assert_eq!(out.get_pixel(4, 2)[3], 255);
    }

    #[test]
    fn horizontal_flip_mirrors_columns_and_is_involutive() {
        let src = numbered(4, 3);
        let state = TransformState::new(0, true, false);
        let once = apply_transform(&src, &state);
        assert_eq!(once.get_pixel(0, 1), src.get_pixel(3, 1));
        assert_eq!(apply_transform(&once, &state), src);
    }

    #[test]
    fn flip_is_applied_in_rotated_frame() {
        // Flip then rotate 90° clockwise mirrors across the anti-diagonal.
        let src = numbered(3, 3);
        let out = apply_transform(&src, &TransformState::new(90, true, false));
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(out.get_pixel(x, y), src.get_pixel(2 - y, 2 - x));
            }
        }
    }
}
