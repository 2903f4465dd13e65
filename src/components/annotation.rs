// ============================================================================
// ANNOTATION LAYER — freehand brush / eraser strokes and their rasterization
// ============================================================================

use std::sync::Arc;

use image::{Rgb, RgbaImage};
use rayon::prelude::*;

use crate::canvas::{destination_out, source_over};
use crate::error::{EditorError, Result};

/// A point in source-image pixel space.
pub type Point = (f32, f32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StrokeTool {
    #[default]
    Brush,
    Eraser,
}

/// One freehand gesture.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub color: Rgb<u8>,
    pub size: f32,
    pub tool: StrokeTool,
}

impl Stroke {
    /// Strokes with fewer than two points occupy a slot but draw nothing.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }
}

/// Ordered stroke list; index order is paint order.
///
/// Closed strokes are shared with history snapshots through `Arc`, so a
/// snapshot is a list of pointers.  Only the most recent stroke can be open.
#[derive(Clone, Debug, Default)]
pub struct AnnotationLayer {
    strokes: Vec<Arc<Stroke>>,
    open: bool,
}

impl AnnotationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new stroke at `point` and append it.  A stroke that was still
    /// open is implicitly closed: only the newest stroke accepts points.
    pub fn begin_stroke(&mut self, point: Point, color: Rgb<u8>, size: f32, tool: StrokeTool) {
        self.strokes.push(Arc::new(Stroke {
            points: vec![point],
            color,
            size: size.max(f32::MIN_POSITIVE),
            tool,
        }));
        self.open = true;
    }

    /// Append `point` to the open stroke.  Ignored when no stroke is open.
    pub fn extend_stroke(&mut self, point: Point) {
        if !self.open {
            return;
        }
        if let Some(last) = self.strokes.last_mut() {
            Arc::make_mut(last).points.push(point);
        }
    }

    /// Close the open stroke.  Returns `true` if a stroke was closed.
    pub fn end_stroke(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    pub fn is_stroke_open(&self) -> bool {
        self.open
    }

    pub fn strokes(&self) -> &[Arc<Stroke>] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Replace the contents with a history snapshot.  Nothing is left open.
    pub fn restore(&mut self, snapshot: &[Arc<Stroke>]) {
        self.strokes = snapshot.to_vec();
        self.open = false;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.open = false;
    }

    /// Draw every stroke onto `target` in insertion order.
    pub fn rasterize_onto(&self, target: &mut RgbaImage) {
        for stroke in &self.strokes {
            draw_stroke(target, stroke);
        }
    }
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(text: &str) -> Result<Rgb<u8>> {
    let hex = text.trim().trim_start_matches('#');
    let invalid = || EditorError::InvalidColor(text.to_string());
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

// ---------------------------------------------------------------------------
//  Stroke rasterization
// ---------------------------------------------------------------------------

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq < 1e-12 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + dx * t, a.1 + dy * t);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Rasterize one stroke as a round-capped, round-joined polyline.
///
/// Each segment writes coverage into a stroke-sized mask over its own padded
/// bounding box; the mask keeps the maximum, which is the coverage of the
/// nearest segment, so self-overlapping joins never double-paint.  The mask
/// is then blended onto `target` once per pixel.
fn draw_stroke(target: &mut RgbaImage, stroke: &Stroke) {
    if stroke.is_degenerate() {
        return;
    }
    let (w, h) = target.dimensions();
    if w == 0 || h == 0 {
        return;
    }

    let radius = stroke.size / 2.0;
    let reach = radius + 0.5;

    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for &(x, y) in &stroke.points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    let Some(bounds) = padded_bounds((min_x, min_y), (max_x, max_y), reach, (0, 0, w, h)) else {
        return;
    };
    let (x0, y0, x1, y1) = bounds;
    let mask_w = (x1 - x0) as usize;
    let mask_h = (y1 - y0) as usize;
    let mut mask = vec![0.0f32; mask_w * mask_h];

    for pair in stroke.points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let lo = (a.0.min(b.0), a.1.min(b.1));
        let hi = (a.0.max(b.0), a.1.max(b.1));
        let Some((sx0, sy0, sx1, sy1)) = padded_bounds(lo, hi, reach, bounds) else {
            continue;
        };
        for y in sy0..sy1 {
            let row = &mut mask[(y - y0) as usize * mask_w..][..mask_w];
            let cy = y as f32 + 0.5;
            for x in sx0..sx1 {
                let coverage = (reach - segment_distance((x as f32 + 0.5, cy), a, b)).clamp(0.0, 1.0);
                let slot = &mut row[(x - x0) as usize];
                if coverage > *slot {
                    *slot = coverage;
                }
            }
        }
    }

    let color = stroke.color.0;
    let erase = stroke.tool == StrokeTool::Eraser;
    let stride = w as usize * 4;

    target
        .as_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .skip(y0 as usize)
        .take(mask_h)
        .for_each(|(y, row)| {
            let mask_row = &mask[(y - y0 as usize) * mask_w..][..mask_w];
            for (i, &coverage) in mask_row.iter().enumerate() {
                if coverage <= 0.0 {
                    continue;
                }
                let pi = (x0 as usize + i) * 4;
                let base = image::Rgba([row[pi], row[pi + 1], row[pi + 2], row[pi + 3]]);
                let out = if erase {
                    destination_out(base, coverage)
                } else {
                    source_over(base, color, coverage)
                };
                row[pi..pi + 4].copy_from_slice(&out.0);
            }
        });
}

/// Pixel box `[x0, x1) x [y0, y1)` covering `lo..hi` grown by `pad`, clipped
/// to `clip`.  `None` when nothing is left.
fn padded_bounds(lo: Point, hi: Point, pad: f32, clip: (u32, u32, u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let (cx0, cy0, cx1, cy1) = clip;
    let x0 = ((lo.0 - pad).floor().max(cx0 as f32) as u32).min(cx1);
    let y0 = ((lo.1 - pad).floor().max(cy0 as f32) as u32).min(cy1);
    let x1 = ((hi.0 + pad).ceil().max(0.0) as u32).min(cx1);
    let y1 = ((hi.1 + pad).ceil().max(0.0) as u32).min(cy1);
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    fn line(layer: &mut AnnotationLayer, a: Point, b: Point, color: Rgb<u8>, size: f32, tool: StrokeTool) {
        layer.begin_stroke(a, color, size, tool);
        layer.extend_stroke(b);
        layer.end_stroke();
    }

    #[test]
    fn closed_stroke_does_not_receive_new_points() {
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke((0.0, 0.0), RED, 3.0, StrokeTool::Brush);
        layer.extend_stroke((1.0, 1.0));
        layer.extend_stroke((2.0, 2.0));
        assert!(layer.end_stroke());
        layer.extend_stroke((9.0, 9.0));
        layer.begin_stroke((5.0, 5.0), BLUE, 3.0, StrokeTool::Brush);
        layer.extend_stroke((6.0, 6.0));

        assert_eq!(layer.len(), 2);
        assert_eq!(layer.strokes()[0].points, vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(layer.strokes()[1].points, vec![(5.0, 5.0), (6.0, 6.0)]);
    }

    #[test]
    fn end_without_open_stroke_reports_false() {
        let mut layer = AnnotationLayer::new();
        assert!(!layer.end_stroke());
        layer.begin_stroke((1.0, 1.0), RED, 2.0, StrokeTool::Brush);
        assert!(layer.end_stroke());
        assert!(!layer.end_stroke());
    }

    #[test]
    fn later_strokes_paint_over_earlier_ones() {
        let mut img = white(20, 20);
        let mut layer = AnnotationLayer::new();
        line(&mut layer, (2.0, 10.0), (18.0, 10.0), RED, 4.0, StrokeTool::Brush);
        line(&mut layer, (10.0, 2.0), (10.0, 18.0), BLUE, 4.0, StrokeTool::Brush);
        layer.rasterize_onto(&mut img);

        assert_eq!(*img.get_pixel(10, 10), Rgba([0, 0, 255, 255]));
        assert_eq!(*img.get_pixel(4, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(10, 4), Rgba([0, 0, 255, 255]));
        assert_eq!(*img.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn round_caps_extend_past_endpoints() {
        let mut img = white(20, 20);
        let mut layer = AnnotationLayer::new();
        line(&mut layer, (5.0, 10.0), (15.0, 10.0), RED, 6.0, StrokeTool::Brush);
        layer.rasterize_onto(&mut img);
        // Two pixels beyond the end point, still inside the 3px cap.
        assert_eq!(*img.get_pixel(16, 9), Rgba([255, 0, 0, 255]));
        // Cap is round: the corner of the square cap stays white.
        assert_eq!(*img.get_pixel(17, 7), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn eraser_removes_base_and_earlier_strokes() {
        let mut img = white(20, 20);
        let mut layer = AnnotationLayer::new();
        line(&mut layer, (2.0, 10.0), (18.0, 10.0), RED, 4.0, StrokeTool::Brush);
        line(&mut layer, (10.0, 2.0), (10.0, 18.0), RED, 4.0, StrokeTool::Eraser);
        layer.rasterize_onto(&mut img);

        assert_eq!(img.get_pixel(10, 10)[3], 0);
        assert_eq!(img.get_pixel(10, 4)[3], 0);
        assert_eq!(*img.get_pixel(4, 10), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn degenerate_strokes_draw_nothing_but_keep_their_slot() {
        let mut img = white(10, 10);
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke((5.0, 5.0), RED, 8.0, StrokeTool::Brush);
        layer.end_stroke();
        layer.rasterize_onto(&mut img);
        assert_eq!(layer.len(), 1);
        assert!(layer.strokes()[0].is_degenerate());
        assert_eq!(img, white(10, 10));
    }

    #[test]
    fn strokes_outside_the_canvas_are_ignored() {
        let mut img = white(10, 10);
        let mut layer = AnnotationLayer::new();
        line(&mut layer, (-50.0, -50.0), (-40.0, -40.0), RED, 4.0, StrokeTool::Brush);
        layer.rasterize_onto(&mut img);
        assert_eq!(img, white(10, 10));
    }

    #[test]
    fn many_point_stroke_matches_its_straight_equivalent() {
        let mut dense = AnnotationLayer::new();
        dense.begin_stroke((3.0, 12.0), RED, 5.0, StrokeTool::Brush);
        for i in 1..=40 {
            dense.extend_stroke((3.0 + i as f32 * 0.5, 12.0));
        }
        dense.end_stroke();

        let mut sparse = AnnotationLayer::new();
        line(&mut sparse, (3.0, 12.0), (23.0, 12.0), RED, 5.0, StrokeTool::Brush);

        let (mut a, mut b) = (white(30, 24), white(30, 24));
        dense.rasterize_onto(&mut a);
        sparse.rasterize_onto(&mut b);
        // Same coverage up to float rounding in the anti-aliased rim.
        for (pa, pb) in a.pixels().zip(b.pixels()) {
            assert!(pa.0.iter().zip(pb.0.iter()).all(|(x, y)| x.abs_diff(*y) <= 1), "{:?} vs {:?}", pa, pb);
        }
        assert_eq!(*a.get_pixel(13, 12), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn long_freehand_stroke_on_large_canvas() {
        let mut img = white(1600, 1200);
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke((0.0, 0.0), BLUE, 5.0, StrokeTool::Brush);
        for i in 1..400 {
            let t = i as f32 / 399.0;
            layer.extend_stroke((t * 1599.0, t * 1199.0));
        }
        layer.end_stroke();
        layer.rasterize_onto(&mut img);

        assert_eq!(*img.get_pixel(800, 600), Rgba([0, 0, 255, 255]));
        assert_eq!(*img.get_pixel(1500, 100), Rgba([255, 255, 255, 255]));
        assert_eq!(*img.get_pixel(100, 1100), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn restore_shares_snapshot_strokes() {
        let mut layer = AnnotationLayer::new();
        line(&mut layer, (0.0, 0.0), (1.0, 1.0), RED, 2.0, StrokeTool::Brush);
        let snapshot = layer.strokes().to_vec();
        line(&mut layer, (3.0, 3.0), (4.0, 4.0), RED, 2.0, StrokeTool::Brush);
        layer.restore(&snapshot);
        assert_eq!(layer.len(), 1);
        assert!(Arc::ptr_eq(&layer.strokes()[0], &snapshot[0]));
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(parse_hex_color("#ff00ff").unwrap(), Rgb([255, 0, 255]));
        assert_eq!(parse_hex_color("00FF7f").unwrap(), Rgb([0, 255, 127]));
        assert!(matches!(parse_hex_color("#fff"), Err(EditorError::InvalidColor(_))));
        assert!(matches!(parse_hex_color("#gg0000"), Err(EditorError::InvalidColor(_))));
    }
}
