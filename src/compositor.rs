// ============================================================================
// COMPOSITOR — transform → filters → annotations, for preview and export
// ============================================================================

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, RgbaImage};

use crate::canvas::{RasterImage, flatten_over_black};
use crate::components::annotation::AnnotationLayer;
use crate::error::{EditorError, Result};
use crate::ops::filters::{FilterState, apply_filters};
use crate::ops::transform::{TransformState, apply_transform};
use crate::{log_info, log_warn};

/// A drawing surface the compositor can present into.
///
/// `acquire` returns `None` while the surface is not ready (not mounted,
/// zero-sized, torn down); presenting is then skipped.
pub trait RenderTarget {
    fn acquire(&mut self, width: u32, height: u32) -> Option<&mut RgbaImage>;
}

/// In-memory surface, resized to the rendered image on every acquire.
#[derive(Debug, Default)]
pub struct PixelSurface {
    pixels: Option<RgbaImage>,
    detached: bool,
}

impl PixelSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop handing out the surface, as a torn-down canvas would.
    pub fn detach(&mut self) {
        self.detached = true;
        self.pixels = None;
    }

    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }
}

impl RenderTarget for PixelSurface {
    fn acquire(&mut self, width: u32, height: u32) -> Option<&mut RgbaImage> {
        if self.detached {
            return None;
        }
        let fits = self.pixels.as_ref().is_some_and(|p| p.dimensions() == (width, height));
        if !fits {
            self.pixels = Some(RgbaImage::new(width, height));
        }
        self.pixels.as_mut()
    }
}

/// An encoded export, ready to hand to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
}

/// Everything the rendered image depends on.  Rendering is a pure function
/// of these four fields.
#[derive(Clone, Debug)]
pub struct Compositor {
    source: RasterImage,
    pub transform: TransformState,
    pub filters: FilterState,
    pub annotations: AnnotationLayer,
}

impl Compositor {
    pub fn new(source: RasterImage) -> Self {
        Self {
            source,
            transform: TransformState::default(),
            filters: FilterState::default(),
            annotations: AnnotationLayer::new(),
        }
    }

    pub fn source(&self) -> &RasterImage {
        &self.source
    }

    /// Swap in a new base raster (after a crop).
    pub fn replace_source(&mut self, source: RasterImage) {
        self.source = source;
    }

    /// Run the pipeline: geometry, then filters, then the annotation layer
    /// on top.  The output always has the source's dimensions.
    pub fn render(&self) -> RgbaImage {
        let placed = apply_transform(self.source.pixels(), &self.transform);
        let mut out = apply_filters(&placed, &self.filters);
        self.annotations.rasterize_onto(&mut out);
        out
    }

    /// Render into `target`.  Returns `false` (and does nothing else) when no
    /// target is available or its surface does not match the frame size.
    pub fn present(&self, target: Option<&mut dyn RenderTarget>) -> bool {
        let Some(target) = target else {
            log_warn!("present skipped: no render target");
            return false;
        };
        let frame = self.render();
        match target.acquire(frame.width(), frame.height()) {
            Some(surface) if surface.dimensions() == frame.dimensions() => {
                surface.copy_from_slice(&frame);
                true
            }
            Some(surface) => {
                let (sw, sh) = surface.dimensions();
                log_warn!(
                    "present skipped: target is {}x{}, frame is {}x{}",
                    sw,
                    sh,
                    frame.width(),
                    frame.height()
                );
                false
            }
            None => {
                log_warn!("present skipped: render target not ready");
                false
            }
        }
    }

    /// Render and encode as JPEG.  The same pipeline as `render`, flattened
    /// over black since JPEG has no alpha.
    pub fn export(&self, quality: u8) -> Result<EncodedImage> {
        let frame = self.render();
        let encoded = encode_jpeg(&frame, quality)?;
        log_info!(
            "exported {}x{} jpeg ({} bytes, quality {})",
            encoded.width,
            encoded.height,
            encoded.bytes.len(),
            quality
        );
        Ok(encoded)
    }
}

/// Encode an RGBA frame as JPEG at `quality` (1–100).
pub fn encode_jpeg(frame: &RgbaImage, quality: u8) -> Result<EncodedImage> {
    let rgb = flatten_over_black(frame);
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality.clamp(1, 100));
        encoder
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(EditorError::Encode)?;
    }
    if bytes.is_empty() {
        return Err(EditorError::EmptyEncoding);
    }
    Ok(EncodedImage {
        bytes,
        width: frame.width(),
        height: frame.height(),
        mime_type: "image/jpeg",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::annotation::StrokeTool;
    use crate::ops::filters::FilterParam;
    use image::{Rgb, Rgba};

    fn grey(w: u32, h: u32) -> RasterImage {
        RasterImage::new(RgbaImage::from_pixel(w, h, Rgba([100, 100, 100, 255])))
    }

    #[test]
    fn untouched_render_equals_source() {
        let comp = Compositor::new(grey(8, 6));
        assert_eq!(comp.render(), *comp.source().pixels());
    }

    #[test]
    fn annotations_are_drawn_after_filters() {
        let mut comp = Compositor::new(grey(20, 20));
        comp.filters.set(FilterParam::Brightness(200.0));
        comp.annotations.begin_stroke((2.0, 10.0), Rgb([10, 20, 30]), 4.0, StrokeTool::Brush);
        comp.annotations.extend_stroke((18.0, 10.0));
        comp.annotations.end_stroke();

        let out = comp.render();
        // The stroke keeps its own colour: it is not brightened.
        assert_eq!(*out.get_pixel(10, 10), Rgba([10, 20, 30, 255]));
        assert_eq!(*out.get_pixel(10, 2), Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn render_is_repeatable() {
        let mut comp = Compositor::new(grey(16, 9));
        comp.transform.rotate_cw();
        comp.filters.set(FilterParam::Sepia(40.0));
        assert_eq!(comp.render(), comp.render());
    }

    #[test]
    fn present_without_target_is_a_no_op() {
        let comp = Compositor::new(grey(4, 4));
        assert!(!comp.present(None));

        let mut surface = PixelSurface::new();
        surface.detach();
        assert!(!comp.present(Some(&mut surface as &mut dyn RenderTarget)));
        assert!(surface.pixels().is_none());
    }

    #[test]
    fn present_fills_a_ready_surface() {
        let comp = Compositor::new(grey(5, 3));
        let mut surface = PixelSurface::new();
        assert!(comp.present(Some(&mut surface as &mut dyn RenderTarget)));
        assert_eq!(surface.pixels(), Some(&comp.render()));
    }

    struct FixedTarget(RgbaImage);

    impl RenderTarget for FixedTarget {
        fn acquire(&mut self, _width: u32, _height: u32) -> Option<&mut RgbaImage> {
            Some(&mut self.0)
        }
    }

    #[test]
    fn present_skips_a_surface_of_the_wrong_size() {
        let comp = Compositor::new(grey(8, 8));
        let mut target = FixedTarget(RgbaImage::new(4, 4));
        assert!(!comp.present(Some(&mut target as &mut dyn RenderTarget)));
        assert_eq!(target.0, RgbaImage::new(4, 4));

        let mut target = FixedTarget(RgbaImage::new(8, 8));
        assert!(comp.present(Some(&mut target as &mut dyn RenderTarget)));
        assert_eq!(target.0, comp.render());
    }

    #[test]
    fn export_produces_decodable_jpeg_of_render_size() {
        let mut comp = Compositor::new(grey(30, 20));
        comp.transform.rotate_cw();
        let encoded = comp.export(90).unwrap();
        assert_eq!(encoded.mime_type, "image/jpeg");
        assert_eq!((encoded.width, encoded.height), (30, 20));
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (30, 20));
    }
}
