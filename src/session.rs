// ============================================================================
// EDITOR SESSION — command-driven state machine around the compositor
// ============================================================================
//
// One session edits one image.  Every user action arrives as an
// `EditorCommand`; the session routes it to the transform, filter,
// annotation, history, crop or layer state.  Exporting or cancelling ends
// the session, after which every command fails with `SessionClosed`.
// ============================================================================

use image::{Rgb, RgbaImage};
use uuid::Uuid;

use crate::canvas::RasterImage;
use crate::components::annotation::{AnnotationLayer, Point, StrokeTool, parse_hex_color};
use crate::components::history::HistoryManager;
use crate::components::layers::{BlendMode, LayerStack};
use crate::compositor::{Compositor, EncodedImage, RenderTarget};
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::ops::crop::{CropRegion, crop_raster};
use crate::ops::filters::{FilterParam, FilterState};
use crate::ops::transform::TransformState;
use crate::{log_err, log_info};

pub const BRUSH_SIZE_MIN: f32 = 1.0;
pub const BRUSH_SIZE_MAX: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Drawing,
    Cropping,
    Exported,
    Cancelled,
}

impl Mode {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Mode::Exported | Mode::Cancelled)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushSettings {
    pub tool: StrokeTool,
    pub size: f32,
    pub color: Rgb<u8>,
}

/// A discrete user action.  Points and crop regions are in display
/// coordinates; see `SetDisplaySize`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditorCommand {
    Rotate,
    FlipHorizontal,
    FlipVertical,
    SetFilter(FilterParam),
    ResetFilters,
    /// Rotation, flips and filters back to identity.
    ResetAdjustments,

    ToggleDrawing,
    SetTool(StrokeTool),
    SetBrushSize(f32),
    SetBrushColor(Rgb<u8>),
    PointerDown(Point),
    PointerMove(Point),
    /// Release, inside the surface or not; both end the stroke.
    PointerUp { inside: bool },
    Undo,
    Redo,

    BeginCrop,
    SetCropRegion(CropRegion),
    ApplyCrop,
    CancelCrop,
    /// Size at which the caller shows the raster.  Until set, display and
    /// raster coordinates coincide.
    SetDisplaySize(f32, f32),

    AddLayer,
    DeleteLayer(Uuid),
    SelectLayer(Uuid),
    ToggleLayerVisibility(Uuid),
    SetLayerOpacity(Uuid, u8),
    SetLayerBlendMode(Uuid, BlendMode),
    MoveLayerUp(Uuid),
    MoveLayerDown(Uuid),
}

pub struct EditorSession {
    id: Uuid,
    compositor: Compositor,
    history: HistoryManager,
    layers: LayerStack,
    brush: BrushSettings,
    mode: Mode,
    crop_region: Option<CropRegion>,
    display_size: Option<(f32, f32)>,
    config: EditorConfig,
}

impl EditorSession {
    pub fn new(source: RasterImage, config: &EditorConfig) -> Result<Self> {
        let color = parse_hex_color(&config.default_brush_color)?;
        let id = Uuid::new_v4();
        log_info!(
            scope = session_tag(id);
            "editor session started on {}x{} image",
            source.width(),
            source.height()
        );
        Ok(Self {
            id,
            compositor: Compositor::new(source),
            history: HistoryManager::new(config.max_history),
            layers: LayerStack::new(),
            brush: BrushSettings {
                tool: StrokeTool::Brush,
                size: config.default_brush_size.clamp(BRUSH_SIZE_MIN, BRUSH_SIZE_MAX),
                color,
            },
            mode: Mode::Idle,
            crop_region: None,
            display_size: None,
            config: config.clone(),
        })
    }

    // --- accessors ---------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn source(&self) -> &RasterImage {
        self.compositor.source()
    }

    pub fn transform(&self) -> &TransformState {
        &self.compositor.transform
    }

    pub fn filters(&self) -> &FilterState {
        &self.compositor.filters
    }

    pub fn annotations(&self) -> &AnnotationLayer {
        &self.compositor.annotations
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    /// The crop draft, while in crop mode.
    pub fn crop_region(&self) -> Option<CropRegion> {
        self.crop_region
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn render(&self) -> RgbaImage {
        self.compositor.render()
    }

    pub fn present(&self, target: Option<&mut dyn RenderTarget>) -> bool {
        self.compositor.present(target)
    }

    // --- commands ----------------------------------------------------------

    pub fn apply(&mut self, command: EditorCommand) -> Result<()> {
        if self.mode.is_terminal() {
            return Err(EditorError::SessionClosed);
        }
        match command {
            EditorCommand::Rotate => self.compositor.transform.rotate_cw(),
            EditorCommand::FlipHorizontal => self.compositor.transform.toggle_flip_horizontal(),
            EditorCommand::FlipVertical => self.compositor.transform.toggle_flip_vertical(),
            EditorCommand::SetFilter(param) => self.compositor.filters.set(param),
            EditorCommand::ResetFilters => self.compositor.filters.reset(),
            EditorCommand::ResetAdjustments => self.reset_adjustments(),

            EditorCommand::ToggleDrawing => {
                if self.mode == Mode::Drawing {
                    self.finish_stroke();
                    self.mode = Mode::Idle;
                } else {
                    self.crop_region = None;
                    self.mode = Mode::Drawing;
                }
            }
            EditorCommand::SetTool(tool) => self.brush.tool = tool,
            EditorCommand::SetBrushSize(size) => {
                if size.is_finite() {
                    self.brush.size = size.clamp(BRUSH_SIZE_MIN, BRUSH_SIZE_MAX);
                }
            }
            EditorCommand::SetBrushColor(color) => self.brush.color = color,
            EditorCommand::PointerDown(point) => {
                if self.mode == Mode::Drawing {
                    self.finish_stroke();
                    let point = self.to_raster(point);
                    let BrushSettings { tool, size, color } = self.brush;
                    self.compositor.annotations.begin_stroke(point, color, size, tool);
                }
            }
            EditorCommand::PointerMove(point) => {
                let point = self.to_raster(point);
                self.compositor.annotations.extend_stroke(point);
            }
            EditorCommand::PointerUp { .. } => self.finish_stroke(),
            EditorCommand::Undo => {
                self.finish_stroke();
                if let Some(snapshot) = self.history.undo() {
                    self.compositor.annotations.restore(snapshot);
                }
            }
            EditorCommand::Redo => {
                self.finish_stroke();
                if let Some(snapshot) = self.history.redo() {
                    self.compositor.annotations.restore(snapshot);
                }
            }

            EditorCommand::BeginCrop => {
                self.finish_stroke();
                let (w, h) = self.display_dimensions();
                self.crop_region = Some(CropRegion::centered_half(w, h));
                self.mode = Mode::Cropping;
            }
            EditorCommand::SetCropRegion(region) => {
                if self.mode == Mode::Cropping {
                    self.crop_region = Some(region);
                }
            }
            EditorCommand::ApplyCrop => self.apply_crop(),
            EditorCommand::CancelCrop => {
                if self.mode == Mode::Cropping {
                    self.crop_region = None;
                    self.mode = Mode::Idle;
                }
            }
            EditorCommand::SetDisplaySize(w, h) => {
                self.display_size = (w > 0.0 && h > 0.0).then_some((w, h));
            }

            EditorCommand::AddLayer => {
                self.layers.add();
            }
            EditorCommand::DeleteLayer(id) => {
                self.layers.delete(id);
            }
            EditorCommand::SelectLayer(id) => {
                self.layers.select(id);
            }
            EditorCommand::ToggleLayerVisibility(id) => self.layers.toggle_visibility(id),
            EditorCommand::SetLayerOpacity(id, opacity) => self.layers.set_opacity(id, opacity),
            EditorCommand::SetLayerBlendMode(id, mode) => self.layers.set_blend_mode(id, mode),
            EditorCommand::MoveLayerUp(id) => self.layers.move_up(id),
            EditorCommand::MoveLayerDown(id) => self.layers.move_down(id),
        }
        Ok(())
    }

    /// Render, encode and close the session.  On failure the session stays
    /// live so the caller can retry or cancel.
    pub fn export(&mut self) -> Result<EncodedImage> {
        if self.mode.is_terminal() {
            return Err(EditorError::SessionClosed);
        }
        self.finish_stroke();
        match self.compositor.export(self.config.jpeg_quality) {
            Ok(encoded) => {
                self.mode = Mode::Exported;
                Ok(encoded)
            }
            Err(e) => {
                log_err!(scope = session_tag(self.id); "export failed: {}", e);
                Err(e)
            }
        }
    }

    /// Discard all edits and close the session.
    pub fn cancel(&mut self) -> Result<()> {
        if self.mode.is_terminal() {
            return Err(EditorError::SessionClosed);
        }
        self.compositor.annotations.clear();
        self.history.clear();
        self.crop_region = None;
        self.mode = Mode::Cancelled;
        log_info!(scope = session_tag(self.id); "editor session cancelled");
        Ok(())
    }

    // --- internals ---------------------------------------------------------

    /// Close the open stroke, if any, and snapshot the layer.
    fn finish_stroke(&mut self) {
        if self.compositor.annotations.end_stroke() {
            self.history.record(self.compositor.annotations.strokes());
        }
    }

    fn reset_adjustments(&mut self) {
        self.compositor.transform.reset();
        self.compositor.filters.reset();
    }

    fn raster_dimensions(&self) -> (f32, f32) {
        let (w, h) = self.compositor.source().dimensions();
        (w as f32, h as f32)
    }

    fn display_dimensions(&self) -> (f32, f32) {
        self.display_size.unwrap_or_else(|| self.raster_dimensions())
    }

    fn to_raster(&self, (x, y): Point) -> Point {
        let (rw, rh) = self.raster_dimensions();
        let (dw, dh) = self.display_dimensions();
        (x * rw / dw, y * rh / dh)
    }

    fn apply_crop(&mut self) {
        if self.mode != Mode::Cropping {
            return;
        }
        let Some(region) = self.crop_region.take() else {
            self.mode = Mode::Idle;
            return;
        };

        let composited = self.compositor.render();
        let rect = region.to_pixels(
            self.display_dimensions(),
            composited.dimensions(),
            self.config.min_crop_size,
        );
        let cropped = crop_raster(&composited, rect);
        self.compositor.replace_source(RasterImage::new(cropped));

        // Stroke coordinates belong to the old raster.
        self.compositor.annotations.clear();
        self.history.clear();
        if self.config.reset_adjustments_on_crop {
            self.reset_adjustments();
        }
        self.display_size = None;
        self.mode = Mode::Idle;
        log_info!(
            scope = session_tag(self.id);
            "crop applied: {}x{} at ({}, {})",
            rect.width,
            rect.height,
            rect.x,
            rect.y
        );
    }
}

/// Short log scope for a session: the first eight hex digits of its id.
fn session_tag(id: Uuid) -> String {
    format!("session {:08x}", id.as_fields().0)
}
