use serde::Deserialize;

/// Tunables for an editing session.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// let cfg = snapedit::config::EditorConfig::from_json(r#"{ "jpeg_quality": 80 }"#).unwrap();
/// assert_eq!(cfg.jpeg_quality, 80);
/// assert_eq!(cfg.max_history, 50);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// JPEG quality used by export (1–100).
    pub jpeg_quality: u8,
    /// Maximum number of annotation snapshots kept for undo.
    pub max_history: usize,
    /// Smallest crop edge in raster pixels.
    pub min_crop_size: u32,
    pub default_brush_size: f32,
    /// `#rrggbb`
    pub default_brush_color: String,
    /// Reset rotation, flips and filters after a crop has baked them in.
    pub reset_adjustments_on_crop: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            max_history: 50,
            min_crop_size: 10,
            default_brush_size: 5.0,
            default_brush_color: "#000000".to_string(),
            reset_adjustments_on_crop: false,
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let mut cfg: Self = serde_json::from_str(text)?;
        cfg.jpeg_quality = cfg.jpeg_quality.clamp(1, 100);
        cfg.max_history = cfg.max_history.max(1);
        Ok(cfg)
    }
}
