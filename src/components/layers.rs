// ============================================================================
// LAYER METADATA — the editor's layer list (administrative records only)
// ============================================================================
//
// These records are shown and edited by the layers panel but the compositor
// does not read them: the rendered image comes from the base raster and the
// annotation layer alone.
// ============================================================================

use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    Difference,
}

impl BlendMode {
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::Darken,
            BlendMode::Lighten,
            BlendMode::Difference,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::Difference => "difference",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayerInfo {
    pub id: Uuid,
    pub name: String,
    pub visible: bool,
    /// Percent, 0..=100
    pub opacity: u8,
    pub blend_mode: BlendMode,
}

impl LayerInfo {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            visible: true,
            opacity: 100,
            blend_mode: BlendMode::Normal,
        }
    }
}

/// Ordered layer list, top of the list first, with one active layer.
/// Always holds at least one layer.
#[derive(Clone, Debug)]
pub struct LayerStack {
    layers: Vec<LayerInfo>,
    active: Uuid,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStack {
    pub fn new() -> Self {
        let background = LayerInfo::new("Background".to_string());
        Self {
            active: background.id,
            layers: vec![background],
        }
    }

    pub fn layers(&self) -> &[LayerInfo] {
        &self.layers
    }

    pub fn active_id(&self) -> Uuid {
        self.active
    }

    pub fn get(&self, id: Uuid) -> Option<&LayerInfo> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Add a new layer named `Layer N` and make it active.
    pub fn add(&mut self) -> Uuid {
        let layer = LayerInfo::new(format!("Layer {}", self.layers.len() + 1));
        let id = layer.id;
        self.layers.push(layer);
        self.active = id;
        id
    }

    /// Delete a layer (the last remaining layer cannot be deleted).
    /// Returns `true` if something was removed.
    pub fn delete(&mut self, id: Uuid) -> bool {
        if self.layers.len() <= 1 {
            return false;
        }
        let Some(idx) = self.position(id) else { return false };
        self.layers.remove(idx);
        if self.active == id {
            self.active = self.layers[idx.min(self.layers.len() - 1)].id;
        }
        true
    }

    pub fn select(&mut self, id: Uuid) -> bool {
        if self.position(id).is_some() {
            self.active = id;
            true
        } else {
            false
        }
    }

    pub fn toggle_visibility(&mut self, id: Uuid) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) {
            layer.visible = !layer.visible;
        }
    }

    pub fn set_opacity(&mut self, id: Uuid, opacity: u8) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) {
            layer.opacity = opacity.min(100);
        }
    }

    pub fn set_blend_mode(&mut self, id: Uuid, mode: BlendMode) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) {
            layer.blend_mode = mode;
        }
    }

    /// Move towards the front of the list.  No-op for the first layer.
    pub fn move_up(&mut self, id: Uuid) {
        if let Some(idx) = self.position(id)
            && idx > 0
        {
            self.layers.swap(idx, idx - 1);
        }
    }

    /// Move towards the end of the list.  No-op for the last layer.
    pub fn move_down(&mut self, id: Uuid) {
        if let Some(idx) = self.position(id)
            && idx + 1 < self.layers.len()
        {
            self.layers.swap(idx, idx + 1);
        }
    }
}
