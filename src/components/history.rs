use std::sync::Arc;

use crate::components::annotation::Stroke;

/// Full copy of the annotation stroke list at one point in time.
pub type HistorySnapshot = Vec<Arc<Stroke>>;

/// Snapshot-based undo/redo for the annotation layer.
///
/// A snapshot is recorded every time a stroke completes.  The cursor points
/// at the snapshot matching the layer's current contents; undo and redo
/// move the cursor and hand back the snapshot to restore.  Recording after
/// an undo discards the redo branch.
pub struct HistoryManager {
    snapshots: Vec<HistorySnapshot>,
    index: Option<usize>,
    max_history_size: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(50)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            index: None,
            max_history_size: max_history_size.max(1),
        }
    }

    /// Record the layer's stroke list after a stroke completed.
    pub fn record(&mut self, strokes: &[Arc<Stroke>]) {
        // Drop the redo branch
        let keep = self.index.map_or(0, |i| i + 1);
        self.snapshots.truncate(keep);

        self.snapshots.push(strokes.to_vec());
        self.index = Some(self.snapshots.len() - 1);

        self.prune();
    }

    /// Step back one snapshot.  Returns the snapshot to restore, or `None`
    /// when already at the oldest one.
    pub fn undo(&mut self) -> Option<&[Arc<Stroke>]> {
        let idx = self.index.filter(|&i| i > 0)? - 1;
        self.index = Some(idx);
        Some(&self.snapshots[idx])
    }

    /// Step forward one snapshot.  Returns the snapshot to restore, or `None`
    /// when already at the newest one.
    pub fn redo(&mut self) -> Option<&[Arc<Stroke>]> {
        let idx = self.index.filter(|&i| i + 1 < self.snapshots.len())? + 1;
        self.index = Some(idx);
        Some(&self.snapshots[idx])
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.is_some_and(|i| i + 1 < self.snapshots.len())
    }

    /// Cursor into the snapshot list; `None` when nothing has been recorded.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn current(&self) -> Option<&[Arc<Stroke>]> {
        self.index.map(|i| self.snapshots[i].as_slice())
    }

    /// Forget everything, back to the empty state.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.index = None;
    }

    /// Drop the oldest snapshots beyond the size limit.
    fn prune(&mut self) {
        let excess = self.snapshots.len().saturating_sub(self.max_history_size);
        if excess > 0 {
            self.snapshots.drain(..excess);
            self.index = self.index.map(|i| i.saturating_sub(excess));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::annotation::{AnnotationLayer, StrokeTool};
    use image::Rgb;
    use pretty_assertions::assert_eq;

    fn draw(layer: &mut AnnotationLayer, history: &mut HistoryManager, x: f32) {
        layer.begin_stroke((x, 0.0), Rgb([0, 0, 0]), 2.0, StrokeTool::Brush);
        layer.extend_stroke((x, 5.0));
        layer.end_stroke();
        history.record(layer.strokes());
    }

    fn xs(strokes: &[Arc<Stroke>]) -> Vec<f32> {
        strokes.iter().map(|s| s.points[0].0).collect()
    }

    #[test]
    fn empty_history_cannot_move() {
        let mut h = HistoryManager::new(10);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert_eq!(h.index(), None);
    }

    #[test]
    fn first_snapshot_is_the_floor() {
        let mut layer = AnnotationLayer::new();
        let mut h = HistoryManager::new(10);
        draw(&mut layer, &mut h, 1.0);
        assert_eq!(h.index(), Some(0));
        assert!(!h.can_undo());
        assert!(h.undo().is_none());
    }

    #[test]
    fn undo_then_redo_walks_snapshots() {
        let mut layer = AnnotationLayer::new();
        let mut h = HistoryManager::new(10);
        for x in [1.0, 2.0, 3.0] {
            draw(&mut layer, &mut h, x);
        }

        assert_eq!(xs(h.undo().unwrap()), vec![1.0, 2.0]);
        assert_eq!(xs(h.undo().unwrap()), vec![1.0]);
        assert!(h.undo().is_none());
        assert!(h.can_redo());
        assert_eq!(xs(h.redo().unwrap()), vec![1.0, 2.0]);
        assert_eq!(xs(h.redo().unwrap()), vec![1.0, 2.0, 3.0]);
        assert!(h.redo().is_none());
    }

    #[test]
    fn undo_redo_pairs_are_idempotent() {
        let mut layer = AnnotationLayer::new();
        let mut h = HistoryManager::new(10);
        for x in [1.0, 2.0, 3.0] {
            draw(&mut layer, &mut h, x);
        }
        h.undo();
        let before = h.current().unwrap().to_vec();

        let restored = h.redo().unwrap().to_vec();
        layer.restore(&restored);
        let back = h.undo().unwrap().to_vec();
        assert_eq!(back, before);

        let forward = h.undo().unwrap().to_vec();
        let again = h.redo().unwrap().to_vec();
        assert_ne!(forward, again);
        assert_eq!(again, before);
    }

    #[test]
    fn recording_after_undo_discards_redo_branch() {
        let mut layer = AnnotationLayer::new();
        let mut h = HistoryManager::new(10);
        draw(&mut layer, &mut h, 1.0);
        draw(&mut layer, &mut h, 2.0);
        let snap = h.undo().unwrap().to_vec();
        layer.restore(&snap);
        draw(&mut layer, &mut h, 9.0);

        assert_eq!(h.len(), 2);
        assert!(!h.can_redo());
        assert_eq!(xs(h.current().unwrap()), vec![1.0, 9.0]);
    }

    #[test]
    fn size_limit_drops_oldest_and_keeps_cursor_on_newest() {
        let mut layer = AnnotationLayer::new();
        let mut h = HistoryManager::new(3);
        for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
            draw(&mut layer, &mut h, x);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.index(), Some(2));
        assert_eq!(xs(h.undo().unwrap()), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(xs(h.undo().unwrap()), vec![1.0, 2.0, 3.0]);
        assert!(h.undo().is_none());
    }

    #[test]
    fn clear_returns_to_empty() {
        let mut layer = AnnotationLayer::new();
        let mut h = HistoryManager::new(10);
        draw(&mut layer, &mut h, 1.0);
        draw(&mut layer, &mut h, 2.0);
        h.clear();
        assert!(h.is_empty());
        assert!(!h.can_undo() && !h.can_redo());
    }
}
