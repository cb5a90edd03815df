use crate::cell::CellKey;

/// Bookkeeping for one pointer-down..pointer-up paint gesture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrokeState {
    /// Pointer button is held over the grid
    pub is_dragging: bool,
    /// Key the stroke started on
    pub start_key: Option<CellKey>,
    /// Last key painted in this stroke, repeated enters on it are ignored
    pub last_painted_key: Option<CellKey>,
    /// At least one paint happened since pointer-down
    pub dirty: bool,
    /// Paint calls in this stroke
    pub painted: usize,
}

impl StrokeState {
    /// Arm a new stroke starting at `key`
    pub fn begin(&mut self, key: CellKey) {
        self.is_dragging = true;
        self.start_key = Some(key);
        self.last_painted_key = Some(key);
        self.dirty = false;
        self.painted = 0;
    }

    /// Whether a pointer-enter on `key` should paint
    /// Records `key` as the last painted key when it does
    pub fn enter(&mut self, key: CellKey) -> bool {
        if !self.is_dragging || self.last_painted_key == Some(key) {
            return false;
        }
        self.last_painted_key = Some(key);
        true
    }

    pub fn record_paint(&mut self) {
        self.dirty = true;
        self.painted += 1;
    }

    /// End the stroke, returning the paint count if anything was painted
    pub fn finish(&mut self) -> Option<usize> {
        if !self.is_dragging {
            return None;
        }
        let painted = if self.dirty { Some(self.painted) } else { None };
        self.clear();
        painted
    }

    pub fn clear(&mut self) {
        *self = StrokeState::default();
    }
}
