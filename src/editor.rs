//! Parking map editor state machine.
//!
//! Owns the grid config, the persisted (origin) layout, the working (draft)
//! layout and the undo/redo history of `(cfg, draft)` snapshots. Pointer and
//! toolbar events come in through the methods below; nothing here talks to the
//! network, saving goes through [`crate::session::Session`].

use crate::api::{MapResponse, MapUpdate};
use crate::cell::{Cell, CellKey, Tool};
use crate::grid::{clamp_dimension, GridConfig};
use crate::history::History;
use crate::map_data::MapData;
use crate::slot::{slots_after_save, slots_to_cells, ResizeWarning, Slot};
use crate::stroke::StrokeState;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One undo step: the config and draft as they were displayed
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub cfg: GridConfig,
    pub map: MapData,
}

/// Clamped resize target, with the warning to confirm if slots would be lost
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizePlan {
    pub rows: u32,
    pub cols: u32,
    pub warning: Option<ResizeWarning>,
}

impl ResizePlan {
    pub fn needs_confirmation(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct EditorState {
    area_id: u64,
    cfg: GridConfig,
    origin: MapData,
    draft: MapData,
    slots: Vec<Slot>,
    slot_cells: BTreeMap<CellKey, Cell>,
    tool: Tool,
    history: History<Snapshot>,
    stroke: StrokeState,
}

impl EditorState {
    /// Build the editor for a freshly loaded area
    ///
    /// The draft starts as the slot cells overlaid by the persisted cells, and
    /// the history holds exactly that state.
    pub fn new(area_id: u64, cfg: GridConfig, origin: MapData, slots: Vec<Slot>, tool: Tool) -> Self {
        let slot_cells = slots_to_cells(&slots);
        let draft = MapData::merged_over(&slot_cells, &origin);
        let history = History::new(Snapshot {
            cfg,
            map: draft.clone(),
        });

        info!(
            "Editor loaded area {}: {}x{} grid, {} cells, {} slots",
            area_id,
            cfg.rows,
            cfg.cols,
            draft.cells.len(),
            slots.len()
        );

        EditorState {
            area_id,
            cfg,
            origin,
            draft,
            slots,
            slot_cells,
            tool,
            history,
            stroke: StrokeState::default(),
        }
    }

    /// Build the editor from the backend map response and slot list
    pub fn load(area_id: u64, response: &MapResponse, slots: Vec<Slot>, tool: Tool) -> Self {
        let cfg = GridConfig::from_backend(response.map_rows, response.map_cols, response.cell_size);
        let origin = MapData::from_value(&response.map_data);
        Self::new(area_id, cfg, origin, slots, tool)
    }

    pub fn area_id(&self) -> u64 {
        self.area_id
    }

    pub fn cfg(&self) -> &GridConfig {
        &self.cfg
    }

    pub fn draft(&self) -> &MapData {
        &self.draft
    }

    pub fn origin(&self) -> &MapData {
        &self.origin
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slot occupying a coordinate, if any
    pub fn slot_at(&self, key: CellKey) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.key() == key)
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            debug!("tool {} -> {}", self.tool, tool);
            self.tool = tool;
        }
    }

    pub fn history(&self) -> &History<Snapshot> {
        &self.history
    }

    pub fn stroke(&self) -> &StrokeState {
        &self.stroke
    }

    // ----- Resize -----

    /// Clamp the raw rows/cols input and work out which slots it would drop
    pub fn plan_resize(&self, raw_rows: &str, raw_cols: &str) -> ResizePlan {
        let rows = clamp_dimension(raw_rows, self.cfg.rows);
        let cols = clamp_dimension(raw_cols, self.cfg.cols);
        ResizePlan {
            rows,
            cols,
            warning: ResizeWarning::for_resize(&self.slots, rows, cols),
        }
    }

    /// Apply a resize plan: new dimensions, out-of-grid cells pruned, one history entry
    pub fn apply_resize(&mut self, plan: &ResizePlan) {
        let cfg = self.cfg.with_dimensions(plan.rows, plan.cols);
        let mut draft = self.draft.clone();
        let pruned = draft.prune_out_of_grid(cfg.rows, cfg.cols);

        info!(
            "Resized grid {}x{} -> {}x{} ({} cells pruned)",
            self.cfg.rows, self.cfg.cols, cfg.rows, cfg.cols, pruned
        );

        self.cfg = cfg;
        self.draft = draft;
        self.push_history();
    }

    /// Resize from raw input, asking `confirm` first when slots would be lost
    /// Returns false when the user declined (nothing changed)
    pub fn apply_grid_config<F>(&mut self, raw_rows: &str, raw_cols: &str, confirm: F) -> bool
    where
        F: FnOnce(&ResizeWarning) -> bool,
    {
        let plan = self.plan_resize(raw_rows, raw_cols);
        if let Some(warning) = &plan.warning {
            if !confirm(warning) {
                info!("Resize to {}x{} declined ({} slots would be lost)", plan.rows, plan.cols, warning.lost);
                return false;
            }
        }
        self.apply_resize(&plan);
        true
    }

    // ----- Painting -----

    /// Apply the active tool to one cell
    ///
    /// Kind tools overwrite whatever is there (any slot name is dropped), the
    /// eraser removes the entry. Keys outside the grid are ignored. Painting
    /// never records history on its own; the stroke does on pointer-up.
    pub fn paint_cell(&mut self, key: CellKey) -> bool {
        if !self.cfg.contains(key.row, key.col) {
            debug!("ignoring paint outside grid at {}", key);
            return false;
        }

        match self.tool.paint_kind() {
            Some(kind) => {
                self.draft.cells.insert(key, Cell::new(kind));
            }
            None => {
                self.draft.cells.remove(&key);
            }
        }
        self.stroke.record_paint();
        true
    }

    /// Pointer pressed over a cell: start a stroke and paint it
    pub fn pointer_down(&mut self, key: CellKey) {
        self.stroke.begin(key);
        self.paint_cell(key);
    }

    /// Pointer moved onto a cell; paints only while a stroke is active
    pub fn pointer_enter(&mut self, key: CellKey) {
        if self.stroke.enter(key) {
            self.paint_cell(key);
        }
    }

    /// Pointer released anywhere: end the stroke
    ///
    /// Pushes one history entry for the whole stroke if it painted anything and
    /// returns the number of paints, otherwise `None`.
    pub fn pointer_up(&mut self) -> Option<usize> {
        let painted = self.stroke.finish()?;
        debug!("stroke finished with {} paints using {}", painted, self.tool);
        self.push_history();
        Some(painted)
    }

    // ----- History -----

    fn push_history(&mut self) {
        self.history.push(Snapshot {
            cfg: self.cfg,
            map: self.draft.clone(),
        });
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.cfg = snapshot.cfg;
        self.draft = snapshot.map;
        self.stroke.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                debug!("undo -> index {}", self.history.index());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                debug!("redo -> index {}", self.history.index());
                true
            }
            None => false,
        }
    }

    // ----- Draft / origin -----

    /// What the draft would be with every unsaved edit discarded
    pub fn baseline(&self) -> MapData {
        MapData::merged_over(&self.slot_cells, &self.origin)
    }

    /// Whether discarding the draft would change anything
    pub fn can_reset_draft(&self) -> bool {
        self.draft != self.baseline()
    }

    /// Replace the draft with the baseline, as an undoable step
    pub fn reset_draft(&mut self) {
        self.draft = self.baseline();
        self.stroke.clear();
        self.push_history();
        info!("Draft of area {} reset to the saved layout", self.area_id);
    }

    // ----- Persistence -----

    /// Body for the map update request
    pub fn save_payload(&self) -> MapUpdate {
        MapUpdate {
            map_rows: self.cfg.rows,
            map_cols: self.cfg.cols,
            cell_size: self.cfg.cell_size,
            map_data: self.draft.clone(),
        }
    }

    /// Record a successful save: the draft becomes the origin and the new undo floor
    ///
    /// The backend rebuilds the area's slots from the saved parking cells, so
    /// the slot list is rebuilt the same way.
    pub fn mark_saved(&mut self) {
        self.slots = slots_after_save(&self.slots, &self.draft);
        self.slot_cells = slots_to_cells(&self.slots);
        self.origin = self.draft.clone();
        self.history.reset(Snapshot {
            cfg: self.cfg,
            map: self.draft.clone(),
        });
        self.stroke.clear();
        info!("Area {} saved, history collapsed", self.area_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellKind;

    fn editor() -> EditorState {
        EditorState::new(1, GridConfig::new(10, 12, 30), MapData::new(), Vec::new(), Tool::Blocked)
    }

    #[test]
    fn history_matches_display_after_load() {
        let editor = editor();
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.history().current().map, *editor.draft());
        assert_eq!(editor.history().current().cfg, *editor.cfg());
    }

    #[test]
    fn paint_outside_grid_is_ignored() {
        let mut editor = editor();
        assert!(!editor.paint_cell(CellKey::new(10, 0)));
        assert!(!editor.paint_cell(CellKey::new(0, 12)));
        assert!(editor.draft().is_empty());
        assert!(!editor.stroke().dirty);
    }

    #[test]
    fn kind_paint_drops_slot_name() {
        let slots = vec![Slot {
            id: 1,
            row: 0,
            col: 0,
            code: "A1".into(),
            vehicle_type_allowed: "car".into(),
        }];
        let mut editor = EditorState::new(1, GridConfig::default(), MapData::new(), slots, Tool::ParkingBike);
        editor.paint_cell(CellKey::new(0, 0));
        assert_eq!(editor.draft().get(CellKey::new(0, 0)), Some(&Cell::new(CellKind::ParkingBike)));
    }

    #[test]
    fn undo_mid_stroke_drops_the_stroke() {
        let mut editor = editor();
        editor.pointer_down(CellKey::new(0, 0));
        editor.pointer_up();
        editor.pointer_down(CellKey::new(1, 1));
        assert!(editor.undo());
        assert!(!editor.stroke().is_dragging);
        assert_eq!(editor.pointer_up(), None);
        assert!(editor.draft().is_empty());
        assert!(editor.can_redo());
    }

    #[test]
    fn save_payload_carries_cfg_and_draft() {
        let mut editor = editor();
        editor.pointer_down(CellKey::new(2, 2));
        editor.pointer_up();
        let payload = editor.save_payload();
        assert_eq!((payload.map_rows, payload.map_cols, payload.cell_size), (10, 12, 30));
        assert_eq!(payload.map_data, *editor.draft());
    }
}
