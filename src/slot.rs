use crate::cell::{Cell, CellKey, CellKind};
use crate::map_data::MapData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of lost slots listed by name in a resize warning
pub const WARNING_PREVIEW_LIMIT: usize = 8;

/// Persisted parking slot, owned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: u64,
    pub row: u32,
    pub col: u32,
    pub code: String,
    #[serde(default)]
    pub vehicle_type_allowed: String,
}

impl Slot {
    pub fn key(&self) -> CellKey {
        CellKey::new(self.row, self.col)
    }

    /// Parking kind used to draw this slot
    /// Motorbike slots are bike parking, every other vehicle type is car parking
    pub fn cell_kind(&self) -> CellKind {
        if self.vehicle_type_allowed.eq_ignore_ascii_case("motorbike") {
            CellKind::ParkingBike
        } else {
            CellKind::ParkingCar
        }
    }
}

/// Seed cells for persisted slots, named after the slot code
pub fn slots_to_cells(slots: &[Slot]) -> BTreeMap<CellKey, Cell> {
    slots
        .iter()
        .map(|slot| (slot.key(), Cell::named(slot.cell_kind(), slot.code.clone())))
        .collect()
}

/// Slot list the backend holds once `map` has been saved
///
/// Every PARKING_* cell becomes a slot at its key: an existing slot there keeps
/// its id and takes the cell's name as code when it has one, a new slot is
/// coded by the name or `S{row}-{col}` and gets id 0 until the next load.
/// Slots with no parking cell left are dropped.
pub fn slots_after_save(previous: &[Slot], map: &MapData) -> Vec<Slot> {
    map.cells
        .iter()
        .filter(|(_, cell)| cell.kind.is_parking())
        .map(|(key, cell)| {
            let existing = previous.iter().find(|slot| slot.key() == *key);
            let name = cell.name.as_deref().filter(|name| !name.is_empty());
            let code = match (name, existing) {
                (Some(name), _) => name.to_string(),
                (None, Some(slot)) => slot.code.clone(),
                (None, None) => format!("S{}-{}", key.row, key.col),
            };
            let vehicle = if cell.kind == CellKind::ParkingBike { "motorbike" } else { "car" };
            Slot {
                id: existing.map_or(0, |slot| slot.id),
                row: key.row,
                col: key.col,
                code,
                vehicle_type_allowed: vehicle.to_string(),
            }
        })
        .collect()
}

/// Slots that would fall outside a `rows` x `cols` grid
pub fn slots_out_of_grid(slots: &[Slot], rows: u32, cols: u32) -> Vec<&Slot> {
    slots
        .iter()
        .filter(|slot| slot.row >= rows || slot.col >= cols)
        .collect()
}

/// Confirmation needed before a resize that drops persisted slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeWarning {
    pub rows: u32,
    pub cols: u32,
    /// Total number of slots outside the new grid
    pub lost: usize,
    /// Up to `WARNING_PREVIEW_LIMIT` examples as (code, row, col)
    pub preview: Vec<(String, u32, u32)>,
}

impl ResizeWarning {
    /// Build a warning, or `None` when no slot is lost
    pub fn for_resize(slots: &[Slot], rows: u32, cols: u32) -> Option<Self> {
        let lost = slots_out_of_grid(slots, rows, cols);
        if lost.is_empty() {
            return None;
        }
        let preview = lost
            .iter()
            .take(WARNING_PREVIEW_LIMIT)
            .map(|slot| (slot.code.clone(), slot.row, slot.col))
            .collect();
        Some(ResizeWarning {
            rows,
            cols,
            lost: lost.len(),
            preview,
        })
    }

    /// Examples as "CODE(row-col), ..." with a trailing ", ..." when truncated
    pub fn preview_text(&self) -> String {
        let mut text = self
            .preview
            .iter()
            .map(|(code, row, col)| format!("{}({}-{})", code, row, col))
            .collect::<Vec<_>>()
            .join(", ");
        if self.lost > self.preview.len() {
            text.push_str(", ...");
        }
        text
    }
}

impl fmt::Display for ResizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Shrinking the map to {}x{} will remove {} slot(s) outside the new grid.\n\nFor example: {}\n\nContinue?",
            self.rows,
            self.cols,
            self.lost,
            self.preview_text()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: u64, row: u32, col: u32, code: &str, vehicle: &str) -> Slot {
        Slot {
            id,
            row,
            col,
            code: code.to_string(),
            vehicle_type_allowed: vehicle.to_string(),
        }
    }

    #[test]
    fn saved_parking_cells_become_the_slot_list() {
        let previous = vec![slot(7, 0, 0, "A1", "car"), slot(8, 5, 5, "A2", "car")];
        let mut map = MapData::new();
        map.cells.insert(CellKey::new(0, 0), Cell::new(CellKind::ParkingBike));
        map.cells.insert(CellKey::new(2, 3), Cell::named(CellKind::ParkingCar, "B9"));
        map.cells.insert(CellKey::new(4, 1), Cell::new(CellKind::ParkingCar));
        map.cells.insert(CellKey::new(1, 1), Cell::new(CellKind::Lane));

        let slots = slots_after_save(&previous, &map);

        assert_eq!(
            slots,
            vec![
                slot(7, 0, 0, "A1", "motorbike"),
                slot(0, 2, 3, "B9", "car"),
                slot(0, 4, 1, "S4-1", "car"),
            ]
        );
    }

    #[test]
    fn motorbike_slots_become_bike_cells() {
        let slots = vec![slot(1, 0, 0, "A1", "car"), slot(2, 0, 1, "M1", "MotorBike"), slot(3, 0, 2, "T1", "")];
        let cells = slots_to_cells(&slots);
        assert_eq!(cells[&CellKey::new(0, 0)], Cell::named(CellKind::ParkingCar, "A1"));
        assert_eq!(cells[&CellKey::new(0, 1)], Cell::named(CellKind::ParkingBike, "M1"));
        assert_eq!(cells[&CellKey::new(0, 2)], Cell::named(CellKind::ParkingCar, "T1"));
    }

    #[test]
    fn no_warning_when_nothing_is_lost() {
        let slots = vec![slot(1, 2, 2, "A1", "car")];
        assert!(ResizeWarning::for_resize(&slots, 3, 3).is_none());
    }

    #[test]
    fn warning_preview_is_capped() {
        let slots: Vec<Slot> = (0..10).map(|i| slot(i, 5, i as u32, &format!("S{}", i), "car")).collect();
        let warning = ResizeWarning::for_resize(&slots, 4, 20).unwrap();
        assert_eq!(warning.lost, 10);
        assert_eq!(warning.preview.len(), WARNING_PREVIEW_LIMIT);
        assert!(warning.preview_text().starts_with("S0(5-0), S1(5-1)"));
        assert!(warning.preview_text().ends_with(", ..."));
        assert!(warning.to_string().contains("remove 10 slot(s)"));
    }

    #[test]
    fn column_overflow_counts_too() {
        let slots = vec![slot(1, 0, 7, "A1", "car"), slot(2, 1, 1, "A2", "car")];
        let warning = ResizeWarning::for_resize(&slots, 10, 5).unwrap();
        assert_eq!(warning.lost, 1);
        assert_eq!(warning.preview_text(), "A1(0-7)");
    }
}
