use crate::cell::{Cell, CellKey, CellKind};
use crate::grid::GridConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Sparse layout of a parking area
///
/// Only painted cells have an entry. `paths` is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    #[serde(default)]
    pub cells: BTreeMap<CellKey, Cell>,
    #[serde(default)]
    pub paths: Vec<Value>,
}

impl MapData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `map_data` as the backend delivers it
    ///
    /// The backend may send an object, a JSON-encoded string of that object,
    /// or null. Anything unreadable becomes an empty map; individual cells
    /// with a bad key or an unknown kind are dropped.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(inner @ Value::Object(_)) => Self::from_object(&inner),
                Ok(other) => {
                    warn!("map_data string did not hold an object ({}), using empty map", type_name(&other));
                    Self::default()
                }
                Err(e) => {
                    warn!("Invalid map_data JSON: {}", e);
                    Self::default()
                }
            },
            Value::Object(_) => Self::from_object(value),
            Value::Null => Self::default(),
            other => {
                warn!("Unexpected map_data type {}, using empty map", type_name(other));
                Self::default()
            }
        }
    }

    fn from_object(value: &Value) -> Self {
        let mut map = MapData::default();

        if let Some(cells) = value.get("cells").and_then(Value::as_object) {
            for (raw_key, raw_cell) in cells {
                let key = match raw_key.parse::<CellKey>() {
                    Ok(key) => key,
                    Err(e) => {
                        warn!("Skipping cell: {}", e);
                        continue;
                    }
                };
                match parse_cell(raw_cell) {
                    Some(cell) => {
                        map.cells.insert(key, cell);
                    }
                    None => warn!("Skipping cell {} with unusable value {}", key, raw_cell),
                }
            }
        }

        if let Some(paths) = value.get("paths").and_then(Value::as_array) {
            map.paths = paths.clone();
        }

        map
    }

    /// Get the cell at a key, if painted
    pub fn get(&self, key: CellKey) -> Option<&Cell> {
        self.cells.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Remove every cell outside `[0, rows) x [0, cols)`
    /// Returns the number of removed cells
    pub fn prune_out_of_grid(&mut self, rows: u32, cols: u32) -> usize {
        let before = self.cells.len();
        self.cells.retain(|key, _| key.row < rows && key.col < cols);
        before - self.cells.len()
    }

    /// Baseline layout: slot cells overlaid by the persisted cells
    /// (persisted cells win when both define a key)
    pub fn merged_over(slot_cells: &BTreeMap<CellKey, Cell>, origin: &MapData) -> MapData {
        let mut cells = slot_cells.clone();
        for (key, cell) in &origin.cells {
            cells.insert(*key, cell.clone());
        }
        MapData {
            cells,
            paths: origin.paths.clone(),
        }
    }

    /// Number of cells per kind, in `CellKind::ALL` order
    pub fn kind_counts(&self) -> Vec<(CellKind, usize)> {
        CellKind::ALL
            .into_iter()
            .map(|kind| (kind, self.cells.values().filter(|c| c.kind == kind).count()))
            .collect()
    }

    /// Render the map as text, one line per row
    /// Empty cells are '.', painted cells use their kind glyph
    pub fn to_ascii(&self, cfg: &GridConfig) -> String {
        let mut result = String::with_capacity(cfg.cell_count() + cfg.rows as usize);
        for row in 0..cfg.rows {
            for col in 0..cfg.cols {
                let symbol = match self.get(CellKey::new(row, col)) {
                    Some(cell) => cell.kind.glyph(),
                    None => '.',
                };
                result.push(symbol);
            }
            result.push('\n');
        }
        result
    }
}

fn parse_cell(value: &Value) -> Option<Cell> {
    let object = value.as_object()?;
    let kind = object.get("kind").and_then(Value::as_str).and_then(CellKind::from_wire)?;
    let name = object.get("name").and_then(Value::as_str).map(str::to_string);
    Some(Cell { kind, name })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
