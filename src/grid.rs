use serde::{Deserialize, Serialize};

pub const MIN_DIMENSION: u32 = 3;
pub const MAX_DIMENSION: u32 = 200;
pub const MIN_CELL_SIZE: u32 = 16;
pub const MAX_CELL_SIZE: u32 = 120;

pub const DEFAULT_ROWS: u32 = 10;
pub const DEFAULT_COLS: u32 = 12;
pub const DEFAULT_CELL_SIZE: u32 = 30;

/// Grid dimensions of a parking area map
/// Every field is kept inside its clamped range; out-of-range input is clamped, never rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub rows: u32,
    pub cols: u32,
    pub cell_size: u32,
}

impl GridConfig {
    /// Create a config, clamping each field into its valid range
    pub fn new(rows: i64, cols: i64, cell_size: i64) -> Self {
        GridConfig {
            rows: clamp_i64(rows, MIN_DIMENSION, MAX_DIMENSION),
            cols: clamp_i64(cols, MIN_DIMENSION, MAX_DIMENSION),
            cell_size: clamp_i64(cell_size, MIN_CELL_SIZE, MAX_CELL_SIZE),
        }
    }

    /// Build from optional backend values, falling back to the editor defaults
    pub fn from_backend(rows: Option<i64>, cols: Option<i64>, cell_size: Option<i64>) -> Self {
        Self::new(
            rows.unwrap_or(DEFAULT_ROWS as i64),
            cols.unwrap_or(DEFAULT_COLS as i64),
            cell_size.unwrap_or(DEFAULT_CELL_SIZE as i64),
        )
    }

    /// Same config with new rows/cols (cell size untouched)
    pub fn with_dimensions(&self, rows: u32, cols: u32) -> Self {
        GridConfig {
            rows: rows.clamp(MIN_DIMENSION, MAX_DIMENSION),
            cols: cols.clamp(MIN_DIMENSION, MAX_DIMENSION),
            cell_size: self.cell_size,
        }
    }

    /// Check if (row, col) lies inside the grid
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row < self.rows && col < self.cols
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

fn clamp_i64(value: i64, min: u32, max: u32) -> u32 {
    value.clamp(min as i64, max as i64) as u32
}

/// Parse a raw rows/cols input the way the dimension fields accept it
///
/// The text is read as a number and truncated toward zero, then clamped to
/// `[MIN_DIMENSION, MAX_DIMENSION]`. Anything that does not read as a finite
/// number (empty text, "abc", "inf", "NaN") keeps `current`.
pub fn clamp_dimension(raw: &str, current: u32) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => {
            let truncated = n.trunc();
            if truncated <= MIN_DIMENSION as f64 {
                MIN_DIMENSION
            } else if truncated >= MAX_DIMENSION as f64 {
                MAX_DIMENSION
            } else {
                truncated as u32
            }
        }
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_every_field() {
        let cfg = GridConfig::new(1, 500, 4);
        assert_eq!(cfg.rows, MIN_DIMENSION);
        assert_eq!(cfg.cols, MAX_DIMENSION);
        assert_eq!(cfg.cell_size, MIN_CELL_SIZE);

        let cfg = GridConfig::new(-20, 7, 1000);
        assert_eq!(cfg.rows, MIN_DIMENSION);
        assert_eq!(cfg.cols, 7);
        assert_eq!(cfg.cell_size, MAX_CELL_SIZE);
    }

    #[test]
    fn backend_defaults_apply_when_missing() {
        let cfg = GridConfig::from_backend(None, None, None);
        assert_eq!(cfg, GridConfig::default());

        let cfg = GridConfig::from_backend(Some(20), None, Some(36));
        assert_eq!((cfg.rows, cfg.cols, cfg.cell_size), (20, 12, 36));
    }

    #[test]
    fn clamp_dimension_truncates_and_clamps() {
        assert_eq!(clamp_dimension("15", 10), 15);
        assert_eq!(clamp_dimension(" 15.9 ", 10), 15);
        assert_eq!(clamp_dimension("-4", 10), MIN_DIMENSION);
        assert_eq!(clamp_dimension("2.99", 10), MIN_DIMENSION);
        assert_eq!(clamp_dimension("9999", 10), MAX_DIMENSION);
        assert_eq!(clamp_dimension("1e9", 10), MAX_DIMENSION);
    }

    #[test]
    fn clamp_dimension_keeps_current_on_garbage() {
        assert_eq!(clamp_dimension("", 10), 10);
        assert_eq!(clamp_dimension("abc", 42), 42);
        assert_eq!(clamp_dimension("inf", 42), 42);
        assert_eq!(clamp_dimension("NaN", 42), 42);
    }

    #[test]
    fn contains_uses_half_open_bounds() {
        let cfg = GridConfig::new(4, 5, 30);
        assert!(cfg.contains(0, 0));
        assert!(cfg.contains(3, 4));
        assert!(!cfg.contains(4, 0));
        assert!(!cfg.contains(0, 5));
        assert_eq!(cfg.cell_count(), 20);
    }
}
