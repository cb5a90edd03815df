use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Coordinate of a grid cell, zero-based
///
/// The text form `"{row}-{col}"` is what the backend uses as the key of
/// `map_data.cells`, so that is how a key serializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: u32,
    pub col: u32,
}

impl CellKey {
    pub fn new(row: u32, col: u32) -> Self {
        CellKey { row, col }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cell key {0:?}, expected \"row-col\"")]
pub struct ParseCellKeyError(pub String);

impl FromStr for CellKey {
    type Err = ParseCellKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCellKeyError(s.to_string());
        let (row, col) = s.trim().split_once('-').ok_or_else(err)?;
        let row = parse_index(row).ok_or_else(err)?;
        let col = parse_index(col).ok_or_else(err)?;
        Ok(CellKey { row, col })
    }
}

/// Plain decimal digits only; a sign or leading zero would alias another key
fn parse_index(text: &str) -> Option<u32> {
    let plain = !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit())
        && (text == "0" || !text.starts_with('0'));
    if !plain {
        return None;
    }
    text.parse().ok()
}

impl Serialize for CellKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Layout primitive a painted cell represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellKind {
    ParkingCar,
    ParkingBike,
    Lane,
    Blocked,
    Entrance,
    Exit,
}

impl CellKind {
    pub const ALL: [CellKind; 6] = [
        CellKind::ParkingCar,
        CellKind::ParkingBike,
        CellKind::Lane,
        CellKind::Blocked,
        CellKind::Entrance,
        CellKind::Exit,
    ];

    /// Wire name used in `map_data`
    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::ParkingCar => "PARKING_CAR",
            CellKind::ParkingBike => "PARKING_BIKE",
            CellKind::Lane => "LANE",
            CellKind::Blocked => "BLOCKED",
            CellKind::Entrance => "ENTRANCE",
            CellKind::Exit => "EXIT",
        }
    }

    /// Parse a wire name, `None` for anything outside the closed set
    pub fn from_wire(name: &str) -> Option<Self> {
        CellKind::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CellKind::ParkingCar => "Car parking",
            CellKind::ParkingBike => "Motorbike parking",
            CellKind::Lane => "Lane",
            CellKind::Blocked => "Blocked",
            CellKind::Entrance => "Entrance",
            CellKind::Exit => "Exit",
        }
    }

    /// Short badge drawn inside a cell
    pub fn badge(&self) -> &'static str {
        match self {
            CellKind::ParkingCar => "CAR",
            CellKind::ParkingBike => "BIKE",
            CellKind::Lane => "WAY",
            CellKind::Blocked => "X",
            CellKind::Entrance => "IN",
            CellKind::Exit => "OUT",
        }
    }

    /// Single character used by text renderings of a map
    pub fn glyph(&self) -> char {
        match self {
            CellKind::ParkingCar => 'C',
            CellKind::ParkingBike => 'B',
            CellKind::Lane => '=',
            CellKind::Blocked => '#',
            CellKind::Entrance => '>',
            CellKind::Exit => '<',
        }
    }

    /// Fill colour (r, g, b)
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            CellKind::ParkingCar => (0xe9, 0xd5, 0xff),
            CellKind::ParkingBike => (0xbb, 0xf7, 0xd0),
            CellKind::Lane => (0xfd, 0xe6, 0x8a),
            CellKind::Blocked => (0x11, 0x18, 0x27),
            CellKind::Entrance => (0x93, 0xc5, 0xfd),
            CellKind::Exit => (0xfe, 0xca, 0xca),
        }
    }

    pub fn is_parking(&self) -> bool {
        matches!(self, CellKind::ParkingCar | CellKind::ParkingBike)
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A painted cell; empty cells have no entry at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Cell {
    pub fn new(kind: CellKind) -> Self {
        Cell { kind, name: None }
    }

    pub fn named(kind: CellKind, name: impl Into<String>) -> Self {
        Cell {
            kind,
            name: Some(name.into()),
        }
    }
}

/// Editing tool selected in the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tool {
    ParkingCar,
    ParkingBike,
    RoadPath,
    Blocked,
    Entrance,
    Exit,
    Eraser,
}

impl Tool {
    /// Toolbar order
    pub const ALL: [Tool; 7] = [
        Tool::ParkingCar,
        Tool::ParkingBike,
        Tool::RoadPath,
        Tool::Blocked,
        Tool::Entrance,
        Tool::Exit,
        Tool::Eraser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::ParkingCar => "PARKING_CAR",
            Tool::ParkingBike => "PARKING_BIKE",
            Tool::RoadPath => "ROAD_PATH",
            Tool::Blocked => "BLOCKED",
            Tool::Entrance => "ENTRANCE",
            Tool::Exit => "EXIT",
            Tool::Eraser => "ERASER",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Tool::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Kind written by this tool; `None` means the tool erases
    ///
    /// The road tool paints `LANE`, not a `ROAD_PATH` kind.
    pub fn paint_kind(&self) -> Option<CellKind> {
        match self {
            Tool::ParkingCar => Some(CellKind::ParkingCar),
            Tool::ParkingBike => Some(CellKind::ParkingBike),
            Tool::RoadPath => Some(CellKind::Lane),
            Tool::Blocked => Some(CellKind::Blocked),
            Tool::Entrance => Some(CellKind::Entrance),
            Tool::Exit => Some(CellKind::Exit),
            Tool::Eraser => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::ParkingCar => "Car parking (drag to paint)",
            Tool::ParkingBike => "Motorbike parking (drag to paint)",
            Tool::RoadPath => "Road (drag to paint a lane)",
            Tool::Blocked => "Obstacle (drag to paint)",
            Tool::Entrance => "Entrance (drag to paint)",
            Tool::Exit => "Exit (drag to paint)",
            Tool::Eraser => "Eraser (drag to clear)",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
