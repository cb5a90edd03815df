pub mod action_log;
pub mod api;
pub mod cell;
pub mod config;
pub mod editor;
pub mod grid;
pub mod history;
pub mod map_data;
pub mod session;
pub mod shortcuts;
pub mod slot;
pub mod stroke;

pub use api::{HttpApi, ParkingApi, SaveOutcome};
pub use cell::{Cell, CellKey, CellKind, Tool};
pub use editor::EditorState;
pub use grid::GridConfig;
pub use map_data::MapData;
pub use session::Session;
pub use slot::Slot;
