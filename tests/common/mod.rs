#![allow(dead_code)]

use parkmap::api::{ApiError, EditPermission, MapResponse, MapUpdate, ParkingApi, ParkingArea, SaveOutcome};
use parkmap::{CellKey, EditorState, GridConfig, MapData, Slot, Tool};
use std::cell::RefCell;
use std::io::Read;
use std::thread::{self, JoinHandle};

pub fn key(row: u32, col: u32) -> CellKey {
    CellKey::new(row, col)
}

pub fn slot(id: u64, row: u32, col: u32, code: &str, vehicle: &str) -> Slot {
    Slot {
        id,
        row,
        col,
        code: code.to_string(),
        vehicle_type_allowed: vehicle.to_string(),
    }
}

/// Editor on an empty origin map
pub fn editor(rows: i64, cols: i64, slots: Vec<Slot>) -> EditorState {
    EditorState::new(1, GridConfig::new(rows, cols, 30), MapData::new(), slots, Tool::RoadPath)
}

/// One full drag: press on the first key, enter the rest, release
pub fn stroke(editor: &mut EditorState, tool: Tool, keys: &[CellKey]) -> Option<usize> {
    editor.set_tool(tool);
    let (first, rest) = keys.split_first()?;
    editor.pointer_down(*first);
    for k in rest {
        editor.pointer_enter(*k);
    }
    editor.pointer_up()
}

/// Print the draft grid, handy when an assertion fails
pub fn show(editor: &EditorState) -> String {
    editor.draft().to_ascii(editor.cfg())
}

pub fn area(id: u64, name: &str) -> ParkingArea {
    ParkingArea {
        id,
        name: name.to_string(),
        slot_count: 0,
        current_count: 0,
        is_active: true,
    }
}

/// In-memory backend
pub struct MockApi {
    pub areas: Vec<ParkingArea>,
    pub map: MapResponse,
    pub slots: Vec<Slot>,
    pub permission: Option<EditPermission>,
    pub save_outcome: SaveOutcome,
    pub fail_loads: bool,
    pub saved: RefCell<Vec<(u64, MapUpdate)>>,
}

impl MockApi {
    pub fn new(map: MapResponse, slots: Vec<Slot>) -> Self {
        MockApi {
            areas: vec![area(1, "Main lot"), area(2, "Basement")],
            map,
            slots,
            permission: None,
            save_outcome: SaveOutcome::Saved,
            fail_loads: false,
            saved: RefCell::new(Vec::new()),
        }
    }

    fn down(&self) -> ApiError {
        ApiError::Status {
            status: 503,
            detail: "backend down".to_string(),
        }
    }
}

impl ParkingApi for MockApi {
    fn list_areas(&self) -> Result<Vec<ParkingArea>, ApiError> {
        if self.fail_loads {
            return Err(self.down());
        }
        Ok(self.areas.clone())
    }

    fn get_map(&self, _area_id: u64) -> Result<MapResponse, ApiError> {
        if self.fail_loads {
            return Err(self.down());
        }
        Ok(self.map.clone())
    }

    fn list_slots(&self, _area_id: u64) -> Result<Vec<Slot>, ApiError> {
        if self.fail_loads {
            return Err(self.down());
        }
        Ok(self.slots.clone())
    }

    fn can_edit_map(&self, _area_id: u64) -> Result<EditPermission, ApiError> {
        self.permission.clone().ok_or_else(|| self.down())
    }

    fn update_map(&self, area_id: u64, update: &MapUpdate) -> SaveOutcome {
        self.saved.borrow_mut().push((area_id, update.clone()));
        self.save_outcome.clone()
    }
}

/// Request seen by the test server
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub body: String,
    pub authorization: Option<String>,
}

/// Serve exactly `count` requests on a local port, answering with `handler`
/// Returns the base URL and a handle yielding the recorded requests
pub fn spawn_server<F>(count: usize, handler: F) -> (String, JoinHandle<Vec<Recorded>>)
where
    F: Fn(&Recorded) -> (u16, String) + Send + 'static,
{
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind test server");
    let addr = server.server_addr().to_ip().expect("ip listener");
    let base_url = format!("http://{}", addr);

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..count {
            let mut request = match server.recv() {
                Ok(request) => request,
                Err(_) => break,
            };
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let recorded = Recorded {
                method: request.method().to_string(),
                url: request.url().to_string(),
                body,
                authorization: request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_string()),
            };

            let (status, text) = handler(&recorded);
            let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                .expect("static header");
            let response = tiny_http::Response::from_string(text)
                .with_status_code(status)
                .with_header(header);
            let _ = request.respond(response);
            seen.push(recorded);
        }
        seen
    });

    (base_url, handle)
}
