mod common;

use common::{key, spawn_server};
use parkmap::api::{ApiError, MapUpdate, DEFAULT_TIMEOUT, SAVE_FALLBACK_MESSAGE};
use parkmap::{Cell, CellKind, HttpApi, MapData, ParkingApi, SaveOutcome};
use serde_json::{json, Value};
use std::time::Duration;

fn update() -> MapUpdate {
    let mut map = MapData::new();
    map.cells.insert(key(1, 2), Cell::new(CellKind::Lane));
    map.cells.insert(key(0, 0), Cell::named(CellKind::ParkingCar, "A1"));
    MapUpdate {
        map_rows: 10,
        map_cols: 12,
        cell_size: 30,
        map_data: map,
    }
}

#[test]
fn area_list_asks_for_active_areas_with_token() {
    let (base, server) = spawn_server(1, |_| {
        (200, json!([{ "id": 1, "name": "Main lot", "slot_count": 40 }, { "id": 2, "name": "Roof" }]).to_string())
    });
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap().with_token("secret");

    let areas = api.list_areas().unwrap();
    assert_eq!(areas.len(), 2);
    assert_eq!(areas[0].slot_count, 40);
    assert_eq!(areas[1].name, "Roof");

    let seen = server.join().unwrap();
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].url, "/parking/areas?is_active=true");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret"));
}

#[test]
fn inactive_areas_drop_the_filter() {
    let (base, server) = spawn_server(1, |_| (200, "[]".to_string()));
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap().with_inactive_areas(true);

    assert!(api.list_areas().unwrap().is_empty());
    let seen = server.join().unwrap();
    assert_eq!(seen[0].url, "/parking/areas");
    assert_eq!(seen[0].authorization, None);
}

#[test]
fn map_with_string_map_data() {
    let encoded = json!({ "cells": { "3-4": { "kind": "EXIT" } }, "paths": [] }).to_string();
    let (base, server) = spawn_server(1, move |_| {
        (
            200,
            json!({ "parking_area_id": 7, "map_rows": 6, "map_cols": 8, "cell_size": 24, "map_data": encoded }).to_string(),
        )
    });
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap();

    let response = api.get_map(7).unwrap();
    assert_eq!((response.map_rows, response.map_cols, response.cell_size), (Some(6), Some(8), Some(24)));
    let map = MapData::from_value(&response.map_data);
    assert_eq!(map.get(key(3, 4)), Some(&Cell::new(CellKind::Exit)));

    assert_eq!(server.join().unwrap()[0].url, "/parking/areas/7/map");
}

#[test]
fn slots_are_filtered_by_area() {
    let (base, server) = spawn_server(1, |_| {
        (
            200,
            json!([
                { "id": 11, "row": 0, "col": 1, "code": "A1", "vehicle_type_allowed": "car", "status": "free" },
                { "id": 12, "row": 0, "col": 2, "code": "M1", "vehicle_type_allowed": "MOTORBIKE" }
            ])
            .to_string(),
        )
    });
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap();

    let slots = api.list_slots(3).unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[1].cell_kind(), CellKind::ParkingBike);
    assert_eq!(server.join().unwrap()[0].url, "/parking/slots?parking_area_id=3");
}

#[test]
fn unauthorized_get_is_reported() {
    let (base, server) = spawn_server(1, |_| (401, json!({ "detail": "Not authenticated" }).to_string()));
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap();

    assert!(matches!(api.get_map(1), Err(ApiError::Unauthorized)));
    server.join().unwrap();
}

#[test]
fn not_found_carries_detail() {
    let (base, server) = spawn_server(1, |_| (404, json!({ "detail": "ParkingArea not found" }).to_string()));
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap();

    match api.get_map(99) {
        Err(err @ ApiError::Status { status: 404, .. }) => {
            assert_eq!(err.user_message(), "ParkingArea not found");
        }
        other => panic!("expected 404, got {:?}", other),
    }
    server.join().unwrap();
}

#[test]
fn save_puts_the_payload() {
    let (base, server) = spawn_server(1, |_| (200, json!({ "map_rows": 10 }).to_string()));
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap().with_token("t0k");

    assert_eq!(api.update_map(5, &update()), SaveOutcome::Saved);

    let seen = server.join().unwrap();
    assert_eq!(seen[0].method, "PUT");
    assert_eq!(seen[0].url, "/parking/areas/5/map");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer t0k"));
    let body: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(
        body,
        json!({
            "map_rows": 10,
            "map_cols": 12,
            "cell_size": 30,
            "map_data": {
                "cells": {
                    "0-0": { "kind": "PARKING_CAR", "name": "A1" },
                    "1-2": { "kind": "LANE" }
                },
                "paths": []
            }
        })
    );
}

#[test]
fn conflict_reads_occupied_count() {
    let (base, server) = spawn_server(2, |request| {
        if request.method == "PUT" {
            (409, json!({ "detail": "Area has 2 occupied slots" }).to_string())
        } else {
            (
                200,
                json!({ "can_edit": false, "reason": "occupied", "occupied_count": 2 }).to_string(),
            )
        }
    });
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap();

    assert_eq!(
        api.update_map(4, &update()),
        SaveOutcome::Conflict {
            reason: "Area has 2 occupied slots".to_string(),
            occupied_count: Some(2),
        }
    );

    let seen = server.join().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].method, "GET");
    assert_eq!(seen[1].url, "/parking/areas/4/can-edit-map");
}

#[test]
fn conflict_without_permission_endpoint() {
    let (base, server) = spawn_server(2, |request| {
        if request.method == "PUT" {
            (409, String::new())
        } else {
            (500, "oops".to_string())
        }
    });
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap();

    assert_eq!(
        api.update_map(4, &update()),
        SaveOutcome::Conflict {
            reason: SAVE_FALLBACK_MESSAGE.to_string(),
            occupied_count: None,
        }
    );
    server.join().unwrap();
}

#[test]
fn server_error_uses_detail() {
    let (base, server) = spawn_server(1, |_| (422, json!({ "detail": "map_rows must be positive" }).to_string()));
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap();

    assert_eq!(
        api.update_map(4, &update()),
        SaveOutcome::Failed {
            message: "map_rows must be positive".to_string(),
        }
    );
    server.join().unwrap();
}

#[test]
fn server_error_without_body_uses_fallback() {
    let (base, server) = spawn_server(1, |_| (500, String::new()));
    let api = HttpApi::new(&base, DEFAULT_TIMEOUT).unwrap();

    assert_eq!(
        api.update_map(4, &update()),
        SaveOutcome::Failed {
            message: SAVE_FALLBACK_MESSAGE.to_string(),
        }
    );
    server.join().unwrap();
}

#[test]
fn unreachable_backend_fails_the_save() {
    // Bind then drop to get a port nobody listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let api = HttpApi::new(&format!("http://127.0.0.1:{}", port), Duration::from_secs(2)).unwrap();

    match api.update_map(1, &update()) {
        SaveOutcome::Failed { message } => assert!(!message.is_empty()),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(matches!(api.list_areas(), Err(ApiError::Transport(_))));
}
