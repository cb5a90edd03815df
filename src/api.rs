//! Backend contract for parking areas, slots and maps.
//!
//! [`ParkingApi`] is the seam the session talks to; [`HttpApi`] is the real
//! implementation over blocking reqwest. Saving reports one of three explicit
//! outcomes instead of an error so callers handle conflicts exhaustively.

use crate::config::ApiConfig;
use crate::map_data::MapData;
use crate::slot::Slot;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shown when a failed save carries no server message
pub const SAVE_FALLBACK_MESSAGE: &str = "Could not save the parking map";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingArea {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slot_count: u32,
    #[serde(default)]
    pub current_count: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// `GET /parking/areas/{id}/map`
/// `map_data` stays raw: it may be an object, a JSON string, or null
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapResponse {
    #[serde(default)]
    pub map_rows: Option<i64>,
    #[serde(default)]
    pub map_cols: Option<i64>,
    #[serde(default)]
    pub cell_size: Option<i64>,
    #[serde(default)]
    pub map_data: Value,
}

/// `PUT /parking/areas/{id}/map` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapUpdate {
    pub map_rows: u32,
    pub map_cols: u32,
    pub cell_size: u32,
    pub map_data: MapData,
}

/// `GET /parking/areas/{id}/can-edit-map`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPermission {
    pub can_edit: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub occupied_count: u32,
}

/// Result of a map save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The area is not editable right now (occupied slots)
    Conflict {
        reason: String,
        occupied_count: Option<u32>,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("not authorized, check the API token")]
    Unauthorized,
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },
}

impl ApiError {
    /// Message for the user, preferring the server's own wording
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { detail, .. } if !detail.is_empty() => detail.clone(),
            other => other.to_string(),
        }
    }
}

pub trait ParkingApi {
    fn list_areas(&self) -> Result<Vec<ParkingArea>, ApiError>;
    fn get_map(&self, area_id: u64) -> Result<MapResponse, ApiError>;
    fn list_slots(&self, area_id: u64) -> Result<Vec<Slot>, ApiError>;
    fn can_edit_map(&self, area_id: u64) -> Result<EditPermission, ApiError>;
    fn update_map(&self, area_id: u64, update: &MapUpdate) -> SaveOutcome;
}

/// Blocking HTTP client for the parking backend
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    include_inactive: bool,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            include_inactive: false,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut api = Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))?;
        api.token = config.token.clone().filter(|t| !t.is_empty());
        api.include_inactive = config.include_inactive;
        Ok(api)
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_inactive_areas(mut self, include: bool) -> Self {
        self.include_inactive = include;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = check_status(self.authorized(request).send()?)?;
        Ok(response.json::<T>()?)
    }
}

impl ParkingApi for HttpApi {
    fn list_areas(&self) -> Result<Vec<ParkingArea>, ApiError> {
        let mut request = self.client.get(self.url("/parking/areas"));
        if !self.include_inactive {
            request = request.query(&[("is_active", "true")]);
        }
        let areas: Vec<ParkingArea> = self.get_json(request)?;
        debug!("loaded {} parking areas", areas.len());
        Ok(areas)
    }

    fn get_map(&self, area_id: u64) -> Result<MapResponse, ApiError> {
        self.get_json(self.client.get(self.url(&format!("/parking/areas/{}/map", area_id))))
    }

    fn list_slots(&self, area_id: u64) -> Result<Vec<Slot>, ApiError> {
        let request = self
            .client
            .get(self.url("/parking/slots"))
            .query(&[("parking_area_id", area_id)]);
        self.get_json(request)
    }

    fn can_edit_map(&self, area_id: u64) -> Result<EditPermission, ApiError> {
        self.get_json(self.client.get(self.url(&format!("/parking/areas/{}/can-edit-map", area_id))))
    }

    fn update_map(&self, area_id: u64, update: &MapUpdate) -> SaveOutcome {
        let request = self
            .client
            .put(self.url(&format!("/parking/areas/{}/map", area_id)))
            .json(update);

        let response = match self.authorized(request).send() {
            Ok(response) => response,
            Err(e) => {
                warn!("Saving map of area {} failed: {}", area_id, e);
                return SaveOutcome::Failed {
                    message: e.to_string(),
                };
            }
        };

        let status = response.status();
        if status.is_success() {
            info!("Saved map of area {} ({}x{}, {} cells)", area_id, update.map_rows, update.map_cols, update.map_data.cells.len());
            return SaveOutcome::Saved;
        }

        let detail = read_detail(response);
        if status == StatusCode::CONFLICT {
            warn!("Map of area {} is locked: {}", area_id, detail.as_deref().unwrap_or("-"));
            let occupied_count = match self.can_edit_map(area_id) {
                Ok(permission) => Some(permission.occupied_count),
                Err(e) => {
                    debug!("could not read edit permission for area {}: {}", area_id, e);
                    None
                }
            };
            return SaveOutcome::Conflict {
                reason: detail.unwrap_or_else(|| SAVE_FALLBACK_MESSAGE.to_string()),
                occupied_count,
            };
        }

        warn!("Saving map of area {} failed with {}", area_id, status);
        SaveOutcome::Failed {
            message: detail.unwrap_or_else(|| SAVE_FALLBACK_MESSAGE.to_string()),
        }
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    let detail = read_detail(response).unwrap_or_else(|| status.to_string());
    Err(ApiError::Status {
        status: status.as_u16(),
        detail,
    })
}

/// `detail` from an error body, or the raw body text when it is not that shape
fn read_detail(response: Response) -> Option<String> {
    let text = response.text().ok()?;
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(body)) => match body.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(text),
        },
        _ => Some(text),
    }
}
