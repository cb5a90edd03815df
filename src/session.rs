//! Editing session around one [`EditorState`].
//!
//! Keeps the area list and the selected area, and runs loads and saves as
//! ticketed requests: every area selection bumps a generation counter, and a
//! result that comes back for an older generation is dropped. The fetch side
//! ([`fetch_area`], [`ParkingApi::update_map`]) can run on any thread; results
//! are handed back to the session on the thread that owns it.

use crate::api::{ApiError, EditPermission, MapResponse, MapUpdate, ParkingApi, ParkingArea, SaveOutcome};
use crate::cell::Tool;
use crate::editor::EditorState;
use crate::slot::Slot;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub area_id: u64,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct LoadedArea {
    pub map: MapResponse,
    pub slots: Vec<Slot>,
    /// Best effort, `None` when the permission endpoint failed
    pub permission: Option<EditPermission>,
}

#[derive(Debug)]
pub struct LoadResult {
    pub ticket: LoadTicket,
    pub data: Result<LoadedArea, ApiError>,
}

#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub area_id: u64,
    pub generation: u64,
    pub update: MapUpdate,
}

/// Message for the user about the last load or save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
    /// Save refused because the area has occupied slots; resolve it in slot management
    Conflict {
        area_id: u64,
        reason: String,
        occupied_count: Option<u32>,
    },
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_) | Notice::Conflict { .. })
    }

    /// Area whose slot management view resolves this notice
    pub fn slot_management_area(&self) -> Option<u64> {
        match self {
            Notice::Conflict { area_id, .. } => Some(*area_id),
            _ => None,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Info(message) | Notice::Warning(message) | Notice::Error(message) => f.write_str(message),
            Notice::Conflict {
                area_id,
                reason,
                occupied_count,
            } => {
                write!(f, "{}", reason)?;
                if let Some(count) = occupied_count {
                    write!(f, " ({} occupied slot(s))", count)?;
                }
                write!(f, " Release them in slot management for area {} first.", area_id)
            }
        }
    }
}

/// Fetch everything the editor needs for one area
pub fn fetch_area<A: ParkingApi + ?Sized>(api: &A, ticket: LoadTicket) -> LoadResult {
    LoadResult {
        ticket,
        data: fetch_area_data(api, ticket.area_id),
    }
}

fn fetch_area_data<A: ParkingApi + ?Sized>(api: &A, area_id: u64) -> Result<LoadedArea, ApiError> {
    let map = api.get_map(area_id)?;
    let slots = api.list_slots(area_id)?;
    let permission = match api.can_edit_map(area_id) {
        Ok(permission) => Some(permission),
        Err(e) => {
            debug!("edit permission for area {} unavailable: {}", area_id, e);
            None
        }
    };
    Ok(LoadedArea { map, slots, permission })
}

#[derive(Debug)]
pub struct Session {
    areas: Vec<ParkingArea>,
    selected: Option<u64>,
    editor: Option<EditorState>,
    permission: Option<EditPermission>,
    tool: Tool,
    generation: u64,
    loading: bool,
    saving: bool,
    notice: Option<Notice>,
}

impl Session {
    pub fn new(tool: Tool) -> Self {
        Session {
            areas: Vec::new(),
            selected: None,
            editor: None,
            permission: None,
            tool,
            generation: 0,
            loading: false,
            saving: false,
            notice: None,
        }
    }

    pub fn areas(&self) -> &[ParkingArea] {
        &self.areas
    }

    pub fn selected_area(&self) -> Option<&ParkingArea> {
        let id = self.selected?;
        self.areas.iter().find(|area| area.id == id)
    }

    pub fn selected_area_id(&self) -> Option<u64> {
        self.selected
    }

    pub fn editor(&self) -> Option<&EditorState> {
        self.editor.as_ref()
    }

    /// Editor for input handling; `None` while a save is in flight
    pub fn editor_mut(&mut self) -> Option<&mut EditorState> {
        if self.saving {
            return None;
        }
        self.editor.as_mut()
    }

    pub fn permission(&self) -> Option<&EditPermission> {
        self.permission.as_ref()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        if let Some(editor) = self.editor.as_mut() {
            editor.set_tool(tool);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    fn set_notice(&mut self, notice: Notice) {
        match &notice {
            Notice::Error(_) | Notice::Conflict { .. } => warn!("{}", notice),
            _ => info!("{}", notice),
        }
        self.notice = Some(notice);
    }

    // ----- Areas -----

    /// Take the area list; selects the first area when nothing valid is selected
    pub fn set_areas(&mut self, result: Result<Vec<ParkingArea>, ApiError>) -> Option<LoadTicket> {
        match result {
            Ok(areas) => {
                self.areas = areas;
                let still_listed = self
                    .selected
                    .is_some_and(|id| self.areas.iter().any(|area| area.id == id));
                if still_listed {
                    return None;
                }
                let first = self.areas.first()?.id;
                Some(self.select_area(first))
            }
            Err(e) => {
                self.set_notice(Notice::Error(format!("Could not load parking areas: {}", e.user_message())));
                None
            }
        }
    }

    /// Select an area and start loading it
    ///
    /// Switching to another area discards the current editor; reselecting the
    /// same area keeps it until the reload lands.
    pub fn select_area(&mut self, area_id: u64) -> LoadTicket {
        if self.selected != Some(area_id) {
            self.editor = None;
            self.permission = None;
            self.selected = Some(area_id);
        }
        self.generation += 1;
        self.loading = true;
        debug!("loading area {} (generation {})", area_id, self.generation);
        LoadTicket {
            area_id,
            generation: self.generation,
        }
    }

    /// Reload the selected area; refused while a save is in flight
    pub fn reload(&mut self) -> Option<LoadTicket> {
        if self.saving {
            return None;
        }
        let id = self.selected?;
        Some(self.select_area(id))
    }

    /// Select the area `step` positions away in the list, wrapping around
    /// Refused while a save is in flight
    pub fn cycle_area(&mut self, step: isize) -> Option<LoadTicket> {
        if self.saving || self.areas.is_empty() {
            return None;
        }
        let len = self.areas.len() as isize;
        let current = self
            .selected
            .and_then(|id| self.areas.iter().position(|area| area.id == id))
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len) as usize;
        let id = self.areas[next].id;
        Some(self.select_area(id))
    }

    /// Apply a finished load; stale results are dropped
    /// Returns true if the result was current
    pub fn finish_load(&mut self, result: LoadResult) -> bool {
        if result.ticket.generation != self.generation {
            debug!(
                "dropping stale load of area {} (generation {}, current {})",
                result.ticket.area_id, result.ticket.generation, self.generation
            );
            return false;
        }
        self.loading = false;

        match result.data {
            Ok(loaded) => {
                let editor = EditorState::load(result.ticket.area_id, &loaded.map, loaded.slots, self.tool);
                self.editor = Some(editor);
                self.notice = None;
                if let Some(permission) = loaded.permission.as_ref().filter(|p| !p.can_edit) {
                    let reason = permission
                        .reason
                        .clone()
                        .unwrap_or_else(|| "The area has occupied slots.".to_string());
                    self.set_notice(Notice::Warning(format!(
                        "{} Saving will be refused until {} occupied slot(s) are released.",
                        reason, permission.occupied_count
                    )));
                }
                self.permission = loaded.permission;
            }
            Err(e) => {
                self.set_notice(Notice::Error(format!(
                    "Could not load area {}: {}",
                    result.ticket.area_id,
                    e.user_message()
                )));
            }
        }
        true
    }

    // ----- Saving -----

    /// Start saving the draft of the selected area
    /// Editing is blocked until `finish_save`
    pub fn begin_save(&mut self) -> Option<SaveTicket> {
        if self.saving {
            return None;
        }
        let Some(area_id) = self.selected else {
            self.set_notice(Notice::Error("Select a parking area first.".to_string()));
            return None;
        };
        let editor = self.editor.as_mut()?;
        // A stroke still held open is committed so the saved draft has its history entry
        if editor.pointer_up().is_some() {
            debug!("committed open stroke before saving area {}", area_id);
        }
        let update = editor.save_payload();
        self.saving = true;
        Some(SaveTicket {
            area_id,
            generation: self.generation,
            update,
        })
    }

    /// Apply the outcome of a save
    ///
    /// Only `Saved` touches editor state; conflicts and failures leave the
    /// draft and history exactly as they were.
    pub fn finish_save(&mut self, ticket: SaveTicket, outcome: SaveOutcome) -> bool {
        self.saving = false;
        if ticket.generation != self.generation {
            debug!("dropping save outcome for area {}, area changed since", ticket.area_id);
            return false;
        }

        match outcome {
            SaveOutcome::Saved => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.mark_saved();
                }
                self.set_notice(Notice::Info("Parking map saved.".to_string()));
            }
            SaveOutcome::Conflict { reason, occupied_count } => {
                self.set_notice(Notice::Conflict {
                    area_id: ticket.area_id,
                    reason,
                    occupied_count,
                });
            }
            SaveOutcome::Failed { message } => {
                self.set_notice(Notice::Error(message));
            }
        }
        true
    }

    /// Run a whole save on the current thread
    pub fn save_with<A: ParkingApi + ?Sized>(&mut self, api: &A) -> Option<SaveOutcome> {
        let ticket = self.begin_save()?;
        let outcome = api.update_map(ticket.area_id, &ticket.update);
        self.finish_save(ticket, outcome.clone());
        Some(outcome)
    }

    /// Run a whole load on the current thread
    pub fn load_with<A: ParkingApi + ?Sized>(&mut self, api: &A, ticket: LoadTicket) -> bool {
        self.finish_load(fetch_area(api, ticket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(id: u64) -> ParkingArea {
        ParkingArea {
            id,
            name: format!("Area {}", id),
            slot_count: 0,
            current_count: 0,
            is_active: true,
        }
    }

    fn loaded() -> LoadedArea {
        LoadedArea {
            map: MapResponse::default(),
            slots: Vec::new(),
            permission: None,
        }
    }

    #[test]
    fn first_area_is_selected() {
        let mut session = Session::new(Tool::Blocked);
        let ticket = session.set_areas(Ok(vec![area(4), area(9)])).unwrap();
        assert_eq!(ticket.area_id, 4);
        assert!(session.is_loading());
        assert_eq!(session.selected_area().map(|a| a.id), Some(4));
    }

    #[test]
    fn stale_load_is_dropped() {
        let mut session = Session::new(Tool::Blocked);
        session.set_areas(Ok(vec![area(1), area(2)]));
        let first = session.select_area(1);
        let second = session.select_area(2);

        assert!(session.finish_load(LoadResult { ticket: second, data: Ok(loaded()) }));
        assert!(!session.finish_load(LoadResult { ticket: first, data: Ok(loaded()) }));
        assert_eq!(session.editor().map(|e| e.area_id()), Some(2));
        assert!(!session.is_loading());
    }

    #[test]
    fn cycle_wraps_around() {
        let mut session = Session::new(Tool::Blocked);
        session.set_areas(Ok(vec![area(1), area(2), area(3)]));
        assert_eq!(session.cycle_area(-1).map(|t| t.area_id), Some(3));
        assert_eq!(session.cycle_area(1).map(|t| t.area_id), Some(1));
        assert_eq!(session.cycle_area(2).map(|t| t.area_id), Some(3));
    }

    #[test]
    fn save_without_area_is_refused() {
        let mut session = Session::new(Tool::Blocked);
        assert!(session.begin_save().is_none());
        assert!(matches!(session.notice(), Some(Notice::Error(_))));
    }

    #[test]
    fn editing_is_blocked_while_saving() {
        let mut session = Session::new(Tool::Blocked);
        let ticket = session.select_area(1);
        session.finish_load(LoadResult { ticket, data: Ok(loaded()) });
        let save = session.begin_save().unwrap();
        assert!(session.editor_mut().is_none());
        assert!(session.begin_save().is_none());
        session.finish_save(save, SaveOutcome::Saved);
        assert!(session.editor_mut().is_some());
    }

    #[test]
    fn conflict_notice_points_at_slot_management() {
        let notice = Notice::Conflict {
            area_id: 7,
            reason: "Area still has parked vehicles.".into(),
            occupied_count: Some(2),
        };
        assert_eq!(notice.slot_management_area(), Some(7));
        assert!(notice.is_error());
        assert_eq!(
            notice.to_string(),
            "Area still has parked vehicles. (2 occupied slot(s)) Release them in slot management for area 7 first."
        );
    }
}
