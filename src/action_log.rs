use crate::cell::Tool;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Action phase - whether the action is starting or finishing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionPhase {
    Start,
    Finish,
}

/// User actions on the map editor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Paint stroke with a tool; the finish carries the number of paints (0 = nothing committed)
    Stroke { tool: Tool, row: u32, col: u32, painted: usize },
    SelectTool { tool: Tool },
    Undo,
    Redo,
    Resize { rows: u32, cols: u32, confirmed: bool },
    ResetDraft,
    SelectArea { area_id: u64 },
    /// Save request; `outcome` is filled on finish
    Save { area_id: u64, outcome: Option<String> },
    CopyToClipboard,
}

/// Logged action with timestamp and phase
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedAction {
    /// Milliseconds since start
    pub timestamp_ms: u64,
    pub action: Action,
    pub phase: ActionPhase,
}

/// Action logger
pub struct ActionLog {
    start_time: Instant,
    actions: Vec<LoggedAction>,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionLog {
    pub fn new() -> Self {
        ActionLog {
            start_time: Instant::now(),
            actions: Vec::new(),
        }
    }

    /// Log an action with current timestamp and phase
    pub fn log(&mut self, action: Action, phase: ActionPhase) {
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        self.actions.push(LoggedAction {
            timestamp_ms,
            action,
            phase,
        });
    }

    pub fn log_start(&mut self, action: Action) {
        self.log(action, ActionPhase::Start);
    }

    pub fn log_finish(&mut self, action: Action) {
        self.log(action, ActionPhase::Finish);
    }

    /// Log an instantaneous action as a start/finish pair
    pub fn log_instant(&mut self, action: Action) {
        self.log(action.clone(), ActionPhase::Start);
        self.log(action, ActionPhase::Finish);
    }

    pub fn actions(&self) -> &[LoggedAction] {
        &self.actions
    }

    /// Save log to JSON file
    pub fn save_to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(&self.actions)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Summary statistics over finished actions
    pub fn summary(&self) -> String {
        let mut strokes = 0;
        let mut empty_strokes = 0;
        let mut cells_painted = 0;
        let mut undos = 0;
        let mut redos = 0;
        let mut resizes = 0;
        let mut resets = 0;
        let mut saves = 0;

        for logged in self.actions.iter().filter(|l| l.phase == ActionPhase::Finish) {
            match &logged.action {
                Action::Stroke { painted: 0, .. } => empty_strokes += 1,
                Action::Stroke { painted, .. } => {
                    strokes += 1;
                    cells_painted += painted;
                }
                Action::Undo => undos += 1,
                Action::Redo => redos += 1,
                Action::Resize { confirmed: true, .. } => resizes += 1,
                Action::ResetDraft => resets += 1,
                Action::Save { .. } => saves += 1,
                _ => {}
            }
        }

        let duration = self.actions.last().map(|last| last.timestamp_ms).unwrap_or(0);

        format!(
            "Session Duration: {}ms\n\
             Total Events: {}\n\
             Strokes: {} ({} paints, {} without changes)\n\
             History: {} undo, {} redo, {} resizes, {} resets\n\
             Saves: {}",
            duration,
            self.actions.len(),
            strokes,
            cells_painted,
            empty_strokes,
            undos,
            redos,
            resizes,
            resets,
            saves
        )
    }
}
