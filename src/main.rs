use arboard::Clipboard;
use macroquad::prelude::*;
use parkmap::action_log::{Action, ActionLog};
use parkmap::api::{ApiError, HttpApi, ParkingApi, ParkingArea, SaveOutcome};
use parkmap::config::Config;
use parkmap::editor::{EditorState, ResizePlan};
use parkmap::session::{fetch_area, LoadResult, LoadTicket, Notice, SaveTicket, Session};
use parkmap::shortcuts::{shortcut_for, Modifiers, Platform, Shortcut};
use parkmap::{CellKey, CellKind, Tool};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const MARGIN: f32 = 16.0;
const TOOLBAR_HEIGHT: f32 = 118.0;
const CELL_GAP: f32 = 2.0;

/// Results coming back from the network threads
enum Message {
    Areas(Result<Vec<ParkingArea>, ApiError>),
    Loaded(LoadResult),
    Saved(SaveTicket, SaveOutcome),
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Rows,
    Cols,
}

/// Rows/cols input, then an optional confirmation step
struct ResizeDialog {
    rows: String,
    cols: String,
    focus: Field,
    pending: Option<ResizePlan>,
}

impl ResizeDialog {
    fn new(editor: &EditorState) -> Self {
        ResizeDialog {
            rows: editor.cfg().rows.to_string(),
            cols: editor.cfg().cols.to_string(),
            focus: Field::Rows,
            pending: None,
        }
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Rows => &mut self.rows,
            Field::Cols => &mut self.cols,
        }
    }
}

fn rgb(color: (u8, u8, u8)) -> Color {
    Color::from_rgba(color.0, color.1, color.2, 255)
}

fn text_color_for(kind: CellKind) -> Color {
    match kind {
        CellKind::Blocked => WHITE,
        _ => Color::from_rgba(17, 24, 39, 255),
    }
}

fn modifiers() -> Modifiers {
    Modifiers {
        ctrl: is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl),
        meta: is_key_down(KeyCode::LeftSuper) || is_key_down(KeyCode::RightSuper),
        shift: is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift),
    }
}

struct EditorApp {
    session: Session,
    api: HttpApi,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    action_log: Option<ActionLog>,
    resize: Option<ResizeDialog>,
    hovered: Option<CellKey>,
    zoom: f32,
    show_legend: bool,
    background: Color,
}

impl EditorApp {
    fn new(config: &Config, api: HttpApi) -> Self {
        let (tx, rx) = mpsc::channel();
        EditorApp {
            session: Session::new(config.editor.default_tool),
            api,
            tx,
            rx,
            action_log: config.logging.enable_action_log.then(ActionLog::new),
            resize: None,
            hovered: None,
            zoom: config.editor.zoom.clamp(0.25, 4.0),
            show_legend: config.visual.show_legend,
            background: Color::from_rgba(
                config.visual.background_r,
                config.visual.background_g,
                config.visual.background_b,
                255,
            ),
        }
    }

    fn log(&mut self, action: Action) {
        if let Some(log) = self.action_log.as_mut() {
            log.log_instant(action);
        }
    }

    // ----- Network -----

    fn spawn_area_list(&self) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let _ = tx.send(Message::Areas(api.list_areas()));
        });
    }

    fn spawn_load(&mut self, ticket: LoadTicket) {
        self.log(Action::SelectArea { area_id: ticket.area_id });
        let api = self.api.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let _ = tx.send(Message::Loaded(fetch_area(&api, ticket)));
        });
    }

    fn spawn_save(&mut self) {
        let Some(ticket) = self.session.begin_save() else {
            return;
        };
        if let Some(log) = self.action_log.as_mut() {
            log.log_start(Action::Save {
                area_id: ticket.area_id,
                outcome: None,
            });
        }
        let api = self.api.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let outcome = api.update_map(ticket.area_id, &ticket.update);
            let _ = tx.send(Message::Saved(ticket, outcome));
        });
    }

    fn poll_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                Message::Areas(result) => {
                    if let Some(ticket) = self.session.set_areas(result) {
                        self.spawn_load(ticket);
                    }
                }
                Message::Loaded(result) => {
                    self.session.finish_load(result);
                }
                Message::Saved(ticket, outcome) => {
                    if let Some(log) = self.action_log.as_mut() {
                        log.log_finish(Action::Save {
                            area_id: ticket.area_id,
                            outcome: Some(format!("{:?}", outcome)),
                        });
                    }
                    self.session.finish_save(ticket, outcome);
                }
            }
        }
    }

    // ----- Input -----

    fn grid_origin(&self) -> (f32, f32) {
        (MARGIN, TOOLBAR_HEIGHT + MARGIN)
    }

    fn cell_pixels(&self, editor: &EditorState) -> f32 {
        (editor.cfg().cell_size as f32 * self.zoom).max(4.0)
    }

    fn cell_at(&self, mouse_x: f32, mouse_y: f32) -> Option<CellKey> {
        let editor = self.session.editor()?;
        let (ox, oy) = self.grid_origin();
        let step = self.cell_pixels(editor) + CELL_GAP;
        if mouse_x < ox || mouse_y < oy {
            return None;
        }
        let col = ((mouse_x - ox) / step) as u32;
        let row = ((mouse_y - oy) / step) as u32;
        editor.cfg().contains(row, col).then(|| CellKey::new(row, col))
    }

    fn handle_mouse(&mut self) {
        let (mouse_x, mouse_y) = mouse_position();
        self.hovered = self.cell_at(mouse_x, mouse_y);
        let hovered = self.hovered;
        if self.resize.is_some() {
            return;
        }

        let Some(editor) = self.session.editor_mut() else {
            return;
        };

        if let Some(key) = hovered {
            if is_mouse_button_pressed(MouseButton::Left) {
                editor.pointer_down(key);
                if let Some(log) = self.action_log.as_mut() {
                    log.log_start(Action::Stroke {
                        tool: editor.tool(),
                        row: key.row,
                        col: key.col,
                        painted: 0,
                    });
                }
            } else if is_mouse_button_down(MouseButton::Left) {
                editor.pointer_enter(key);
            }
        }

        // Release anywhere ends the stroke, even off the grid
        if is_mouse_button_released(MouseButton::Left) && editor.stroke().is_dragging {
            let start = editor.stroke().start_key.unwrap_or(CellKey::new(0, 0));
            let painted = editor.pointer_up().unwrap_or(0);
            if let Some(log) = self.action_log.as_mut() {
                log.log_finish(Action::Stroke {
                    tool: editor.tool(),
                    row: start.row,
                    col: start.col,
                    painted,
                });
            }
        }
    }

    /// Returns false when the app should quit
    fn handle_keys(&mut self) -> bool {
        if self.resize.is_some() {
            self.handle_resize_keys();
            return true;
        }

        if is_key_pressed(KeyCode::Escape) {
            return false;
        }

        let mods = modifiers();
        let chord = if is_key_pressed(KeyCode::Z) {
            shortcut_for('z', mods, Platform::current())
        } else if is_key_pressed(KeyCode::Y) {
            shortcut_for('y', mods, Platform::current())
        } else {
            None
        };
        if let Some(shortcut) = chord {
            let applied = match (shortcut, self.session.editor_mut()) {
                (Shortcut::Undo, Some(editor)) => editor.undo(),
                (Shortcut::Redo, Some(editor)) => editor.redo(),
                _ => false,
            };
            if applied {
                self.log(match shortcut {
                    Shortcut::Undo => Action::Undo,
                    Shortcut::Redo => Action::Redo,
                });
            }
            return true;
        }
        if mods.ctrl || mods.meta {
            return true;
        }

        let tool_keys = [
            KeyCode::Key1,
            KeyCode::Key2,
            KeyCode::Key3,
            KeyCode::Key4,
            KeyCode::Key5,
            KeyCode::Key6,
            KeyCode::Key7,
        ];
        for (key, tool) in tool_keys.into_iter().zip(Tool::ALL) {
            if is_key_pressed(key) && self.session.tool() != tool {
                self.session.set_tool(tool);
                self.log(Action::SelectTool { tool });
            }
        }

        if is_key_pressed(KeyCode::LeftBracket) {
            if let Some(ticket) = self.session.cycle_area(-1) {
                self.spawn_load(ticket);
            }
        }
        if is_key_pressed(KeyCode::RightBracket) {
            if let Some(ticket) = self.session.cycle_area(1) {
                self.spawn_load(ticket);
            }
        }
        if is_key_pressed(KeyCode::F5) && !self.session.is_saving() {
            match self.session.reload() {
                Some(ticket) => self.spawn_load(ticket),
                None => self.spawn_area_list(),
            }
        }

        if is_key_pressed(KeyCode::S) {
            self.spawn_save();
        }
        if is_key_pressed(KeyCode::Backspace) {
            if let Some(editor) = self.session.editor_mut() {
                if editor.can_reset_draft() {
                    editor.reset_draft();
                    self.log(Action::ResetDraft);
                }
            }
        }
        if is_key_pressed(KeyCode::G) {
            if let Some(editor) = self.session.editor_mut() {
                self.resize = Some(ResizeDialog::new(editor));
                // Swallow the 'g' so it does not land in the rows field
                while get_char_pressed().is_some() {}
            }
        }
        if is_key_pressed(KeyCode::C) {
            self.copy_to_clipboard();
        }

        true
    }

    fn handle_resize_keys(&mut self) {
        let Some(dialog) = self.resize.as_mut() else {
            return;
        };

        if is_key_pressed(KeyCode::Escape) {
            self.resize = None;
            return;
        }

        if let Some(plan) = dialog.pending.clone() {
            let confirmed = if is_key_pressed(KeyCode::Y) {
                Some(true)
            } else if is_key_pressed(KeyCode::N) {
                Some(false)
            } else {
                None
            };
            if let Some(confirmed) = confirmed {
                if confirmed {
                    if let Some(editor) = self.session.editor_mut() {
                        editor.apply_resize(&plan);
                    }
                } else {
                    info!("Resize to {}x{} declined", plan.rows, plan.cols);
                }
                self.resize = None;
                self.log(Action::Resize {
                    rows: plan.rows,
                    cols: plan.cols,
                    confirmed,
                });
            }
            while get_char_pressed().is_some() {}
            return;
        }

        while let Some(ch) = get_char_pressed() {
            if ch.is_ascii_digit() && dialog.field_mut().len() < 3 {
                dialog.field_mut().push(ch);
            }
        }
        if is_key_pressed(KeyCode::Backspace) {
            dialog.field_mut().pop();
        }
        if is_key_pressed(KeyCode::Tab) {
            dialog.focus = match dialog.focus {
                Field::Rows => Field::Cols,
                Field::Cols => Field::Rows,
            };
        }
        if is_key_pressed(KeyCode::Enter) {
            let Some(editor) = self.session.editor_mut() else {
                self.resize = None;
                return;
            };
            let plan = editor.plan_resize(&dialog.rows, &dialog.cols);
            if plan.needs_confirmation() {
                dialog.pending = Some(plan);
            } else {
                editor.apply_resize(&plan);
                self.resize = None;
                self.log(Action::Resize {
                    rows: plan.rows,
                    cols: plan.cols,
                    confirmed: true,
                });
            }
        }
    }

    fn copy_to_clipboard(&mut self) {
        let Some(editor) = self.session.editor() else {
            return;
        };
        let json = match serde_json::to_string_pretty(&editor.save_payload()) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize map: {}", e);
                return;
            }
        };
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(json) {
                    warn!("Failed to copy to clipboard: {}", e);
                } else {
                    info!("Map copied to clipboard");
                    // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                    thread::sleep(std::time::Duration::from_millis(100));
                    self.log(Action::CopyToClipboard);
                }
            }
            Err(e) => warn!("Failed to access clipboard: {}", e),
        }
    }

    // ----- Drawing -----

    fn draw(&self) {
        clear_background(self.background);
        self.draw_toolbar();
        if let Some(editor) = self.session.editor() {
            self.draw_grid(editor);
        } else if self.session.is_loading() {
            draw_text("Loading...", MARGIN, TOOLBAR_HEIGHT + 40.0, 24.0, DARKGRAY);
        }
        if let Some(dialog) = &self.resize {
            self.draw_resize_dialog(dialog);
        }
    }

    fn draw_toolbar(&self) {
        let dark = Color::from_rgba(17, 24, 39, 255);
        let muted = Color::from_rgba(107, 114, 128, 255);

        let area = match self.session.selected_area() {
            Some(area) => format!(
                "Area: {} ({} / {} occupied)",
                area.name, area.current_count, area.slot_count
            ),
            None => "Area: -".to_string(),
        };
        draw_text(&area, MARGIN, 24.0, 22.0, dark);

        let mut x = MARGIN;
        for (i, tool) in Tool::ALL.iter().enumerate() {
            let label = format!("{} {}", i + 1, tool.as_str());
            let width = measure_text(&label, None, 16, 1.0).width + 12.0;
            let active = *tool == self.session.tool();
            let fill = match tool.paint_kind() {
                Some(kind) => rgb(kind.rgb()),
                None => WHITE,
            };
            draw_rectangle(x, 34.0, width, 24.0, fill);
            draw_rectangle_lines(x, 34.0, width, 24.0, if active { 3.0 } else { 1.0 }, if active { BLUE } else { GRAY });
            let text = match tool.paint_kind() {
                Some(kind) => text_color_for(kind),
                None => dark,
            };
            draw_text(&label, x + 6.0, 51.0, 16.0, text);
            x += width + 6.0;
        }
        draw_text(self.session.tool().label(), x + 6.0, 51.0, 16.0, muted);

        let status = match self.session.editor() {
            Some(editor) => format!(
                "{}x{} @{}px | undo {} redo {} | {}{}",
                editor.cfg().rows,
                editor.cfg().cols,
                editor.cfg().cell_size,
                if editor.can_undo() { "on" } else { "off" },
                if editor.can_redo() { "on" } else { "off" },
                if editor.can_reset_draft() { "unsaved changes" } else { "no changes" },
                if self.session.is_saving() { " | saving..." } else { "" },
            ),
            None => String::new(),
        };
        draw_text(&status, MARGIN, 78.0, 16.0, dark);
        draw_text(
            "S save | Backspace discard | G rows/cols | Ctrl+Z / Ctrl+Y undo/redo | [ ] area | F5 reload | C copy | Esc quit",
            MARGIN,
            96.0,
            14.0,
            muted,
        );

        if let Some(notice) = self.session.notice() {
            let color = match notice {
                Notice::Info(_) => DARKGREEN,
                Notice::Warning(_) => ORANGE,
                _ => RED,
            };
            draw_text(&notice.to_string(), MARGIN, 112.0, 16.0, color);
        }
    }

    fn draw_grid(&self, editor: &EditorState) {
        let (ox, oy) = self.grid_origin();
        let size = self.cell_pixels(editor);
        let step = size + CELL_GAP;
        let cfg = editor.cfg();

        for row in 0..cfg.rows {
            for col in 0..cfg.cols {
                let key = CellKey::new(row, col);
                let px = ox + col as f32 * step;
                let py = oy + row as f32 * step;

                match editor.draft().get(key) {
                    Some(cell) => {
                        draw_rectangle(px, py, size, size, rgb(cell.kind.rgb()));
                        if size >= 20.0 {
                            let text = text_color_for(cell.kind);
                            draw_text(cell.kind.badge(), px + 3.0, py + size * 0.4, size * 0.35, text);
                            if let Some(name) = &cell.name {
                                draw_text(name, px + 3.0, py + size * 0.85, size * 0.35, text);
                            }
                        }
                    }
                    None => {
                        draw_rectangle(px, py, size, size, Color::from_rgba(248, 250, 252, 255));
                        draw_rectangle_lines(px, py, size, size, 1.0, Color::from_rgba(229, 231, 235, 255));
                        // Persisted slot erased from the draft: it goes away on save
                        if let Some(slot) = editor.slot_at(key) {
                            draw_rectangle_lines(px + 2.0, py + 2.0, size - 4.0, size - 4.0, 1.0, RED);
                            if size >= 20.0 {
                                draw_text(&slot.code, px + 3.0, py + size * 0.85, size * 0.35, RED);
                            }
                        }
                    }
                }

                if self.hovered == Some(key) {
                    draw_rectangle_lines(px, py, size, size, 2.0, BLUE);
                }
            }
        }

        if self.show_legend {
            let legend_x = ox + cfg.cols as f32 * step + MARGIN;
            for (i, kind) in CellKind::ALL.iter().enumerate() {
                let y = oy + i as f32 * 24.0;
                draw_rectangle(legend_x, y, 18.0, 18.0, rgb(kind.rgb()));
                draw_text(kind.label(), legend_x + 26.0, y + 14.0, 16.0, DARKGRAY);
            }
        }
    }

    fn draw_resize_dialog(&self, dialog: &ResizeDialog) {
        let width = 520.0;
        let height = 190.0;
        let x = (screen_width() - width) / 2.0;
        let y = (screen_height() - height) / 2.0;
        draw_rectangle(0.0, 0.0, screen_width(), screen_height(), Color::from_rgba(0, 0, 0, 90));
        draw_rectangle(x, y, width, height, WHITE);
        draw_rectangle_lines(x, y, width, height, 2.0, GRAY);

        match &dialog.pending {
            Some(plan) => {
                let message = plan.warning.as_ref().map(|w| w.to_string()).unwrap_or_default();
                for (i, line) in message.lines().enumerate() {
                    draw_text(line, x + 16.0, y + 30.0 + i as f32 * 20.0, 16.0, BLACK);
                }
                draw_text("Y continue | N cancel", x + 16.0, y + height - 16.0, 18.0, RED);
            }
            None => {
                draw_text("Grid size (3-200)", x + 16.0, y + 30.0, 22.0, BLACK);
                let rows = format!("Rows: {}{}", dialog.rows, if dialog.focus == Field::Rows { "_" } else { "" });
                let cols = format!("Cols: {}{}", dialog.cols, if dialog.focus == Field::Cols { "_" } else { "" });
                draw_text(&rows, x + 16.0, y + 70.0, 20.0, BLACK);
                draw_text(&cols, x + 16.0, y + 100.0, 20.0, BLACK);
                draw_text(
                    "Cells outside the new grid are removed from the map.",
                    x + 16.0,
                    y + 130.0,
                    16.0,
                    DARKGRAY,
                );
                draw_text("Tab switch | Enter apply | Esc cancel", x + 16.0, y + height - 16.0, 16.0, DARKGRAY);
            }
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn window_conf() -> Conf {
    Conf {
        window_title: Config::load().visual.window_title,
        window_width: 1280,
        window_height: 860,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = Config::load();
    init_tracing(&config.logging.filter);
    config.report();

    let api = match HttpApi::from_config(&config.api) {
        Ok(api) => api,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return;
        }
    };
    info!("Using backend at {}", api.base_url());

    let mut app = EditorApp::new(&config, api);
    app.spawn_area_list();

    loop {
        app.poll_messages();
        app.handle_mouse();
        if !app.handle_keys() {
            break;
        }
        app.draw();
        next_frame().await
    }

    if let Some(log) = &app.action_log {
        match log.save_to_file(&config.logging.action_log_path) {
            Ok(()) => info!("Action log written to {}", config.logging.action_log_path),
            Err(e) => warn!("Failed to write action log: {}", e),
        }
        info!("\n{}", log.summary());
    }
}
