/// Editor command bound to a key chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
}

/// Which modifier acts as the command key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Cmd (meta) is the command key
    Mac,
    /// Ctrl is the command key
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

/// Map a key press to undo/redo
///
/// Undo is command+Z; redo is command+Y or command+Shift+Z. The shift variant
/// is checked first since it is the more specific chord.
pub fn shortcut_for(key: char, modifiers: Modifiers, platform: Platform) -> Option<Shortcut> {
    let command = match platform {
        Platform::Mac => modifiers.meta,
        Platform::Other => modifiers.ctrl,
    };
    if !command {
        return None;
    }

    match key.to_ascii_lowercase() {
        'z' if modifiers.shift => Some(Shortcut::Redo),
        'z' => Some(Shortcut::Undo),
        'y' => Some(Shortcut::Redo),
        _ => None,
    }
}
