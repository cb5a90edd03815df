//! Linear undo/redo over full-state snapshots.
//!
//! Pushing while the cursor is not at the end drops the redo branch.
//! Undo/redo only move the cursor and hand out copies, they never touch the
//! stored snapshots.

use tracing::debug;

#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    entries: Vec<T>,
    index: usize,
}

impl<T: Clone> History<T> {
    /// History holding a single snapshot, the undo floor
    pub fn new(initial: T) -> Self {
        History {
            entries: vec![initial],
            index: 0,
        }
    }

    /// Append a snapshot after the cursor, discarding anything past it
    pub fn push(&mut self, snapshot: T) {
        self.entries.truncate(self.index + 1);
        self.entries.push(snapshot);
        self.index = self.entries.len() - 1;
        debug!("history push: {} entries, index {}", self.entries.len(), self.index);
    }

    /// Step back, returning a copy of the snapshot to restore
    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].clone())
    }

    /// Step forward, returning a copy of the snapshot to restore
    pub fn redo(&mut self) -> Option<T> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].clone())
    }

    /// Collapse to a single snapshot
    pub fn reset(&mut self, snapshot: T) {
        self.entries.clear();
        self.entries.push(snapshot);
        self.index = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Snapshot under the cursor
    pub fn current(&self) -> &T {
        &self.entries[self.index]
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }
}
