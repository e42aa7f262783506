//! Undo/redo history built from whole-map snapshots
//!
//! Every entry is an independent deep copy of the map geometry, all layers and
//! the selected tile. Resizes and layer additions change array shapes, so
//! restoring a full copy needs no special cases.

pub mod shortcuts;

pub use shortcuts::{resolve_shortcut, Modifiers, ShortcutAction};

use std::collections::VecDeque;
use tileforge_core::{Layer, TileMap};

/// Default maximum number of undo entries
pub const DEFAULT_HISTORY_CAPACITY: usize = 120;

/// Independent copy of the editable state at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub layers: Vec<Layer>,
    pub selected_tile: i32,
}

impl Snapshot {
    /// Deep-copy the current map
    pub fn capture(map: &TileMap, selected_tile: i32) -> Self {
        Self {
            width: map.width(),
            height: map.height(),
            tile_size: map.tile_size(),
            layers: map.layers().to_vec(),
            selected_tile,
        }
    }

    /// Overwrite `map` with a copy of this snapshot and return the stored selected tile.
    ///
    /// The map never borrows the snapshot's arrays, so later edits cannot leak
    /// back into history.
    pub fn restore_into(&self, map: &mut TileMap) -> i32 {
        map.replace_contents(self.width, self.height, self.tile_size, self.layers.clone());
        self.selected_tile
    }

    /// Check if the map holds exactly this snapshot's grid contents
    pub fn matches(&self, map: &TileMap) -> bool {
        self.width == map.width()
            && self.height == map.height()
            && self.tile_size == map.tile_size()
            && self.layers == map.layers()
    }
}

/// Bounded undo/redo stacks
///
/// The bottom undo entry is the floor: it is never popped, so there is always
/// a state to return to.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Create an empty history holding at most `capacity` undo entries
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a snapshot, dropping any redo entries and the oldest entry past capacity
    pub fn push_snapshot(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        if self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
            log::debug!("History full, dropped oldest entry");
        }
        self.redo_stack.clear();
    }

    /// Forget everything and start over with `floor` as the only entry
    pub fn reset(&mut self, floor: Snapshot) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push_back(floor);
    }

    /// Step back. Returns a copy of the state to restore, or None at the floor.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if self.undo_stack.len() <= 1 {
            return None;
        }
        let top = self.undo_stack.pop_back()?;
        self.redo_stack.push(top);
        self.undo_stack.back().cloned()
    }

    /// Step forward. Returns a copy of the state to restore, or None if nothing was undone.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push_back(snapshot.clone());
        Some(snapshot)
    }

    /// Most recent undo entry
    pub fn top(&self) -> Option<&Snapshot> {
        self.undo_stack.back()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}
