//! Best-move records
//!
//! Fewest moves used to finish each level, keyed by level index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BestMoves {
    pub entries: BTreeMap<usize, u32>,
}

impl BestMoves {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "circuitry_best_moves";

    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Check if a move count would beat the stored record
    pub fn qualifies(&self, level: usize, moves: u32) -> bool {
        self.entries.get(&level).map(|&best| moves < best).unwrap_or(true)
    }

    /// Record a completion. Returns true if it is a new best.
    pub fn record(&mut self, level: usize, moves: u32) -> bool {
        if !self.qualifies(level, moves) {
            return false;
        }
        self.entries.insert(level, moves);
        true
    }

    pub fn best(&self, level: usize) -> Option<u32> {
        self.entries.get(&level).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of levels with a record
    pub fn completed(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load records, starting fresh when missing or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match persistence::load_json::<BestMoves>(store, Self::STORAGE_KEY) {
            Ok(Some(best)) => {
                log::info!("Loaded best moves for {} levels", best.entries.len());
                best
            }
            Ok(None) => {
                log::info!("No best moves found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("Best moves unreadable ({e}), starting fresh");
                Self::new()
            }
        }
    }

    /// Best-effort save
    pub fn save(&self, store: &dyn KeyValueStore) {
        match persistence::save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Best moves saved ({} levels)", self.entries.len()),
            Err(e) => log::warn!("Failed to save best moves: {e}"),
        }
    }
}
