//! Level session state
//!
//! A `Game` owns the catalog, the current board and the per-level session:
//! `Loaded -> Playing -> Complete`. Every accepted rotation is followed by a
//! propagation pass before control returns, so callers never observe a
//! rotation without its refreshed power state.

use std::fmt;

use glam::IVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::board::{Board, LevelKind};
use super::propagate::{PropagationReport, PropagationStrategy, strategy_for, targets_complete};
use crate::best_moves::BestMoves;
use crate::levels::{LevelCatalog, LevelError};
use crate::settings::Ruleset;

/// Scramble re-rolls before accepting an already solved arrangement
pub const MAX_SCRAMBLE_ATTEMPTS: u32 = 8;

/// Session phase for the current level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Fresh board, no rotation yet
    Loaded,
    /// At least one rotation, not yet solved
    Playing,
    /// Solved; stays here until a reload or level change
    Complete,
}

/// Notifications for the presentation/audio layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelLoaded { index: usize },
    Rotated { pos: IVec2, rotation: u8 },
    RotateRejected { pos: IVec2 },
    /// More targets are lit than before this tick
    TargetsPowered { powered: usize, total: usize },
    LevelComplete {
        index: usize,
        moves: u32,
        new_best: bool,
    },
}

/// How the current level was finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub moves: u32,
    pub new_best: bool,
}

pub struct Game {
    catalog: LevelCatalog,
    ruleset: Ruleset,
    strategy: Box<dyn PropagationStrategy>,
    level_index: usize,
    board: Board,
    phase: LevelPhase,
    moves: u32,
    completion: Option<Completion>,
    best: BestMoves,
    report: PropagationReport,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("level_index", &self.level_index)
            .field("strategy", &self.strategy.name())
            .field("phase", &self.phase)
            .field("moves", &self.moves)
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Start a session on the first level of `catalog`. The catalog is
    /// checked against the ruleset's mirror board size first.
    pub fn new(catalog: LevelCatalog, ruleset: Ruleset) -> Result<Self, LevelError> {
        catalog.validate(ruleset.mirror_board_size)?;
        Ok(Self::start(catalog, ruleset))
    }

    /// Built-in levels with the classic ruleset
    pub fn builtin() -> Self {
        Self::start(LevelCatalog::builtin(), Ruleset::default())
    }

    fn start(catalog: LevelCatalog, ruleset: Ruleset) -> Self {
        let mut game = Self {
            strategy: strategy_for(LevelKind::Pipe, &ruleset),
            catalog,
            ruleset,
            level_index: 0,
            board: Board::new(LevelKind::Pipe, 0, 0),
            phase: LevelPhase::Loaded,
            moves: 0,
            completion: None,
            best: BestMoves::new(),
            report: PropagationReport::default(),
        };
        game.load_level(0);
        game
    }

    /// Attach previously saved best-move records
    pub fn with_best_moves(mut self, best: BestMoves) -> Self {
        self.best = best;
        self
    }

    /// Load a level by index. Out-of-range indices fall back to the first
    /// level. Power flags start cleared; nothing is propagated yet.
    pub fn load_level(&mut self, index: usize) {
        let clamped = self.catalog.clamp_index(index);
        if clamped != index {
            log::warn!("Level {} does not exist, loading level {}", index, clamped);
        }

        self.board = match self.catalog.get(clamped) {
            Some(descriptor) => Board::from_descriptor(descriptor, &self.ruleset),
            None => Board::new(LevelKind::Pipe, 0, 0),
        };
        self.strategy = strategy_for(self.board.kind(), &self.ruleset);
        self.level_index = clamped;
        self.phase = LevelPhase::Loaded;
        self.moves = 0;
        self.completion = None;
        self.report = PropagationReport::default();

        log::info!(
            "Loaded level {} '{}' ({}x{}, {} targets, {})",
            clamped,
            self.catalog.name(clamped).unwrap_or("?"),
            self.board.width(),
            self.board.height(),
            self.board.targets().len(),
            self.strategy.name()
        );
    }

    /// Load a level and randomize its rotatable pieces from `seed`.
    /// Re-rolls a few times to avoid handing out a solved board.
    pub fn load_level_scrambled(&mut self, index: usize, seed: u64) {
        self.load_level(index);
        let mut rng = Pcg32::seed_from_u64(seed);
        for attempt in 1..=MAX_SCRAMBLE_ATTEMPTS {
            self.board.scramble(&mut rng, &self.ruleset);
            self.strategy.propagate(&mut self.board);
            if !targets_complete(&self.board) {
                break;
            }
            log::debug!("Scramble attempt {} came out solved", attempt);
        }
        self.board.reset_power();
    }

    /// Rebuild the current level from its descriptor
    pub fn reset_level(&mut self) {
        self.load_level(self.level_index);
    }

    /// Advance to the next level, wrapping after the last
    pub fn next_level(&mut self) {
        let next = (self.level_index + 1) % self.catalog.len().max(1);
        self.load_level(next);
    }

    /// Turn the piece at (x, y). Returns false, leaving everything untouched,
    /// for off-board cells and pieces the ruleset keeps fixed.
    pub fn rotate_tile(&mut self, x: i32, y: i32, clockwise: bool) -> bool {
        let pos = IVec2::new(x, y);
        if !self.board.rotate(pos, clockwise, &self.ruleset) {
            return false;
        }

        self.propagate();
        match self.phase {
            LevelPhase::Complete => {}
            LevelPhase::Loaded | LevelPhase::Playing => {
                self.moves += 1;
                self.phase = LevelPhase::Playing;
                if targets_complete(&self.board) {
                    self.finish();
                }
            }
        }
        true
    }

    fn finish(&mut self) {
        let new_best = self.best.record(self.level_index, self.moves);
        self.phase = LevelPhase::Complete;
        self.completion = Some(Completion {
            moves: self.moves,
            new_best,
        });
        log::info!(
            "Level {} complete in {} moves{}",
            self.level_index,
            self.moves,
            if new_best { " (new best)" } else { "" }
        );
    }

    /// Recompute power, then check that every target is lit and at least
    /// one target exists
    pub fn is_level_complete(&mut self) -> bool {
        self.propagate();
        targets_complete(&self.board)
    }

    /// Run one propagation pass over the current board
    pub fn propagate(&mut self) -> &PropagationReport {
        self.report = self.strategy.propagate(&mut self.board);
        &self.report
    }

    /// Result of the most recent propagation pass
    pub fn last_report(&self) -> &PropagationReport {
        &self.report
    }

    pub fn level_name(&self, index: usize) -> Option<&str> {
        self.catalog.name(index)
    }

    pub fn level_count(&self) -> usize {
        self.catalog.len()
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    pub fn best_moves(&self) -> &BestMoves {
        &self.best
    }

    pub fn best_moves_mut(&mut self) -> &mut BestMoves {
        &mut self.best
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Switch rules; the current level is reloaded under the new rules.
    /// Rules the catalog does not fit are refused and the session is kept.
    pub fn set_ruleset(&mut self, ruleset: Ruleset) -> Result<(), LevelError> {
        self.catalog.validate(ruleset.mirror_board_size)?;
        self.ruleset = ruleset;
        self.reset_level();
        Ok(())
    }
}
