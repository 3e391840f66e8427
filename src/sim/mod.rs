//! Puzzle simulation module
//!
//! All gameplay logic lives here. This module must stay pure and synchronous:
//! - Propagation is bounded by board size (BFS) or the step cap (beams)
//! - Seeded RNG only
//! - Row-major iteration order everywhere
//! - No rendering, audio or platform dependencies

pub mod board;
pub mod direction;
pub mod propagate;
pub mod state;
pub mod tick;
pub mod tile;

pub use board::{BeamSegment, Board, LevelKind};
pub use direction::{Connections, Direction};
pub use propagate::{
    Connectivity, PropagationReport, PropagationStrategy, RayMarch, Termination, links,
    strategy_for, targets_complete,
};
pub use state::{Completion, Game, GameEvent, LevelPhase, MAX_SCRAMBLE_ATTEMPTS};
pub use tick::{RotateCommand, TickInput, tick};
pub use tile::{MirrorAngle, Tile, TileKind, connections};
