//! Circuitry - rotate pipes and mirrors to light every target
//!
//! Core modules:
//! - `sim`: Tiles, boards, propagation (pipe BFS and laser tracing), sessions
//! - `levels`: Level descriptors, validation and the built-in catalog
//! - `settings`: Rulesets and player preferences
//! - `persistence`: Key/value storage backends
//! - `best_moves`: Fewest-moves records per level
//! - `session`: Settings-aware driver shared by the native and web front ends

pub mod best_moves;
pub mod levels;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use best_moves::BestMoves;
pub use levels::{LevelCatalog, LevelDescriptor, LevelError};
pub use session::Session;
pub use settings::{Ruleset, RulesetPreset, Settings};
pub use sim::{Board, Game, GameEvent, LevelPhase, TickInput, tick};

/// Render a board as text, one row per line.
///
/// Lit cells are upper-case. Beam levels draw mirrors as `\` / `/` and the
/// laser as an arrow.
pub fn board_to_ascii(board: &Board) -> String {
    use sim::{Direction, TileKind};

    let mut out = String::with_capacity(((board.width() + 1) * board.height()) as usize);
    for tile in board.tiles() {
        let laser = board.lasers().iter().find(|l| l.pos() == tile.pos);
        let glyph = match (laser, tile.kind) {
            (Some(l), _) => match l.dir {
                Direction::Up => '^',
                Direction::Right => '>',
                Direction::Down => 'v',
                Direction::Left => '<',
            },
            (None, TileKind::Empty) => '.',
            (None, TileKind::Mirror) => tile.mirror_angle().map(|a| a.glyph()).unwrap_or('?'),
            (None, kind) => {
                let c = match kind {
                    TileKind::Straight => ['|', '-'][(tile.rotation % 2) as usize],
                    TileKind::Corner => ['l', 'r', 'j', 'k'][tile.rotation as usize % 4],
                    TileKind::TJunction => 't',
                    TileKind::Cross => '+',
                    TileKind::Source => 's',
                    _ => 'o',
                };
                if tile.powered { c.to_ascii_uppercase() } else { c }
            }
        };
        out.push(glyph);
        if tile.pos.x == board.width() - 1 {
            out.push('\n');
        }
    }
    out
}
