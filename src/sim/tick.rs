//! Frame-stepped input handling
//!
//! One tick applies at most one input command, then runs one propagation
//! pass, then reports what changed. Command priority when several are set:
//! `load`, `reload`, `advance`, `rotate`.

use glam::IVec2;

use super::state::{Game, GameEvent, LevelPhase};

/// A player rotation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotateCommand {
    pub x: i32,
    pub y: i32,
    pub clockwise: bool,
}

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Turn a piece
    pub rotate: Option<RotateCommand>,
    /// Jump to a level (out-of-range falls back to the first)
    pub load: Option<usize>,
    /// Restart the current level
    pub reload: bool,
    /// Go to the next level
    pub advance: bool,
}

impl TickInput {
    pub fn rotate(x: i32, y: i32, clockwise: bool) -> Self {
        Self {
            rotate: Some(RotateCommand { x, y, clockwise }),
            ..Default::default()
        }
    }
}

/// Advance the session by one tick
pub fn tick(game: &mut Game, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let powered_before = game.board().targets_powered();
    let phase_before = game.phase();

    if let Some(index) = input.load {
        game.load_level(index);
    } else if input.reload {
        game.reset_level();
    } else if input.advance {
        game.next_level();
    } else if let Some(cmd) = input.rotate {
        let pos = IVec2::new(cmd.x, cmd.y);
        if game.rotate_tile(cmd.x, cmd.y, cmd.clockwise) {
            let rotation = game.board().tile(pos).map(|t| t.rotation).unwrap_or(0);
            events.push(GameEvent::Rotated { pos, rotation });
        } else {
            events.push(GameEvent::RotateRejected { pos });
        }
    }

    let loaded = input.load.is_some() || input.reload || input.advance;
    if loaded {
        events.push(GameEvent::LevelLoaded {
            index: game.level_index(),
        });
    }

    game.propagate();

    let powered = game.board().targets_powered();
    if !loaded && powered > powered_before {
        events.push(GameEvent::TargetsPowered {
            powered,
            total: game.board().targets().len(),
        });
    }

    if phase_before != LevelPhase::Complete && game.phase() == LevelPhase::Complete {
        if let Some(done) = game.completion() {
            events.push(GameEvent::LevelComplete {
                index: game.level_index(),
                moves: done.moves,
                new_best: done.new_best,
            });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_then_complete_events() {
        let mut game = Game::builtin();
        game.load_level(4);
        let events = tick(&mut game, &TickInput::default());
        assert!(events.is_empty());

        let events = tick(&mut game, &TickInput::rotate(5, 2, true));
        assert_eq!(
            events,
            vec![
                GameEvent::Rotated {
                    pos: IVec2::new(5, 2),
                    rotation: 0
                },
                GameEvent::TargetsPowered {
                    powered: 1,
                    total: 1
                },
                GameEvent::LevelComplete {
                    index: 4,
                    moves: 1,
                    new_best: true
                },
            ]
        );
    }

    #[test]
    fn test_rejected_rotation() {
        let mut game = Game::builtin();
        let events = tick(&mut game, &TickInput::rotate(-1, 0, true));
        assert_eq!(
            events,
            vec![GameEvent::RotateRejected {
                pos: IVec2::new(-1, 0)
            }]
        );
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn test_one_command_per_tick() {
        let mut game = Game::builtin();
        let input = TickInput {
            load: Some(2),
            advance: true,
            rotate: Some(RotateCommand {
                x: 1,
                y: 2,
                clockwise: true,
            }),
            ..Default::default()
        };
        let events = tick(&mut game, &input);
        assert_eq!(events, vec![GameEvent::LevelLoaded { index: 2 }]);
        assert_eq!(game.level_index(), 2);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn test_load_propagates_without_connect_event() {
        let mut game = Game::builtin();
        let input = TickInput {
            load: Some(99),
            ..Default::default()
        };
        let events = tick(&mut game, &input);
        assert_eq!(events, vec![GameEvent::LevelLoaded { index: 0 }]);
        // Source cell is lit after the tick's propagation pass
        assert!(game.board().is_powered(IVec2::new(0, 0)));
    }

    #[test]
    fn test_connect_event_on_partial_progress() {
        let mut game = Game::builtin();
        game.load_level(6);
        tick(&mut game, &TickInput::default());

        let events = tick(&mut game, &TickInput::rotate(3, 5, true));
        assert!(events.contains(&GameEvent::TargetsPowered {
            powered: 1,
            total: 2
        }));
        assert_eq!(game.phase(), LevelPhase::Playing);
    }

    #[test]
    fn test_reload_and_advance() {
        let mut game = Game::builtin();
        tick(&mut game, &TickInput::rotate(1, 0, true));
        assert_eq!(game.moves(), 1);

        let reload = TickInput {
            reload: true,
            ..Default::default()
        };
        assert_eq!(tick(&mut game, &reload), vec![GameEvent::LevelLoaded { index: 0 }]);
        assert_eq!(game.moves(), 0);

        let advance = TickInput {
            advance: true,
            ..Default::default()
        };
        tick(&mut game, &advance);
        assert_eq!(game.level_index(), 1);
    }
}
