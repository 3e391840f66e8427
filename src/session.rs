//! Player session shared by the native and browser front ends
//!
//! Wraps a `Game` with the player's settings and a storage backend: applies
//! the chosen ruleset, scrambles freshly loaded levels when asked to, saves
//! best moves on a new record, and queues events until the front end takes
//! them.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::best_moves::BestMoves;
use crate::persistence::KeyValueStore;
use crate::settings::Settings;
use crate::sim::{Game, GameEvent, TickInput, tick};

pub struct Session<S: KeyValueStore> {
    game: Game,
    settings: Settings,
    store: S,
    rng: Pcg32,
    pending: Vec<GameEvent>,
}

impl<S: KeyValueStore> Session<S> {
    /// Load settings and records from `store` and start on the first level
    pub fn new(store: S, seed: u64) -> Self {
        let settings = Settings::load(&store);
        let mut game = Game::builtin().with_best_moves(BestMoves::load(&store));
        if let Err(e) = game.set_ruleset(settings.ruleset()) {
            log::warn!("Ruleset '{}' refused ({e}), keeping defaults", settings.preset.as_str());
        }

        let mut session = Self {
            game,
            settings,
            store,
            rng: Pcg32::seed_from_u64(seed),
            pending: Vec::new(),
        };
        session.apply(&TickInput {
            load: Some(0),
            ..Default::default()
        });
        session
    }

    /// Run one tick. Returns true if the command changed the board: an
    /// accepted rotation or a level load.
    pub fn apply(&mut self, input: &TickInput) -> bool {
        let events = tick(&mut self.game, input);

        let loaded = events
            .iter()
            .any(|e| matches!(e, GameEvent::LevelLoaded { .. }));
        if loaded && self.settings.scramble {
            let seed = self.rng.random();
            self.game.load_level_scrambled(self.game.level_index(), seed);
            self.game.propagate();
        }

        let new_best = events
            .iter()
            .any(|e| matches!(e, GameEvent::LevelComplete { new_best: true, .. }));
        if new_best {
            self.game.best_moves().save(&self.store);
        }

        let changed = loaded || events.iter().any(|e| matches!(e, GameEvent::Rotated { .. }));
        self.pending.extend(events);
        changed
    }

    pub fn rotate_tile(&mut self, x: i32, y: i32, clockwise: bool) -> bool {
        self.apply(&TickInput::rotate(x, y, clockwise))
    }

    pub fn load_level(&mut self, index: usize) {
        self.apply(&TickInput {
            load: Some(index),
            ..Default::default()
        });
    }

    pub fn reset_level(&mut self) {
        self.apply(&TickInput {
            reload: true,
            ..Default::default()
        });
    }

    pub fn next_level(&mut self) {
        self.apply(&TickInput {
            advance: true,
            ..Default::default()
        });
    }

    /// Drain the events queued since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Volume for the "connect" cue, or None when the cue is switched off
    pub fn connect_volume(&self) -> Option<f32> {
        let volume = self.settings.master_volume.clamp(0.0, 1.0);
        (self.settings.connect_sound && volume > 0.0).then_some(volume)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::settings::RulesetPreset;
    use crate::sim::LevelPhase;

    fn store_with(settings: &Settings) -> MemoryStore {
        let store = MemoryStore::default();
        settings.save(&store);
        store
    }

    #[test]
    fn test_rotate_reports_mutation() {
        let mut session = Session::new(MemoryStore::default(), 1);
        session.take_events();

        assert!(session.rotate_tile(1, 0, true));
        assert!(!session.rotate_tile(0, 0, true)); // fixed source
        assert!(!session.rotate_tile(-1, 0, true));
        assert_eq!(session.game().moves(), 1);

        let events = session.take_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], GameEvent::RotateRejected { .. }));
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_new_best_is_saved() {
        let mut session = Session::new(MemoryStore::default(), 1);
        session.rotate_tile(1, 0, true);
        session.rotate_tile(3, 0, true);
        assert_eq!(session.game().phase(), LevelPhase::Complete);

        let saved = BestMoves::load(session.store());
        assert_eq!(saved.best(0), Some(2));
    }

    #[test]
    fn test_settings_pick_ruleset() {
        let settings = Settings::from_preset(RulesetPreset::FreeSources);
        let mut session = Session::new(store_with(&settings), 1);
        assert!(session.game().ruleset().rotatable_sources);
        assert!(session.rotate_tile(0, 0, true));
    }

    #[test]
    fn test_scramble_applies_on_every_load() {
        let settings = Settings {
            scramble: true,
            ..Settings::default()
        };
        let mut session = Session::new(store_with(&settings), 9);
        assert!(!session.game_mut().is_level_complete());

        session.load_level(2);
        assert_eq!(session.game().level_index(), 2);
        assert!(!session.game_mut().is_level_complete());
        assert_eq!(session.game().moves(), 0);
    }

    #[test]
    fn test_connect_volume_follows_settings() {
        let session = Session::new(MemoryStore::default(), 1);
        assert_eq!(session.connect_volume(), Some(0.8));

        let muted = Settings {
            connect_sound: false,
            ..Settings::default()
        };
        assert_eq!(Session::new(store_with(&muted), 1).connect_volume(), None);

        let silent = Settings {
            master_volume: 0.0,
            ..Settings::default()
        };
        assert_eq!(Session::new(store_with(&silent), 1).connect_volume(), None);
    }
}
