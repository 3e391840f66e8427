//! Rulesets and player preferences
//!
//! Preferences are persisted separately from best-move records.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore};

/// Default step cap for beam tracing
pub const DEFAULT_BEAM_STEP_CAP: usize = 50;

/// Default board size for mirror levels that do not declare one
pub const DEFAULT_MIRROR_BOARD: (i32, i32) = (10, 10);

/// Named rotation policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RulesetPreset {
    /// Sources and targets are fixed
    #[default]
    Classic,
    /// Sources may be turned, targets may not
    FreeSources,
    /// Targets may be turned, sources may not
    FixedSources,
}

impl RulesetPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            RulesetPreset::Classic => "Classic",
            RulesetPreset::FreeSources => "Free Sources",
            RulesetPreset::FixedSources => "Fixed Sources",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "classic" => Some(RulesetPreset::Classic),
            "freesources" | "free" => Some(RulesetPreset::FreeSources),
            "fixedsources" | "fixed" => Some(RulesetPreset::FixedSources),
            _ => None,
        }
    }

    pub fn ruleset(&self) -> Ruleset {
        let (rotatable_sources, rotatable_targets) = match self {
            RulesetPreset::Classic => (false, false),
            RulesetPreset::FreeSources => (true, false),
            RulesetPreset::FixedSources => (false, true),
        };
        Ruleset {
            rotatable_sources,
            rotatable_targets,
            ..Ruleset::default()
        }
    }
}

/// Gameplay rules applied by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Player may turn source tiles
    pub rotatable_sources: bool,
    /// Player may turn target tiles
    pub rotatable_targets: bool,
    /// Hard bound on traced beam segments per laser
    pub beam_step_cap: usize,
    /// Board size for mirror levels that omit it
    pub mirror_board_size: (i32, i32),
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            rotatable_sources: false,
            rotatable_targets: false,
            beam_step_cap: DEFAULT_BEAM_STEP_CAP,
            mirror_board_size: DEFAULT_MIRROR_BOARD,
        }
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Rotation policy
    pub preset: RulesetPreset,
    /// Scramble pieces on every level load
    #[serde(default)]
    pub scramble: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Play a sound when more targets light up
    pub connect_sound: bool,

    // === HUD ===
    /// Show the move counter
    pub show_moves: bool,
    /// Show best moves per level
    pub show_best: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preset: RulesetPreset::Classic,
            scramble: false,

            master_volume: 0.8,
            connect_sound: true,

            show_moves: true,
            show_best: true,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "circuitry_settings";

    pub fn from_preset(preset: RulesetPreset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Ruleset for the chosen preset
    pub fn ruleset(&self) -> Ruleset {
        self.preset.ruleset()
    }

    /// Load from a store, falling back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match persistence::load_json::<Settings>(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unreadable ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Best-effort save
    pub fn save(&self, store: &dyn KeyValueStore) {
        match persistence::save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_presets() {
        let classic = RulesetPreset::Classic.ruleset();
        assert!(!classic.rotatable_sources && !classic.rotatable_targets);
        let free = RulesetPreset::FreeSources.ruleset();
        assert!(free.rotatable_sources && !free.rotatable_targets);
        let fixed = RulesetPreset::FixedSources.ruleset();
        assert!(!fixed.rotatable_sources && fixed.rotatable_targets);
        assert_eq!(fixed.beam_step_cap, DEFAULT_BEAM_STEP_CAP);
    }

    #[test]
    fn test_preset_names() {
        for preset in [
            RulesetPreset::Classic,
            RulesetPreset::FreeSources,
            RulesetPreset::FixedSources,
        ] {
            assert_eq!(RulesetPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(RulesetPreset::from_str("free"), Some(RulesetPreset::FreeSources));
        assert_eq!(RulesetPreset::from_str("hard"), None);
    }

    #[test]
    fn test_settings_persist() {
        let store = MemoryStore::default();
        assert_eq!(Settings::load(&store), Settings::default());

        let settings = Settings {
            scramble: true,
            ..Settings::from_preset(RulesetPreset::FreeSources)
        };
        settings.save(&store);
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        let store = MemoryStore::default();
        store.insert_raw(Settings::STORAGE_KEY, "{not json");
        assert_eq!(Settings::load(&store), Settings::default());
    }
}
