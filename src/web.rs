//! Browser bindings
//!
//! Exposes the narrow command surface to a JS front end. Commands return
//! plain values; events queue up and are drained as JSON with `takeEvents`.
//! Board state goes out as JSON so the page can render without knowing
//! Rust types.

use wasm_bindgen::prelude::*;

use crate::persistence::LocalStore;
use crate::session::Session;
use crate::sim::{BeamSegment, Board, Game, LevelPhase};

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Circuitry (wasm) starting...");
}

#[wasm_bindgen]
pub struct WebGame {
    session: Session<LocalStore>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        WebGame {
            session: Session::new(LocalStore, rand::random()),
        }
    }

    /// Out-of-range indices load the first level
    #[wasm_bindgen(js_name = loadLevel)]
    pub fn load_level(&mut self, index: usize) {
        self.session.load_level(index);
    }

    /// True if the piece turned
    #[wasm_bindgen(js_name = rotateTile)]
    pub fn rotate_tile(&mut self, x: i32, y: i32, clockwise: bool) -> bool {
        self.session.rotate_tile(x, y, clockwise)
    }

    #[wasm_bindgen(js_name = resetLevel)]
    pub fn reset_level(&mut self) {
        self.session.reset_level();
    }

    #[wasm_bindgen(js_name = nextLevel)]
    pub fn next_level(&mut self) {
        self.session.next_level();
    }

    #[wasm_bindgen(js_name = isLevelComplete)]
    pub fn is_level_complete(&mut self) -> bool {
        self.session.game_mut().is_level_complete()
    }

    #[wasm_bindgen(js_name = levelName)]
    pub fn level_name(&self, index: usize) -> Option<String> {
        self.session.game().level_name(index).map(str::to_string)
    }

    #[wasm_bindgen(js_name = levelCount)]
    pub fn level_count(&self) -> usize {
        self.session.game().level_count()
    }

    #[wasm_bindgen(js_name = bestMoves)]
    pub fn best_moves(&self, index: usize) -> Option<u32> {
        self.session.game().best_moves().best(index)
    }

    /// Events since the last call, as a JSON array
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&mut self) -> String {
        serde_json::to_string(&self.session.take_events()).unwrap_or_default()
    }

    /// Volume for the connect sound, undefined when muted
    #[wasm_bindgen(js_name = connectVolume)]
    pub fn connect_volume(&self) -> Option<f32> {
        self.session.connect_volume()
    }

    #[wasm_bindgen(js_name = showMoves)]
    pub fn show_moves(&self) -> bool {
        self.session.settings().show_moves
    }

    #[wasm_bindgen(js_name = showBest)]
    pub fn show_best(&self) -> bool {
        self.session.settings().show_best
    }

    /// Current board as JSON
    #[wasm_bindgen(js_name = boardJson)]
    pub fn board_json(&self) -> String {
        serde_json::to_string(&BoardView::from(self.session.game())).unwrap_or_default()
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(serde::Serialize)]
struct BoardView<'a> {
    level: usize,
    moves: u32,
    phase: LevelPhase,
    board: &'a Board,
    powered: Vec<glam::IVec2>,
    beam: &'a [BeamSegment],
}

impl<'a> From<&'a Game> for BoardView<'a> {
    fn from(game: &'a Game) -> Self {
        Self {
            level: game.level_index(),
            moves: game.moves(),
            phase: game.phase(),
            board: game.board(),
            powered: game.board().powered_cells(),
            beam: game.board().beam(),
        }
    }
}
