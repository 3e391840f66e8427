//! Grid / level state
//!
//! Owns the row-major tile array plus secondary indices of source and target
//! coordinates. Indices are rebuilt on load and patched on every structural edit.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::tile::{Tile, TileKind};
use crate::levels::{LaserSource, LevelDescriptor, MirrorLevel, PipeLevel};
use crate::settings::Ruleset;

/// Which propagation model a board is played with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelKind {
    /// Connector tiles, powered by reachability from sources
    Pipe,
    /// Mirrors, lit by tracing laser beams
    Beam,
}

/// One straight step of a traced beam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamSegment {
    pub from: IVec2,
    pub to: IVec2,
}

impl BeamSegment {
    pub fn touches(&self, pos: IVec2) -> bool {
        self.from == pos || self.to == pos
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    kind: LevelKind,
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    sources: Vec<IVec2>,
    targets: Vec<IVec2>,
    lasers: Vec<LaserSource>,
    /// Last traced beam (beam levels only)
    #[serde(skip)]
    beam: Vec<BeamSegment>,
}

impl Board {
    /// An all-empty board
    pub fn new(kind: LevelKind, width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let tiles = (0..height)
            .flat_map(|y| (0..width).map(move |x| Tile::empty(IVec2::new(x, y))))
            .collect();
        Self {
            kind,
            width,
            height,
            tiles,
            sources: Vec::new(),
            targets: Vec::new(),
            lasers: Vec::new(),
            beam: Vec::new(),
        }
    }

    /// Build a fresh board from a descriptor.
    ///
    /// Lenient: short rows are padded with empty cells and missing rotations
    /// default to 0, each with a warning. Catalog validation is where
    /// malformed data is rejected.
    pub fn from_descriptor(descriptor: &LevelDescriptor, ruleset: &Ruleset) -> Self {
        match descriptor {
            LevelDescriptor::Pipe(level) => Self::from_pipe(level),
            LevelDescriptor::Mirror(level) => Self::from_mirror(level, ruleset),
        }
    }

    fn from_pipe(level: &PipeLevel) -> Self {
        let width = level.width();
        let height = level.height();
        let mut board = Self::new(LevelKind::Pipe, width as i32, height as i32);

        let cells = width * height;
        if level.rotations.len() < cells {
            log::warn!(
                "Level '{}': {} rotations for {} cells, missing entries default to 0",
                level.name,
                level.rotations.len(),
                cells
            );
        } else if level.rotations.len() > cells {
            log::warn!(
                "Level '{}': ignoring {} extra rotations",
                level.name,
                level.rotations.len() - cells
            );
        }

        for (y, row) in level.grid.iter().enumerate() {
            if row.len() != width {
                log::warn!(
                    "Level '{}': row {} has {} cells, expected {}",
                    level.name,
                    y,
                    row.len(),
                    width
                );
            }
            for (x, &kind) in row.iter().take(width).enumerate() {
                let cell = y * width + x;
                let kind = if kind == TileKind::Mirror {
                    log::warn!("Level '{}': mirror at ({}, {}) left empty", level.name, x, y);
                    TileKind::Empty
                } else {
                    kind
                };
                let rotation = level
                    .rotations
                    .get(cell)
                    .map(|r| r.rem_euclid(4) as u8)
                    .unwrap_or(0);
                board.place_tile(IVec2::new(x as i32, y as i32), kind, rotation);
            }
        }

        for bulb in &level.bulbs {
            if let Some(tile) = board.tile_mut(IVec2::new(bulb.x, bulb.y)) {
                if tile.kind == TileKind::Target {
                    tile.bulb = Some(bulb.bulb.clamp(1, 4));
                }
            }
        }
        board.assign_default_bulbs();
        board
    }

    fn from_mirror(level: &MirrorLevel, ruleset: &Ruleset) -> Self {
        let (default_w, default_h) = ruleset.mirror_board_size;
        let width = level.width.unwrap_or(default_w);
        let height = level.height.unwrap_or(default_h);
        let mut board = Self::new(LevelKind::Beam, width, height);

        for mirror in &level.mirrors {
            let pos = IVec2::new(mirror.x, mirror.y);
            if !board.place_tile(pos, TileKind::Mirror, mirror.angle) {
                log::warn!("Level '{}': mirror at {} is off the board", level.name, pos);
            }
        }
        for target in &level.targets {
            let pos = IVec2::new(target.x, target.y);
            if !board.place_tile(pos, TileKind::Target, 0) {
                log::warn!("Level '{}': target at {} is off the board", level.name, pos);
            }
        }
        board.lasers.push(level.laser);
        board.assign_default_bulbs();
        board
    }

    /// Targets without an authored bulb cycle through variants 1-4
    fn assign_default_bulbs(&mut self) {
        for (ordinal, pos) in self.targets.clone().into_iter().enumerate() {
            if let Some(tile) = self.tile_mut(pos) {
                if tile.bulb.is_none() {
                    tile.bulb = Some((ordinal % 4) as u8 + 1);
                }
            }
        }
    }

    pub fn kind(&self) -> LevelKind {
        self.kind
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    #[inline]
    fn index(&self, pos: IVec2) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, pos: IVec2) -> Option<&Tile> {
        self.index(pos).and_then(|i| self.tiles.get(i))
    }

    pub(crate) fn tile_mut(&mut self, pos: IVec2) -> Option<&mut Tile> {
        self.index(pos).and_then(|i| self.tiles.get_mut(i))
    }

    /// All tiles, row-major
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn sources(&self) -> &[IVec2] {
        &self.sources
    }

    pub fn targets(&self) -> &[IVec2] {
        &self.targets
    }

    pub fn lasers(&self) -> &[LaserSource] {
        &self.lasers
    }

    pub fn add_laser(&mut self, laser: LaserSource) {
        self.lasers.push(laser);
    }

    pub fn beam(&self) -> &[BeamSegment] {
        &self.beam
    }

    pub(crate) fn set_beam(&mut self, beam: Vec<BeamSegment>) {
        self.beam = beam;
    }

    pub fn is_powered(&self, pos: IVec2) -> bool {
        self.tile(pos).map(|t| t.powered).unwrap_or(false)
    }

    /// Coordinates of every energized cell, row-major
    pub fn powered_cells(&self) -> Vec<IVec2> {
        self.tiles
            .iter()
            .filter(|t| t.powered)
            .map(|t| t.pos)
            .collect()
    }

    /// Number of targets currently energized or hit
    pub fn targets_powered(&self) -> usize {
        self.targets.iter().filter(|&&p| self.is_powered(p)).count()
    }

    /// Clear all derived state ahead of a propagation pass
    pub fn reset_power(&mut self) {
        for tile in &mut self.tiles {
            tile.powered = false;
        }
        self.beam.clear();
    }

    /// Put a piece on a cell, keeping the source/target indices in sync.
    /// Returns false if `pos` is off the board.
    pub fn place_tile(&mut self, pos: IVec2, kind: TileKind, rotation: u8) -> bool {
        let Some(previous) = self.tile(pos).map(|t| t.kind) else {
            return false;
        };
        self.unindex(pos, previous);
        if let Some(tile) = self.tile_mut(pos) {
            *tile = Tile::new(pos, kind, rotation);
        }
        match kind {
            TileKind::Source => self.sources.push(pos),
            TileKind::Target => self.targets.push(pos),
            _ => {}
        }
        true
    }

    /// Empty a cell. Returns false if `pos` is off the board.
    pub fn clear_tile(&mut self, pos: IVec2) -> bool {
        self.place_tile(pos, TileKind::Empty, 0)
    }

    fn unindex(&mut self, pos: IVec2, kind: TileKind) {
        let index = match kind {
            TileKind::Source => &mut self.sources,
            TileKind::Target => &mut self.targets,
            _ => return,
        };
        if let Some(i) = index.iter().position(|&p| p == pos) {
            index.remove(i);
        }
    }

    /// Whether the player may turn the piece at `pos` under `ruleset`
    pub fn is_rotatable(&self, pos: IVec2, ruleset: &Ruleset) -> bool {
        match self.tile(pos).map(|t| t.kind) {
            None | Some(TileKind::Empty) => false,
            Some(TileKind::Source) => ruleset.rotatable_sources,
            Some(TileKind::Target) => ruleset.rotatable_targets,
            Some(_) => true,
        }
    }

    /// Turn one piece. Fails (false, no mutation) for off-board or
    /// non-rotatable cells. Does not propagate.
    pub fn rotate(&mut self, pos: IVec2, clockwise: bool, ruleset: &Ruleset) -> bool {
        if !self.is_rotatable(pos, ruleset) {
            return false;
        }
        match self.tile_mut(pos) {
            Some(tile) => {
                tile.rotate(clockwise);
                true
            }
            None => false,
        }
    }

    /// Randomize the rotation of every player-rotatable piece
    pub fn scramble<R: Rng>(&mut self, rng: &mut R, ruleset: &Ruleset) {
        for i in 0..self.tiles.len() {
            let pos = self.tiles[i].pos;
            if self.is_rotatable(pos, ruleset) {
                let tile = &mut self.tiles[i];
                tile.rotation = rng.random_range(0..tile.kind.rotation_states());
            }
        }
    }

    /// Rotations of every cell, row-major
    pub fn rotations(&self) -> Vec<u8> {
        self.tiles.iter().map(|t| t.rotation).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{Bulb, Mirror, Target};
    use crate::sim::Direction;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn pipe_level(grid: Vec<Vec<TileKind>>, rotations: Vec<i32>) -> LevelDescriptor {
        LevelDescriptor::Pipe(PipeLevel {
            name: "test".to_string(),
            grid,
            rotations,
            bulbs: Vec::new(),
        })
    }

    #[test]
    fn test_load_builds_indices() {
        use TileKind::*;
        let level = pipe_level(
            vec![vec![Source, Straight, Target], vec![Target, Empty, Source]],
            vec![0, 1, 0, 0, 0, 2],
        );
        let board = Board::from_descriptor(&level, &Ruleset::default());
        assert_eq!(board.width(), 3);
        assert_eq!(board.height(), 2);
        assert_eq!(board.sources(), &[IVec2::new(0, 0), IVec2::new(2, 1)]);
        assert_eq!(board.targets(), &[IVec2::new(2, 0), IVec2::new(0, 1)]);
        assert_eq!(board.tile(IVec2::new(1, 0)).map(|t| t.rotation), Some(1));
        assert!(board.tiles().iter().all(|t| !t.powered));
    }

    #[test]
    fn test_lenient_rotations_and_rows() {
        use TileKind::*;
        let level = pipe_level(vec![vec![Source, Corner, Target], vec![Corner]], vec![0, 7]);
        let board = Board::from_descriptor(&level, &Ruleset::default());
        assert_eq!(board.tiles().len(), 6);
        // 7 wraps to 3; missing entries become 0
        assert_eq!(board.rotations(), vec![0, 3, 0, 0, 0, 0]);
        assert_eq!(board.tile(IVec2::new(1, 1)).map(|t| t.kind), Some(Empty));
    }

    #[test]
    fn test_mirror_in_pipe_grid_left_empty() {
        use TileKind::*;
        let level = pipe_level(vec![vec![Source, Mirror, Target]], vec![0, 1, 0]);
        let board = Board::from_descriptor(&level, &Ruleset::default());
        assert_eq!(board.tile(IVec2::new(1, 0)).map(|t| t.kind), Some(Empty));
        assert!(!board.is_rotatable(IVec2::new(1, 0), &Ruleset::default()));
    }

    #[test]
    fn test_bulbs() {
        use TileKind::*;
        let level = LevelDescriptor::Pipe(PipeLevel {
            name: "bulbs".to_string(),
            grid: vec![vec![Source, Target, Target]],
            rotations: vec![0, 0, 0],
            bulbs: vec![Bulb {
                x: 2,
                y: 0,
                bulb: 4,
            }],
        });
        let board = Board::from_descriptor(&level, &Ruleset::default());
        assert_eq!(board.tile(IVec2::new(1, 0)).and_then(|t| t.bulb), Some(1));
        assert_eq!(board.tile(IVec2::new(2, 0)).and_then(|t| t.bulb), Some(4));
        assert_eq!(board.tile(IVec2::new(0, 0)).and_then(|t| t.bulb), None);
    }

    #[test]
    fn test_mirror_board() {
        let level = LevelDescriptor::Mirror(MirrorLevel {
            name: "m".to_string(),
            width: None,
            height: Some(6),
            mirrors: vec![
                Mirror {
                    x: 5,
                    y: 2,
                    angle: 1,
                },
                Mirror {
                    x: 20,
                    y: 2,
                    angle: 0,
                },
            ],
            targets: vec![Target { x: 5, y: 4 }],
            laser: LaserSource {
                x: 1,
                y: 2,
                dir: Direction::Right,
            },
        });
        let board = Board::from_descriptor(&level, &Ruleset::default());
        assert_eq!(board.kind(), LevelKind::Beam);
        assert_eq!((board.width(), board.height()), (10, 6));
        assert_eq!(board.targets(), &[IVec2::new(5, 4)]);
        assert!(board.sources().is_empty());
        assert_eq!(board.lasers().len(), 1);
        let mirrors = board
            .tiles()
            .iter()
            .filter(|t| t.kind == TileKind::Mirror)
            .count();
        assert_eq!(mirrors, 1);
    }

    #[test]
    fn test_structural_edits_keep_indices() {
        let mut board = Board::new(LevelKind::Pipe, 3, 3);
        assert!(board.place_tile(IVec2::new(0, 0), TileKind::Source, 0));
        assert!(board.place_tile(IVec2::new(2, 2), TileKind::Target, 0));
        assert!(board.place_tile(IVec2::new(1, 1), TileKind::Target, 0));
        assert_eq!(board.targets().len(), 2);

        // Overwrite a target with a source
        assert!(board.place_tile(IVec2::new(2, 2), TileKind::Source, 0));
        assert_eq!(board.targets(), &[IVec2::new(1, 1)]);
        assert_eq!(board.sources(), &[IVec2::new(0, 0), IVec2::new(2, 2)]);

        assert!(board.clear_tile(IVec2::new(0, 0)));
        assert_eq!(board.sources(), &[IVec2::new(2, 2)]);

        assert!(!board.place_tile(IVec2::new(3, 0), TileKind::Target, 0));
        assert!(!board.clear_tile(IVec2::new(-1, 0)));
        assert_eq!(board.targets().len(), 1);
    }

    #[test]
    fn test_rotate_rules() {
        let mut board = Board::new(LevelKind::Pipe, 3, 1);
        board.place_tile(IVec2::new(0, 0), TileKind::Source, 0);
        board.place_tile(IVec2::new(1, 0), TileKind::Corner, 0);
        board.place_tile(IVec2::new(2, 0), TileKind::Target, 0);

        let classic = Ruleset::default();
        assert!(board.rotate(IVec2::new(1, 0), true, &classic));
        assert!(!board.rotate(IVec2::new(0, 0), true, &classic));
        assert!(!board.rotate(IVec2::new(2, 0), true, &classic));
        assert!(!board.rotate(IVec2::new(-1, 0), true, &classic));
        assert!(!board.rotate(IVec2::new(5, 5), true, &classic));

        let free = Ruleset {
            rotatable_sources: true,
            ..Ruleset::default()
        };
        assert!(board.rotate(IVec2::new(0, 0), false, &free));
        assert_eq!(board.tile(IVec2::new(0, 0)).map(|t| t.rotation), Some(3));
        assert_eq!(board.tile(IVec2::new(1, 0)).map(|t| t.rotation), Some(1));
    }

    #[test]
    fn test_empty_cells_never_rotate() {
        let mut board = Board::new(LevelKind::Pipe, 2, 2);
        let before = board.rotations();
        assert!(!board.rotate(IVec2::new(1, 1), true, &Ruleset::default()));
        assert_eq!(board.rotations(), before);
    }

    #[test]
    fn test_scramble_is_seeded() {
        let level = crate::levels::LevelCatalog::builtin();
        let ruleset = Ruleset::default();
        let Some(descriptor) = level.get(2) else {
            panic!("builtin level 2 missing");
        };
        let mut a = Board::from_descriptor(descriptor, &ruleset);
        let mut b = Board::from_descriptor(descriptor, &ruleset);
        a.scramble(&mut Pcg32::seed_from_u64(7), &ruleset);
        b.scramble(&mut Pcg32::seed_from_u64(7), &ruleset);
        assert_eq!(a.rotations(), b.rotations());

        // Fixed pieces keep their authored rotation
        let source = a.sources()[0];
        assert_eq!(a.tile(source).map(|t| t.rotation), Some(0));
    }
}
