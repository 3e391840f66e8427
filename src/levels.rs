//! Level descriptors and the level catalog
//!
//! Two descriptor shapes are accepted:
//! - pipe: `{ name, grid: [[kind]], rotations: [int] }` (rotations row-major)
//! - mirror: `{ name, mirrors: [{x,y,angle}], targets: [{x,y}], laser: {x,y,dir} }`
//!
//! Catalogs are validated strictly when constructed. Building a board from a
//! single unvalidated descriptor is lenient (see `sim::board`).

use std::collections::HashSet;

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::DEFAULT_MIRROR_BOARD;
use crate::sim::{Direction, TileKind};

/// Errors found while loading or validating level data
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level catalog could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level catalog has no levels")]
    Empty,
    #[error("level {level}: board has no cells")]
    Dimensions { level: usize },
    #[error("level {level}: row {row} has {found} cells, expected {expected}")]
    RaggedGrid {
        level: usize,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("level {level}: {found} rotations for {expected} cells")]
    RotationCount {
        level: usize,
        expected: usize,
        found: usize,
    },
    #[error("level {level}: rotation {value} at cell {cell} is outside 0..={max}")]
    RotationValue {
        level: usize,
        cell: usize,
        value: i32,
        max: i32,
    },
    #[error("level {level}: {what} at ({x}, {y}) is outside the board")]
    OutOfBounds {
        level: usize,
        what: &'static str,
        x: i32,
        y: i32,
    },
    #[error("level {level}: bulb at ({x}, {y}) must be 1-4 and sit on a target")]
    Bulb { level: usize, x: i32, y: i32 },
    #[error("level {level}: mirror at row {row}, column {col} of a pipe grid")]
    MirrorInPipeGrid {
        level: usize,
        row: usize,
        col: usize,
    },
    #[error("level {level}: more than one piece at ({x}, {y})")]
    Duplicate { level: usize, x: i32, y: i32 },
}

/// Cosmetic bulb assignment for a pipe target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bulb {
    pub x: i32,
    pub y: i32,
    pub bulb: u8,
}

/// Pipe puzzle descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeLevel {
    pub name: String,
    /// Rows of cell kinds; width comes from the first row
    pub grid: Vec<Vec<TileKind>>,
    /// One rotation per cell, row-major
    #[serde(default)]
    pub rotations: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bulbs: Vec<Bulb>,
}

impl PipeLevel {
    pub fn width(&self) -> usize {
        self.grid.first().map(Vec::len).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }
}

/// Mirror placement in a beam descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mirror {
    pub x: i32,
    pub y: i32,
    /// 0 = `\`, 1 = `/`
    pub angle: u8,
}

/// Target placement in a beam descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub x: i32,
    pub y: i32,
}

/// Fixed laser emitter; immutable once a level is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaserSource {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
}

impl LaserSource {
    pub fn pos(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }
}

/// Mirror puzzle descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorLevel {
    pub name: String,
    /// Board size; the ruleset default applies when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    pub mirrors: Vec<Mirror>,
    pub targets: Vec<Target>,
    pub laser: LaserSource,
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelDescriptor {
    Pipe(PipeLevel),
    Mirror(MirrorLevel),
}

impl LevelDescriptor {
    pub fn name(&self) -> &str {
        match self {
            LevelDescriptor::Pipe(level) => &level.name,
            LevelDescriptor::Mirror(level) => &level.name,
        }
    }

    /// Strict check used at catalog construction. `index` is reported in errors.
    pub fn validate(&self, index: usize, default_size: (i32, i32)) -> Result<(), LevelError> {
        match self {
            LevelDescriptor::Pipe(level) => validate_pipe(level, index),
            LevelDescriptor::Mirror(level) => validate_mirror(level, index, default_size),
        }
    }
}

fn validate_pipe(level: &PipeLevel, index: usize) -> Result<(), LevelError> {
    let width = level.width();
    if width == 0 {
        return Err(LevelError::Dimensions { level: index });
    }
    for (row, cells) in level.grid.iter().enumerate() {
        if cells.len() != width {
            return Err(LevelError::RaggedGrid {
                level: index,
                row,
                expected: width,
                found: cells.len(),
            });
        }
        if let Some(col) = cells.iter().position(|&k| k == TileKind::Mirror) {
            return Err(LevelError::MirrorInPipeGrid {
                level: index,
                row,
                col,
            });
        }
    }

    let cells = width * level.height();
    if level.rotations.len() != cells {
        return Err(LevelError::RotationCount {
            level: index,
            expected: cells,
            found: level.rotations.len(),
        });
    }
    if let Some((cell, &value)) = level
        .rotations
        .iter()
        .enumerate()
        .find(|(_, r)| !(0..=3).contains(*r))
    {
        return Err(LevelError::RotationValue {
            level: index,
            cell,
            value,
            max: 3,
        });
    }

    for bulb in &level.bulbs {
        let kind = usize::try_from(bulb.y)
            .ok()
            .zip(usize::try_from(bulb.x).ok())
            .and_then(|(y, x)| level.grid.get(y).and_then(|row| row.get(x)));
        match kind {
            None => {
                return Err(LevelError::OutOfBounds {
                    level: index,
                    what: "bulb",
                    x: bulb.x,
                    y: bulb.y,
                });
            }
            Some(TileKind::Target) if (1..=4).contains(&bulb.bulb) => {}
            Some(_) => {
                return Err(LevelError::Bulb {
                    level: index,
                    x: bulb.x,
                    y: bulb.y,
                });
            }
        }
    }
    Ok(())
}

fn validate_mirror(
    level: &MirrorLevel,
    index: usize,
    default_size: (i32, i32),
) -> Result<(), LevelError> {
    let width = level.width.unwrap_or(default_size.0);
    let height = level.height.unwrap_or(default_size.1);
    if width <= 0 || height <= 0 {
        return Err(LevelError::Dimensions { level: index });
    }
    let in_bounds = |x: i32, y: i32| x >= 0 && y >= 0 && x < width && y < height;

    let mut occupied = HashSet::new();
    let laser = level.laser;
    if !in_bounds(laser.x, laser.y) {
        return Err(LevelError::OutOfBounds {
            level: index,
            what: "laser",
            x: laser.x,
            y: laser.y,
        });
    }
    occupied.insert((laser.x, laser.y));

    let pieces = level
        .mirrors
        .iter()
        .map(|m| ("mirror", m.x, m.y))
        .chain(level.targets.iter().map(|t| ("target", t.x, t.y)));
    for (what, x, y) in pieces {
        if !in_bounds(x, y) {
            return Err(LevelError::OutOfBounds {
                level: index,
                what,
                x,
                y,
            });
        }
        if !occupied.insert((x, y)) {
            return Err(LevelError::Duplicate { level: index, x, y });
        }
    }

    if let Some((cell, mirror)) = level
        .mirrors
        .iter()
        .enumerate()
        .find(|(_, m)| m.angle > 1)
    {
        return Err(LevelError::RotationValue {
            level: index,
            cell,
            value: i32::from(mirror.angle),
            max: 1,
        });
    }
    Ok(())
}

/// Ordered, read-only list of levels.
///
/// Deserializing goes through validation against the default mirror board
/// size, so a catalog value is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LevelDescriptor>", into = "Vec<LevelDescriptor>")]
pub struct LevelCatalog {
    levels: Vec<LevelDescriptor>,
}

impl TryFrom<Vec<LevelDescriptor>> for LevelCatalog {
    type Error = LevelError;

    fn try_from(levels: Vec<LevelDescriptor>) -> Result<Self, Self::Error> {
        Self::new(levels, DEFAULT_MIRROR_BOARD)
    }
}

impl From<LevelCatalog> for Vec<LevelDescriptor> {
    fn from(catalog: LevelCatalog) -> Self {
        catalog.levels
    }
}

impl LevelCatalog {
    /// Build a catalog, validating every descriptor against the given
    /// default mirror board size
    pub fn new(levels: Vec<LevelDescriptor>, default_size: (i32, i32)) -> Result<Self, LevelError> {
        let catalog = Self { levels };
        catalog.validate(default_size)?;
        Ok(catalog)
    }

    /// Parse a JSON array of descriptors and validate it
    pub fn from_json(json: &str, default_size: (i32, i32)) -> Result<Self, LevelError> {
        let levels: Vec<LevelDescriptor> = serde_json::from_str(json)?;
        let catalog = Self::new(levels, default_size)?;
        log::info!("Loaded {} levels from JSON", catalog.len());
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every entry; the first failure wins
    pub fn validate(&self, default_size: (i32, i32)) -> Result<(), LevelError> {
        if self.levels.is_empty() {
            return Err(LevelError::Empty);
        }
        for (index, level) in self.levels.iter().enumerate() {
            level.validate(index, default_size)?;
        }
        Ok(())
    }

    /// The levels shipped with the game
    pub fn builtin() -> Self {
        Self {
            levels: builtin_levels(),
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LevelDescriptor> {
        self.levels.get(index)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.levels.get(index).map(LevelDescriptor::name)
    }

    /// Map an out-of-range index to the first level
    pub fn clamp_index(&self, index: usize) -> usize {
        if index < self.levels.len() { index } else { 0 }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelDescriptor> {
        self.levels.iter()
    }
}

fn pipe(name: &str, grid: &[&[TileKind]], rotations: &[i32]) -> LevelDescriptor {
    LevelDescriptor::Pipe(PipeLevel {
        name: name.to_string(),
        grid: grid.iter().map(|row| row.to_vec()).collect(),
        rotations: rotations.to_vec(),
        bulbs: Vec::new(),
    })
}

fn beam(
    name: &str,
    laser: (i32, i32, Direction),
    mirrors: &[(i32, i32, u8)],
    targets: &[(i32, i32)],
) -> LevelDescriptor {
    LevelDescriptor::Mirror(MirrorLevel {
        name: name.to_string(),
        width: None,
        height: None,
        mirrors: mirrors
            .iter()
            .map(|&(x, y, angle)| Mirror { x, y, angle })
            .collect(),
        targets: targets.iter().map(|&(x, y)| Target { x, y }).collect(),
        laser: LaserSource {
            x: laser.0,
            y: laser.1,
            dir: laser.2,
        },
    })
}

fn builtin_levels() -> Vec<LevelDescriptor> {
    use TileKind::{
        Corner as C, Cross as X, Empty as E, Source as S, Straight as I, TJunction as T,
        Target as G,
    };

    vec![
        pipe(
            "First Light",
            &[&[S, I, I, I, G], &[E, E, E, E, E], &[E, E, E, E, E]],
            &[0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        ),
        pipe(
            "Bend",
            &[&[S, C, E, E], &[E, I, E, E], &[E, C, I, G], &[E, E, E, E]],
            &[0, 1, 0, 0, 0, 1, 0, 0, 0, 3, 0, 0, 0, 0, 0, 0],
        ),
        pipe(
            "Fork",
            &[
                &[E, E, C, I, G],
                &[E, E, I, E, E],
                &[S, I, T, E, E],
                &[E, E, I, E, E],
                &[E, E, C, I, G],
            ],
            &[
                0, 0, 0, 0, 0, //
                0, 0, 1, 0, 0, //
                0, 0, 0, 0, 0, //
                0, 0, 1, 0, 0, //
                0, 0, 2, 0, 0,
            ],
        ),
        pipe(
            "Crossroads",
            &[
                &[E, E, S, E, E],
                &[E, E, I, E, E],
                &[S, I, X, I, G],
                &[E, E, I, E, E],
                &[E, E, G, E, E],
            ],
            &[
                0, 0, 1, 0, 0, //
                0, 0, 1, 0, 0, //
                0, 0, 0, 0, 0, //
                0, 0, 1, 0, 0, //
                0, 0, 0, 0, 0,
            ],
        ),
        beam("Reflection", (1, 2, Direction::Right), &[(5, 2, 1)], &[(5, 4)]),
        beam(
            "Zigzag",
            (0, 0, Direction::Right),
            &[(4, 0, 1), (4, 5, 1), (8, 5, 0)],
            &[(8, 9)],
        ),
        beam(
            "Periscope",
            (0, 5, Direction::Right),
            &[(3, 5, 0), (3, 1, 0), (7, 1, 1)],
            &[(3, 3), (7, 6)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: (i32, i32) = (10, 10);

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = LevelCatalog::builtin();
        assert!(catalog.validate(SIZE).is_ok());
        assert_eq!(catalog.name(0), Some("First Light"));
        assert_eq!(catalog.name(catalog.len()), None);
    }

    #[test]
    fn test_clamp_index() {
        let catalog = LevelCatalog::builtin();
        assert_eq!(catalog.clamp_index(2), 2);
        assert_eq!(catalog.clamp_index(catalog.len()), 0);
        assert_eq!(catalog.clamp_index(usize::MAX), 0);
    }

    #[test]
    fn test_parse_both_shapes() {
        let json = r#"[
            { "name": "a", "grid": [["source", "straight", "target"]], "rotations": [0, 1, 0] },
            { "name": "b", "mirrors": [{"x": 5, "y": 2, "angle": 1}],
              "targets": [{"x": 5, "y": 4}], "laser": {"x": 1, "y": 2, "dir": "right"} }
        ]"#;
        let catalog = LevelCatalog::from_json(json, SIZE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(matches!(catalog.get(0), Some(LevelDescriptor::Pipe(_))));
        match catalog.get(1) {
            Some(LevelDescriptor::Mirror(level)) => {
                assert_eq!(level.laser.dir, Direction::Right);
                assert_eq!(level.mirrors[0].angle, 1);
            }
            other => panic!("expected mirror level, got {other:?}"),
        }
    }

    #[test]
    fn test_rotation_count_mismatch_names_level() {
        let json = r#"[
            { "name": "ok", "grid": [["source", "target"]], "rotations": [0, 0] },
            { "name": "bad", "grid": [["source", "target"]], "rotations": [0] }
        ]"#;
        let err = LevelCatalog::from_json(json, SIZE).unwrap_err();
        assert!(matches!(
            err,
            LevelError::RotationCount {
                level: 1,
                expected: 2,
                found: 1
            }
        ));
        assert!(err.to_string().starts_with("level 1"));
    }

    #[test]
    fn test_ragged_and_unknown_kind() {
        let ragged = r#"[{ "name": "r", "grid": [["source", "target"], ["empty"]],
            "rotations": [0, 0, 0] }]"#;
        assert!(matches!(
            LevelCatalog::from_json(ragged, SIZE),
            Err(LevelError::RaggedGrid { row: 1, .. })
        ));

        let unknown = r#"[{ "name": "u", "grid": [["source", "valve"]], "rotations": [0, 0] }]"#;
        assert!(matches!(
            LevelCatalog::from_json(unknown, SIZE),
            Err(LevelError::Parse(_))
        ));
    }

    #[test]
    fn test_rotation_value_range() {
        let json = r#"[{ "name": "v", "grid": [["source", "corner"]], "rotations": [0, 4] }]"#;
        assert!(matches!(
            LevelCatalog::from_json(json, SIZE),
            Err(LevelError::RotationValue {
                cell: 1,
                value: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_mirror_bounds_and_duplicates() {
        let outside = beam("o", (1, 1, Direction::Up), &[(10, 2, 0)], &[(0, 0)]);
        assert!(matches!(
            outside.validate(3, SIZE),
            Err(LevelError::OutOfBounds {
                level: 3,
                what: "mirror",
                ..
            })
        ));

        let stacked = beam("d", (1, 1, Direction::Up), &[(4, 4, 0)], &[(4, 4)]);
        assert!(matches!(
            stacked.validate(0, SIZE),
            Err(LevelError::Duplicate { x: 4, y: 4, .. })
        ));

        let bad_angle = beam("a", (1, 1, Direction::Up), &[(4, 4, 2)], &[(0, 0)]);
        assert!(matches!(
            bad_angle.validate(0, SIZE),
            Err(LevelError::RotationValue { max: 1, .. })
        ));
    }

    #[test]
    fn test_bulbs_must_sit_on_targets() {
        let mut level = PipeLevel {
            name: "b".to_string(),
            grid: vec![vec![TileKind::Source, TileKind::Target]],
            rotations: vec![0, 0],
            bulbs: vec![Bulb {
                x: 1,
                y: 0,
                bulb: 3,
            }],
        };
        assert!(validate_pipe(&level, 0).is_ok());
        level.bulbs[0].x = 0;
        assert!(matches!(validate_pipe(&level, 0), Err(LevelError::Bulb { .. })));
        level.bulbs[0].x = 1;
        level.bulbs[0].bulb = 5;
        assert!(matches!(validate_pipe(&level, 0), Err(LevelError::Bulb { .. })));
        level.bulbs[0].bulb = 1;
        level.bulbs[0].y = 3;
        assert!(matches!(validate_pipe(&level, 0), Err(LevelError::OutOfBounds { .. })));
    }

    #[test]
    fn test_mirror_cell_in_pipe_grid_rejected() {
        let json = r#"[{ "name": "m", "grid": [["source", "mirror", "target"]],
            "rotations": [0, 0, 0] }]"#;
        let err = LevelCatalog::from_json(json, SIZE).unwrap_err();
        assert!(matches!(
            err,
            LevelError::MirrorInPipeGrid {
                level: 0,
                row: 0,
                col: 1
            }
        ));
    }

    #[test]
    fn test_deserialize_runs_validation() {
        let bad = r#"[{ "name": "bad", "grid": [["source", "target"]], "rotations": [0] }]"#;
        let parsed: Result<LevelCatalog, _> = serde_json::from_str(bad);
        let err = parsed.unwrap_err();
        assert!(err.to_string().contains("level 0"));

        let empty: Result<LevelCatalog, _> = serde_json::from_str("[]");
        assert!(empty.is_err());

        let good = r#"[{ "name": "ok", "grid": [["source", "target"]], "rotations": [0, 0] }]"#;
        let catalog: LevelCatalog = serde_json::from_str(good).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(LevelCatalog::from_json("[]", SIZE), Err(LevelError::Empty)));
    }

    #[test]
    fn test_json_roundtrip_keeps_catalog() {
        let catalog = LevelCatalog::builtin();
        let json = catalog.to_json().unwrap();
        let parsed = LevelCatalog::from_json(&json, SIZE).unwrap();
        assert_eq!(parsed, catalog);
    }
}
