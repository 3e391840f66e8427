//! Tile and connector model
//!
//! A tile's connection set is a pure function of its kind and rotation.
//! Baselines below are for rotation 0; rotation turns them clockwise.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::direction::{Connections, Direction};

/// Closed set of tile kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    #[default]
    Empty,
    Straight,
    Corner,
    TJunction,
    Cross,
    Source,
    Target,
    /// Two-state reflector used by beam levels
    Mirror,
}

const STRAIGHT: Connections = Connections::of(&[Direction::Up, Direction::Down]);
const CORNER: Connections = Connections::of(&[Direction::Up, Direction::Right]);
const T_JUNCTION: Connections =
    Connections::of(&[Direction::Up, Direction::Right, Direction::Down]);
const SOURCE: Connections = Connections::of(&[Direction::Right]);

impl TileKind {
    pub const ALL: [TileKind; 8] = [
        TileKind::Empty,
        TileKind::Straight,
        TileKind::Corner,
        TileKind::TJunction,
        TileKind::Cross,
        TileKind::Source,
        TileKind::Target,
        TileKind::Mirror,
    ];

    /// Connection set at rotation 0
    pub fn base_connections(self) -> Connections {
        match self {
            TileKind::Empty | TileKind::Mirror => Connections::NONE,
            TileKind::Straight => STRAIGHT,
            TileKind::Corner => CORNER,
            TileKind::TJunction => T_JUNCTION,
            TileKind::Cross | TileKind::Target => Connections::ALL,
            TileKind::Source => SOURCE,
        }
    }

    /// Number of distinct rotation states the kind cycles through
    pub fn rotation_states(self) -> u8 {
        match self {
            TileKind::Mirror => 2,
            _ => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TileKind::Empty => "empty",
            TileKind::Straight => "straight",
            TileKind::Corner => "corner",
            TileKind::TJunction => "t_junction",
            TileKind::Cross => "cross",
            TileKind::Source => "source",
            TileKind::Target => "target",
            TileKind::Mirror => "mirror",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "empty" | "" => Some(TileKind::Empty),
            "straight" => Some(TileKind::Straight),
            "corner" => Some(TileKind::Corner),
            "t_junction" | "tjunction" | "t" => Some(TileKind::TJunction),
            "cross" => Some(TileKind::Cross),
            "source" => Some(TileKind::Source),
            "target" => Some(TileKind::Target),
            "mirror" => Some(TileKind::Mirror),
            _ => None,
        }
    }
}

/// Connection set for a kind at a given rotation
#[inline]
pub fn connections(kind: TileKind, rotation: u8) -> Connections {
    kind.base_connections().rotated(rotation % 4)
}

/// Mirror reflection axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MirrorAngle {
    /// `\` (angle 0)
    #[default]
    Backslash,
    /// `/` (angle 1)
    Slash,
}

impl MirrorAngle {
    pub fn from_index(index: u8) -> Self {
        if index % 2 == 0 {
            MirrorAngle::Backslash
        } else {
            MirrorAngle::Slash
        }
    }

    pub fn index(self) -> u8 {
        match self {
            MirrorAngle::Backslash => 0,
            MirrorAngle::Slash => 1,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            MirrorAngle::Backslash => MirrorAngle::Slash,
            MirrorAngle::Slash => MirrorAngle::Backslash,
        }
    }

    /// New travel direction of a beam entering the mirror's cell
    pub fn reflect(self, dir: Direction) -> Direction {
        match (self, dir) {
            (MirrorAngle::Backslash, Direction::Right) => Direction::Down,
            (MirrorAngle::Backslash, Direction::Left) => Direction::Up,
            (MirrorAngle::Backslash, Direction::Up) => Direction::Left,
            (MirrorAngle::Backslash, Direction::Down) => Direction::Right,
            (MirrorAngle::Slash, Direction::Right) => Direction::Up,
            (MirrorAngle::Slash, Direction::Left) => Direction::Down,
            (MirrorAngle::Slash, Direction::Up) => Direction::Right,
            (MirrorAngle::Slash, Direction::Down) => Direction::Left,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            MirrorAngle::Backslash => '\\',
            MirrorAngle::Slash => '/',
        }
    }
}

/// One grid cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub pos: IVec2,
    pub kind: TileKind,
    /// Quarter turns clockwise (mirrors use 0/1 for their angle)
    pub rotation: u8,
    /// Derived by propagation; never authored
    #[serde(skip)]
    pub powered: bool,
    /// Cosmetic bulb variant for targets (1-4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulb: Option<u8>,
}

impl Tile {
    pub fn new(pos: IVec2, kind: TileKind, rotation: u8) -> Self {
        Self {
            pos,
            kind,
            rotation: rotation % kind.rotation_states(),
            powered: false,
            bulb: None,
        }
    }

    pub fn empty(pos: IVec2) -> Self {
        Self::new(pos, TileKind::Empty, 0)
    }

    #[inline]
    pub fn connections(&self) -> Connections {
        connections(self.kind, self.rotation)
    }

    /// Mirror angle, if this tile is a mirror
    pub fn mirror_angle(&self) -> Option<MirrorAngle> {
        match self.kind {
            TileKind::Mirror => Some(MirrorAngle::from_index(self.rotation)),
            _ => None,
        }
    }

    /// Step rotation by one quarter turn and return the new value.
    /// Mirrors toggle between their two angles regardless of direction.
    pub fn rotate(&mut self, clockwise: bool) -> u8 {
        let states = self.kind.rotation_states();
        self.rotation = if clockwise {
            (self.rotation + 1) % states
        } else {
            (self.rotation + states - 1) % states
        };
        self.rotation
    }
}
