//! Cardinal directions and connection sets
//!
//! Grid coordinates grow right (+x) and down (+y).

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// A cardinal direction, ordered clockwise starting at `Up`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// All directions in clockwise order
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Position in the clockwise cycle (Up = 0)
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    #[inline]
    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Turn clockwise by `steps` quarter turns
    #[inline]
    pub fn rotated(self, steps: u8) -> Self {
        Self::from_index(self.index() + steps % 4)
    }

    /// Unit step on the grid
    #[inline]
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Right => IVec2::new(1, 0),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" | "u" => Some(Direction::Up),
            "right" | "r" => Some(Direction::Right),
            "down" | "d" => Some(Direction::Down),
            "left" | "l" => Some(Direction::Left),
            _ => None,
        }
    }
}

/// Set of directions a tile connects on (one bit per direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Connections(u8);

impl Connections {
    pub const NONE: Connections = Connections(0);
    pub const ALL: Connections = Connections(0b1111);

    /// Build a set from a list of directions (usable in const tables)
    pub const fn of(dirs: &[Direction]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < dirs.len() {
            bits |= 1 << (dirs[i] as u8);
            i += 1;
        }
        Connections(bits)
    }

    #[inline]
    pub fn contains(self, dir: Direction) -> bool {
        self.0 & (1 << dir.index()) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Rotate every member clockwise by `steps` quarter turns
    pub fn rotated(self, steps: u8) -> Self {
        let steps = steps % 4;
        let bits = ((self.0 << steps) | (self.0 >> (4 - steps))) & 0b1111;
        Connections(bits)
    }

    /// Members in clockwise order starting at `Up`
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for Connections {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let bits = iter.into_iter().fold(0u8, |acc, d| acc | (1 << d.index()));
        Connections(bits)
    }
}
