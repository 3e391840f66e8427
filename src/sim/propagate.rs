//! Propagation engine
//!
//! Two strategies share the board and completion scaffolding:
//! - `Connectivity`: multi-source BFS over mutually connected neighbours
//! - `RayMarch`: cell-by-cell laser tracing with mirror reflection
//!
//! Every pass resets derived state first, so running a strategy twice
//! without a mutation in between gives the same result.

use std::collections::{HashSet, VecDeque};

use glam::IVec2;

use super::board::{BeamSegment, Board, LevelKind};
use super::direction::Direction;
use crate::levels::LaserSource;
use crate::settings::Ruleset;

/// Why a traversal stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// BFS frontier emptied
    Exhausted,
    /// Beam left the board
    OutOfBounds,
    /// Beam re-entered a (cell, direction) state it had already visited
    Cycle,
    /// Beam hit the segment cap
    StepCap,
}

/// Summary of one propagation pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropagationReport {
    /// Energized cells
    pub powered: usize,
    /// Targets energized or hit
    pub targets_powered: usize,
    /// Beam segments recorded (0 for pipe boards)
    pub segments: usize,
    /// One entry per BFS pass or traced laser
    pub terminations: Vec<Termination>,
}

/// Recomputes derived power/beam state over a board
pub trait PropagationStrategy {
    fn name(&self) -> &'static str;

    fn propagate(&self, board: &mut Board) -> PropagationReport;
}

/// Strategy matching a board's level kind
pub fn strategy_for(kind: LevelKind, ruleset: &Ruleset) -> Box<dyn PropagationStrategy> {
    match kind {
        LevelKind::Pipe => Box::new(Connectivity),
        LevelKind::Beam => Box::new(RayMarch::new(ruleset.beam_step_cap)),
    }
}

/// Win condition: at least one target, and every target energized.
/// Reads the last propagation result; does not recompute.
pub fn targets_complete(board: &Board) -> bool {
    !board.targets().is_empty() && board.targets().iter().all(|&p| board.is_powered(p))
}

/// True if power can cross from `pos` to its neighbour in `dir`:
/// `pos` declares `dir` and the neighbour declares the opposite side.
pub fn links(board: &Board, pos: IVec2, dir: Direction) -> bool {
    let Some(from) = board.tile(pos) else {
        return false;
    };
    let Some(to) = board.tile(pos + dir.offset()) else {
        return false;
    };
    from.connections().contains(dir) && to.connections().contains(dir.opposite())
}

/// Pipe-puzzle connectivity
#[derive(Debug, Clone, Copy, Default)]
pub struct Connectivity;

impl Connectivity {
    /// Mark everything reachable from `seeds` as powered (seeds included).
    /// Does not clear existing power. Returns the number of cells newly powered.
    pub fn flood(board: &mut Board, seeds: &[IVec2]) -> usize {
        let mut frontier = VecDeque::with_capacity(seeds.len());
        let mut count = 0;

        for &seed in seeds {
            if let Some(tile) = board.tile_mut(seed) {
                if !tile.powered {
                    tile.powered = true;
                    count += 1;
                    frontier.push_back(seed);
                }
            }
        }

        while let Some(pos) = frontier.pop_front() {
            let Some(connections) = board.tile(pos).map(|t| t.connections()) else {
                continue;
            };
            for dir in connections.iter() {
                let next = pos + dir.offset();
                let accepts = board
                    .tile(next)
                    .map(|t| !t.powered && t.connections().contains(dir.opposite()))
                    .unwrap_or(false);
                if accepts {
                    if let Some(tile) = board.tile_mut(next) {
                        tile.powered = true;
                    }
                    count += 1;
                    frontier.push_back(next);
                }
            }
        }
        count
    }
}

impl PropagationStrategy for Connectivity {
    fn name(&self) -> &'static str {
        "connectivity"
    }

    fn propagate(&self, board: &mut Board) -> PropagationReport {
        board.reset_power();
        let sources = board.sources().to_vec();
        let powered = Self::flood(board, &sources);
        let report = PropagationReport {
            powered,
            targets_powered: board.targets_powered(),
            segments: 0,
            terminations: vec![Termination::Exhausted],
        };
        log::debug!(
            "connectivity: {} cells powered, {}/{} targets",
            report.powered,
            report.targets_powered,
            board.targets().len()
        );
        report
    }
}

/// Mirror-puzzle beam tracing
#[derive(Debug, Clone, Copy)]
pub struct RayMarch {
    /// Maximum segments traced per laser
    pub step_cap: usize,
}

impl Default for RayMarch {
    fn default() -> Self {
        Self::new(crate::settings::DEFAULT_BEAM_STEP_CAP)
    }
}

impl RayMarch {
    pub fn new(step_cap: usize) -> Self {
        Self { step_cap }
    }

    /// Trace one laser, appending its segments
    pub fn trace(
        &self,
        board: &Board,
        laser: &LaserSource,
        segments: &mut Vec<BeamSegment>,
    ) -> Termination {
        let mut pos = laser.pos();
        let mut dir = laser.dir;
        let mut visited: HashSet<(IVec2, Direction)> = HashSet::new();
        let mut steps = 0;

        loop {
            if steps >= self.step_cap {
                return Termination::StepCap;
            }
            if !visited.insert((pos, dir)) {
                return Termination::Cycle;
            }

            let next = pos + dir.offset();
            segments.push(BeamSegment {
                from: pos,
                to: next,
            });
            steps += 1;

            if !board.in_bounds(next) {
                return Termination::OutOfBounds;
            }
            if let Some(angle) = board.tile(next).and_then(|t| t.mirror_angle()) {
                dir = angle.reflect(dir);
            }
            pos = next;
        }
    }
}

impl PropagationStrategy for RayMarch {
    fn name(&self) -> &'static str {
        "ray_march"
    }

    fn propagate(&self, board: &mut Board) -> PropagationReport {
        board.reset_power();

        let mut segments = Vec::new();
        let terminations: Vec<Termination> = board
            .lasers()
            .iter()
            .map(|laser| self.trace(board, laser, &mut segments))
            .collect();

        // A target is hit when it is an endpoint of any segment
        let hit: Vec<IVec2> = board
            .targets()
            .iter()
            .copied()
            .filter(|&t| segments.iter().any(|s| s.touches(t)))
            .collect();
        for &pos in &hit {
            if let Some(tile) = board.tile_mut(pos) {
                tile.powered = true;
            }
        }

        let report = PropagationReport {
            powered: hit.len(),
            targets_powered: hit.len(),
            segments: segments.len(),
            terminations,
        };
        board.set_beam(segments);
        log::debug!(
            "ray march: {} segments, {}/{} targets hit, {:?}",
            report.segments,
            report.targets_powered,
            board.targets().len(),
            report.terminations
        );
        report
    }
}
