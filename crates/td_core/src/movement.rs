//! Movement along the map's route.
//!
//! Inside a path cell an enemy walks two legs: from the midpoint of the
//! edge it entered through to the cell centre along `in_direction`, then
//! from the centre to the midpoint of the exit edge along `out_direction`.
//! Both legs are half a cell long, so every cell contributes exactly
//! [`SCALING_FACTOR`] units of travel.
//!
//! A point on an edge shared by two path cells belongs to the cell it
//! enters. Entering the end cell's bounds finishes the walk.

use crate::error::{GameError, Result};
use crate::map::{GameMap, PathCell};
use crate::math::{real_modulus, CellPos, Direction, LogicalPosition, HALF_CELL, SCALING_FACTOR};

/// Position on the route plus what an observer needs to draw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathVector {
    /// Where the walker stands.
    pub position: LogicalPosition,
    /// Direction it is currently travelling.
    pub direction: Direction,
    /// Travel left until the end position, in sub-cell units.
    pub distance_to_end: u64,
}

/// Route movement as seen by the enemy orchestrator.
pub trait PathNavigator {
    /// Where new enemies appear.
    fn spawn_position(&self) -> LogicalPosition;

    /// Position after travelling `distance` from `pos`, or `None` once the
    /// end is reached.
    fn next_position(&self, pos: LogicalPosition, distance: i32)
        -> Result<Option<LogicalPosition>>;
}

impl PathNavigator for GameMap {
    fn spawn_position(&self) -> LogicalPosition {
        GameMap::spawn_position(self)
    }

    fn next_position(
        &self,
        pos: LogicalPosition,
        distance: i32,
    ) -> Result<Option<LogicalPosition>> {
        GameMap::next_position(self, pos, distance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    /// Entry edge towards the centre.
    Entering,
    /// Centre towards the exit edge.
    Leaving,
}

impl Leg {
    const fn direction(self, cell: &PathCell) -> Direction {
        match self {
            Self::Entering => cell.in_direction(),
            Self::Leaving => cell.out_direction(),
        }
    }

    /// Offset inside the cell where this leg stops.
    const fn end_offset(self) -> i32 {
        match self {
            Self::Entering => HALF_CELL,
            Self::Leaving => SCALING_FACTOR,
        }
    }
}

/// Travel already done inside `cell`, in `[0, SCALING_FACTOR)`.
///
/// Projecting on the leg direction and taking the real modulus gives the
/// distance from the entry edge regardless of which way the leg points.
fn progress_in_cell(cell: &PathCell, leg: Leg, pos: LogicalPosition) -> i32 {
    real_modulus(pos.project(leg.direction(cell)), SCALING_FACTOR)
}

/// Whether `cell` owns `pos`.
///
/// Along the entry axis a cell spans `[entry edge, entry edge + SF)`, so its
/// entry edge is included and its far edge is not. Across that axis the
/// floor rule applies, except that the exit edge is never included.
/// Positions off the centre line are accepted.
fn owns(cell: &PathCell, pos: LogicalPosition) -> bool {
    let (dir, out) = (cell.in_direction(), cell.out_direction());
    let along = pos.project(dir) - cell.entry_midpoint().project(dir);
    let (lateral, low) = if dir.is_vertical() {
        (pos.x, cell.pos().x * SCALING_FACTOR)
    } else {
        (pos.y, cell.pos().y * SCALING_FACTOR)
    };
    (0..SCALING_FACTOR).contains(&along)
        && (low..low + SCALING_FACTOR).contains(&lateral)
        && pos.project(out) < cell.exit_midpoint().project(out)
}

/// The leg of `cell` that `pos` is on. `cell` must own `pos`.
fn leg_of(cell: &PathCell, pos: LogicalPosition) -> Leg {
    if progress_in_cell(cell, Leg::Entering, pos) < HALF_CELL {
        Leg::Entering
    } else {
        Leg::Leaving
    }
}

impl GameMap {
    /// Where enemies appear: the spawn cell's entry edge midpoint.
    #[must_use]
    pub fn spawn_position(&self) -> LogicalPosition {
        self.spawn_cell().entry_midpoint()
    }

    /// Where the route ends: the end cell's entry edge midpoint.
    #[must_use]
    pub fn end_position(&self) -> LogicalPosition {
        self.end_cell().entry_midpoint()
    }

    /// The spawn position with its travel direction and full route length.
    #[must_use]
    pub fn spawn_vector(&self) -> PathVector {
        let spawn = self.spawn_cell();
        PathVector {
            position: self.spawn_position(),
            direction: spawn.in_direction(),
            distance_to_end: u64::from(spawn.steps_to_end()) * SCALING_FACTOR as u64,
        }
    }

    /// Position after travelling `distance` units from `pos` along the
    /// route, or `None` once the end cell is reached.
    pub fn next_position(
        &self,
        pos: LogicalPosition,
        distance: i32,
    ) -> Result<Option<LogicalPosition>> {
        Ok(self.advance(pos, distance)?.map(|v| v.position))
    }

    /// Like [`GameMap::next_position`], also reporting direction and
    /// remaining distance.
    ///
    /// Any number of cell boundaries may be crossed in one call. A zero
    /// distance returns `pos` unchanged unless it already lies inside the
    /// end cell.
    pub fn advance(&self, pos: LogicalPosition, distance: i32) -> Result<Option<PathVector>> {
        if distance < 0 {
            return Err(GameError::InvalidArgument(format!(
                "travel distance must not be negative, got {distance}"
            )));
        }
        if self.end_cell().contains(pos) {
            return Ok(None);
        }
        let (mut cell, mut leg) = self.locate(pos)?;
        let mut pos = pos;
        let mut remaining = distance;

        loop {
            let dir = leg.direction(&cell);
            let to_leg_end = leg.end_offset() - progress_in_cell(&cell, leg, pos);
            if remaining < to_leg_end {
                let pos = pos.moved(dir, remaining);
                if self.end_cell().contains(pos) {
                    return Ok(None);
                }
                return Ok(Some(PathVector {
                    position: pos,
                    direction: dir,
                    distance_to_end: distance_from(&cell, leg, pos),
                }));
            }

            remaining -= to_leg_end;
            pos = pos.moved(dir, to_leg_end);
            match leg {
                Leg::Entering => leg = Leg::Leaving,
                Leg::Leaving => match self.next_path_cell(&cell) {
                    Some(next) => {
                        cell = *next;
                        leg = Leg::Entering;
                    }
                    None => return Ok(None),
                },
            }
            if self.end_cell().contains(pos) {
                return Ok(None);
            }
        }
    }

    /// Travel left from `pos` to the end position.
    pub fn distance_to_end(&self, pos: LogicalPosition) -> Result<u64> {
        if self.end_cell().contains(pos) {
            return Ok(0);
        }
        let (cell, leg) = self.locate(pos)?;
        Ok(distance_from(&cell, leg, pos))
    }

    /// The path cell and leg holding `pos`.
    fn locate(&self, pos: LogicalPosition) -> Result<(PathCell, Leg)> {
        let base = pos.cell();
        // Points on a west or north cell edge may belong to the neighbour.
        let candidates = [
            Some(base),
            (real_modulus(pos.x, SCALING_FACTOR) == 0).then(|| CellPos::new(base.x - 1, base.y)),
            (real_modulus(pos.y, SCALING_FACTOR) == 0).then(|| CellPos::new(base.x, base.y - 1)),
        ];
        candidates
            .into_iter()
            .flatten()
            .filter_map(|candidate| self.path_cell_at(candidate))
            .find(|cell| owns(cell, pos))
            .map(|cell| (*cell, leg_of(cell, pos)))
            .ok_or_else(|| {
                GameError::InvalidArgument(format!("position {pos:?} is not on the path"))
            })
    }
}

fn distance_from(cell: &PathCell, leg: Leg, pos: LogicalPosition) -> u64 {
    let steps = u64::from(cell.steps_to_end());
    if steps == 0 {
        return 0;
    }
    let left_in_cell = match leg {
        Leg::Leaving => SCALING_FACTOR - progress_in_cell(cell, leg, pos),
        Leg::Entering => {
            let to_center = HALF_CELL - progress_in_cell(cell, leg, pos);
            let turned = pos.moved(cell.in_direction(), to_center);
            to_center + SCALING_FACTOR - progress_in_cell(cell, Leg::Leaving, turned)
        }
    };
    left_in_cell as u64 + (steps - 1) * SCALING_FACTOR as u64
}
