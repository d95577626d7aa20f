//! Grid path model and procedural path generation.
//!
//! A map is a rectangle of cells. Exactly one chain of [`PathCell`]s runs
//! from the spawn cell on the west border to the end cell on the east
//! border; every other cell is a [`BuildableCell`] where defenses may be
//! placed. The chain is simple: following `out_direction` from the spawn
//! visits every path cell once and stops at the end.
//!
//! Maps are generated once per game and never change shape afterwards.
//! They round-trip through any serde format; [`GameMap::to_ron`] and
//! [`GameMap::from_ron`] give the textual form used for saves.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{CellPos, Direction, LogicalPosition};

/// Largest accepted map side, in cells.
pub const MAX_MAP_SIDE: u32 = 1024;

/// Map configuration for procedural generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Map width in cells.
    pub width: u32,
    /// Map height in cells.
    pub height: u32,
    /// Random seed for deterministic generation.
    pub seed: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            seed: 12345,
        }
    }
}

impl MapConfig {
    /// Create a small map (12x8 cells).
    #[must_use]
    pub fn small() -> Self {
        Self {
            width: 12,
            height: 8,
            ..Default::default()
        }
    }

    /// Create a medium map (20x20 cells).
    #[must_use]
    pub fn medium() -> Self {
        Self::default()
    }

    /// Create a large map (40x30 cells).
    #[must_use]
    pub fn large() -> Self {
        Self {
            width: 40,
            height: 30,
            ..Default::default()
        }
    }

    /// Set the map size.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the dimensions, reporting every violation at once.
    pub fn validate(&self) -> Result<()> {
        let errors = dimension_errors(self.width, self.height);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GameError::config("map", errors))
        }
    }
}

fn dimension_errors(width: u32, height: u32) -> Vec<String> {
    let mut errors = Vec::new();
    for (name, value) in [("width", width), ("height", height)] {
        if value == 0 {
            errors.push(format!("{name} must be positive"));
        } else if value > MAX_MAP_SIDE {
            errors.push(format!("{name} {value} exceeds the maximum of {MAX_MAP_SIDE}"));
        }
    }
    errors
}

/// A cell enemies walk through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathCell {
    pos: CellPos,
    in_direction: Direction,
    out_direction: Direction,
    steps_to_end: u32,
}

impl PathCell {
    /// Cell coordinates.
    #[must_use]
    pub const fn pos(&self) -> CellPos {
        self.pos
    }

    /// Direction enemies travel when they enter the cell.
    #[must_use]
    pub const fn in_direction(&self) -> Direction {
        self.in_direction
    }

    /// Direction enemies travel when they leave the cell.
    #[must_use]
    pub const fn out_direction(&self) -> Direction {
        self.out_direction
    }

    /// Number of path cells after this one up to and including the end.
    #[must_use]
    pub const fn steps_to_end(&self) -> u32 {
        self.steps_to_end
    }

    /// Whether the path turns inside this cell.
    #[must_use]
    pub fn is_turn(&self) -> bool {
        self.in_direction != self.out_direction
    }

    /// Midpoint of the edge enemies enter through.
    #[must_use]
    pub const fn entry_midpoint(&self) -> LogicalPosition {
        self.pos.entry_midpoint(self.in_direction)
    }

    /// Midpoint of the edge enemies leave through.
    #[must_use]
    pub const fn exit_midpoint(&self) -> LogicalPosition {
        self.pos.exit_midpoint(self.out_direction)
    }

    /// Whether `pos` lies inside this cell.
    #[must_use]
    pub const fn contains(&self, pos: LogicalPosition) -> bool {
        self.pos.contains(pos)
    }
}

/// A cell off the path, available for defenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildableCell {
    pos: CellPos,
    occupied: bool,
}

impl BuildableCell {
    /// Cell coordinates.
    #[must_use]
    pub const fn pos(&self) -> CellPos {
        self.pos
    }

    /// Whether a defense stands here.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }
}

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Part of the enemy route.
    Path(PathCell),
    /// Free ground for defenses.
    Buildable(BuildableCell),
}

impl Cell {
    /// Cell coordinates.
    #[must_use]
    pub const fn pos(&self) -> CellPos {
        match self {
            Self::Path(cell) => cell.pos,
            Self::Buildable(cell) => cell.pos,
        }
    }

    /// Whether this is a path cell.
    #[must_use]
    pub const fn is_path(&self) -> bool {
        matches!(self, Self::Path(_))
    }

    /// The path cell, if this is one.
    #[must_use]
    pub const fn as_path(&self) -> Option<&PathCell> {
        match self {
            Self::Path(cell) => Some(cell),
            Self::Buildable(_) => None,
        }
    }
}

/// The playfield grid with its single enemy route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MapRecord", into = "MapRecord")]
pub struct GameMap {
    width: u32,
    height: u32,
    /// Row-major cells.
    cells: Vec<Cell>,
    spawn: PathCell,
    end: PathCell,
}

impl GameMap {
    /// Generate a map from its configuration, seeding the walk with
    /// `config.seed`.
    pub fn from_config(config: &MapConfig) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::generate(config, &mut rng)
    }

    /// Generate a map with a random route from the west to the east border.
    ///
    /// The walk never steps west and never revisits a cell, so it ends after
    /// at most `width * height` steps. Vertical runs are separated by at
    /// least two eastward steps, which keeps non-consecutive path cells from
    /// touching, and lean away from the nearer border.
    pub fn generate<R: Rng>(config: &MapConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let width = config.width as i32;
        let height = config.height as i32;
        let max_run = (height / 2).max(1);

        let mut cur = CellPos::new(0, rng.gen_range(0..height));
        let mut route = vec![cur];
        let mut straight = 2;

        while cur.x < width - 1 {
            if straight >= 2 && height > 1 && rng.gen_bool(0.5) {
                let room_north = cur.y;
                let room_south = height - 1 - cur.y;
                let dir = if room_north == 0 {
                    Direction::South
                } else if room_south == 0 {
                    Direction::North
                } else if rng.gen_ratio(room_south as u32, (room_north + room_south) as u32) {
                    Direction::South
                } else {
                    Direction::North
                };
                let room = if dir == Direction::South {
                    room_south
                } else {
                    room_north
                };
                let run = rng.gen_range(1..=room.min(max_run));
                for _ in 0..run {
                    cur = cur.step(dir);
                    route.push(cur);
                }
                straight = 0;
            }
            cur = cur.step(Direction::East);
            route.push(cur);
            straight += 1;
        }

        let map = Self::from_route(
            config.width,
            config.height,
            &route,
            Direction::East,
            Direction::East,
        )?;
        tracing::info!(
            "Generated {}x{} map, path of {} cells from {:?} to {:?}",
            config.width,
            config.height,
            route.len(),
            map.spawn.pos,
            map.end.pos
        );
        Ok(map)
    }

    /// Build a map from an explicit route, spawn first.
    ///
    /// `entry` is the direction enemies enter the spawn cell with and
    /// `exit` the direction they leave the end cell with. Consecutive route
    /// cells must be orthogonal neighbours and no cell may repeat.
    pub fn from_route(
        width: u32,
        height: u32,
        route: &[CellPos],
        entry: Direction,
        exit: Direction,
    ) -> Result<Self> {
        let errors = dimension_errors(width, height);
        if !errors.is_empty() {
            return Err(GameError::config("map", errors));
        }
        let (Some(&first), Some(&last)) = (route.first(), route.last()) else {
            return Err(GameError::Data("route is empty".into()));
        };

        let mut cells: Vec<Cell> = (0..height as i32)
            .flat_map(|y| (0..width as i32).map(move |x| CellPos::new(x, y)))
            .map(|pos| {
                Cell::Buildable(BuildableCell {
                    pos,
                    occupied: false,
                })
            })
            .collect();

        let mut seen = HashSet::with_capacity(route.len());
        let mut in_direction = entry;
        let mut spawn = None;
        let mut end = None;
        for (i, &pos) in route.iter().enumerate() {
            if !seen.insert(pos) {
                return Err(GameError::Data(format!("route visits {pos:?} twice")));
            }
            let out_direction = match route.get(i + 1) {
                Some(&next) => direction_between(pos, next).ok_or_else(|| {
                    GameError::Data(format!("route jumps from {pos:?} to {next:?}"))
                })?,
                None => exit,
            };
            if out_direction == in_direction.opposite() {
                return Err(GameError::Data(format!("route reverses inside {pos:?}")));
            }
            let cell = PathCell {
                pos,
                in_direction,
                out_direction,
                steps_to_end: (route.len() - 1 - i) as u32,
            };
            let idx = index_of(width, height, pos)
                .ok_or_else(|| GameError::Data(format!("route leaves the map at {pos:?}")))?;
            cells[idx] = Cell::Path(cell);
            if pos == first {
                spawn = Some(cell);
            }
            if pos == last {
                end = Some(cell);
            }
            in_direction = out_direction;
        }

        match (spawn, end) {
            (Some(spawn), Some(end)) => Ok(Self {
                width,
                height,
                cells,
                spawn,
                end,
            }),
            _ => Err(GameError::Data("route has no spawn or end".into())),
        }
    }

    /// Map width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Check if coordinates are within the grid.
    #[must_use]
    pub fn in_bounds(&self, pos: CellPos) -> bool {
        index_of(self.width, self.height, pos).is_some()
    }

    /// Cell at the given coordinates.
    pub fn cell_at(&self, pos: CellPos) -> Result<&Cell> {
        self.get_cell(pos).ok_or(GameError::OutOfBounds { x: pos.x, y: pos.y })
    }

    /// Cell at the given coordinates, `None` outside the grid.
    #[must_use]
    pub fn get_cell(&self, pos: CellPos) -> Option<&Cell> {
        index_of(self.width, self.height, pos).map(|idx| &self.cells[idx])
    }

    /// Path cell at the given coordinates, if there is one.
    #[must_use]
    pub fn path_cell_at(&self, pos: CellPos) -> Option<&PathCell> {
        self.get_cell(pos).and_then(Cell::as_path)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// First cell of the route.
    #[must_use]
    pub const fn spawn_cell(&self) -> &PathCell {
        &self.spawn
    }

    /// Last cell of the route.
    #[must_use]
    pub const fn end_cell(&self) -> &PathCell {
        &self.end
    }

    /// The path cell after `current`, or `None` at the end of the route.
    #[must_use]
    pub fn next_path_cell(&self, current: &PathCell) -> Option<&PathCell> {
        if current.pos == self.end.pos {
            return None;
        }
        self.path_cell_at(current.pos.step(current.out_direction))
    }

    /// Route cells from spawn to end.
    pub fn path(&self) -> impl Iterator<Item = &PathCell> {
        std::iter::successors(Some(&self.spawn), |cell| self.next_path_cell(cell))
    }

    /// Number of cells on the route.
    #[must_use]
    pub const fn path_len(&self) -> u32 {
        self.spawn.steps_to_end + 1
    }

    /// Mark a buildable cell as holding a defense.
    pub fn occupy(&mut self, pos: CellPos) -> Result<()> {
        self.set_occupied(pos, true)
    }

    /// Clear the defense from a buildable cell.
    pub fn vacate(&mut self, pos: CellPos) -> Result<()> {
        self.set_occupied(pos, false)
    }

    fn set_occupied(&mut self, pos: CellPos, occupied: bool) -> Result<()> {
        let idx = index_of(self.width, self.height, pos)
            .ok_or(GameError::OutOfBounds { x: pos.x, y: pos.y })?;
        match &mut self.cells[idx] {
            Cell::Path(_) => Err(GameError::InvalidState(format!(
                "cell {pos:?} is on the path"
            ))),
            Cell::Buildable(cell) if cell.occupied == occupied => {
                Err(GameError::InvalidState(format!(
                    "cell {pos:?} is already {}",
                    if occupied { "occupied" } else { "free" }
                )))
            }
            Cell::Buildable(cell) => {
                cell.occupied = occupied;
                Ok(())
            }
        }
    }

    /// Serialize to RON text.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Data(format!("Failed to serialize map: {e}")))
    }

    /// Rebuild a map from RON text, validating the route.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::Data(format!("Failed to load map: {e}")))
    }
}

fn index_of(width: u32, height: u32, pos: CellPos) -> Option<usize> {
    let in_bounds = pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < width && (pos.y as u32) < height;
    in_bounds.then(|| pos.y as usize * width as usize + pos.x as usize)
}

fn direction_between(from: CellPos, to: CellPos) -> Option<Direction> {
    Direction::ALL.into_iter().find(|&dir| from.step(dir) == to)
}

/// Serialized form of a cell; coordinates follow from the row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum CellRecord {
    Path {
        in_direction: Direction,
        out_direction: Direction,
    },
    Buildable {
        #[serde(default)]
        occupied: bool,
    },
}

/// Serialized form of a map.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MapRecord {
    width: u32,
    height: u32,
    spawn: CellPos,
    end: CellPos,
    cells: Vec<CellRecord>,
}

impl From<GameMap> for MapRecord {
    fn from(map: GameMap) -> Self {
        let cells = map
            .cells
            .iter()
            .map(|cell| match cell {
                Cell::Path(path) => CellRecord::Path {
                    in_direction: path.in_direction,
                    out_direction: path.out_direction,
                },
                Cell::Buildable(build) => CellRecord::Buildable {
                    occupied: build.occupied,
                },
            })
            .collect();
        Self {
            width: map.width,
            height: map.height,
            spawn: map.spawn.pos,
            end: map.end.pos,
            cells,
        }
    }
}

impl TryFrom<MapRecord> for GameMap {
    type Error = GameError;

    fn try_from(record: MapRecord) -> Result<Self> {
        let MapRecord {
            width,
            height,
            spawn,
            end,
            cells,
        } = record;
        if !dimension_errors(width, height).is_empty() {
            return Err(GameError::Data(format!("invalid map size {width}x{height}")));
        }
        if cells.len() != width as usize * height as usize {
            return Err(GameError::Data(format!(
                "expected {} cells, found {}",
                width as usize * height as usize,
                cells.len()
            )));
        }
        let record_at = |pos: CellPos| index_of(width, height, pos).map(|idx| cells[idx]);

        // Follow the directions from the spawn and make sure they describe
        // one simple chain covering every path cell.
        let path_cells = cells
            .iter()
            .filter(|c| matches!(c, CellRecord::Path { .. }))
            .count();
        let mut route = Vec::with_capacity(path_cells);
        let mut entry = None;
        let mut exit = None;
        let mut cur = spawn;
        loop {
            let Some(CellRecord::Path {
                in_direction,
                out_direction,
            }) = record_at(cur)
            else {
                return Err(GameError::Data(format!("{cur:?} is not a path cell")));
            };
            if let Some(prev) = exit {
                if prev != in_direction {
                    return Err(GameError::Data(format!(
                        "{cur:?} is entered {prev:?} but expects {in_direction:?}"
                    )));
                }
            }
            entry.get_or_insert(in_direction);
            exit = Some(out_direction);
            route.push(cur);
            if cur == end {
                break;
            }
            if route.len() >= path_cells {
                return Err(GameError::Data("path does not reach the end cell".into()));
            }
            cur = cur.step(out_direction);
        }
        if route.len() != path_cells {
            return Err(GameError::Data(format!(
                "{} path cells are not on the route",
                path_cells - route.len()
            )));
        }

        let (Some(entry), Some(exit)) = (entry, exit) else {
            return Err(GameError::Data("empty route".into()));
        };
        let mut map = Self::from_route(width, height, &route, entry, exit)?;
        for (cell, record) in map.cells.iter_mut().zip(&cells) {
            if let (Cell::Buildable(cell), CellRecord::Buildable { occupied }) = (cell, record) {
                cell.occupied = *occupied;
            }
        }
        Ok(map)
    }
}
