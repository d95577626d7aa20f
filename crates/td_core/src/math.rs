//! Fixed-point positions and grid arithmetic.
//!
//! The playfield is a grid of square cells. Positions inside it are
//! integers in sub-cell units, [`SCALING_FACTOR`] of them per cell side,
//! so all movement is exact and identical on every platform.
//!
//! Cell derivation always uses true floor division and [`real_modulus`],
//! never truncation, so positions on or left of a cell boundary map to
//! the right cell even when coordinates are negative.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Sub-cell units per cell side.
///
/// Must stay even: a cell centre sits exactly half a cell from each edge.
pub const SCALING_FACTOR: i32 = 100;

/// Half a cell in sub-cell units.
pub const HALF_CELL: i32 = SCALING_FACTOR / 2;

/// Fixed-point number used for continuous coordinates.
pub type Fixed = I32F32;

/// Modulo normalized to `[0, b)` for any sign of `a`.
///
/// `b` must be positive.
#[must_use]
pub const fn real_modulus(a: i32, b: i32) -> i32 {
    debug_assert!(b > 0);
    a.rem_euclid(b)
}

/// The four cardinal travel directions.
///
/// Rows grow southward, so `South` has a vertical component of `+1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Towards growing columns.
    East,
    /// Towards growing rows.
    South,
    /// Towards decreasing columns.
    West,
    /// Towards decreasing rows.
    North,
}

impl Direction {
    /// All directions, clockwise from east.
    pub const ALL: [Self; 4] = [Self::East, Self::South, Self::West, Self::North];

    /// Horizontal unit component.
    #[must_use]
    pub const fn horizontal(self) -> i32 {
        match self {
            Self::East => 1,
            Self::West => -1,
            Self::South | Self::North => 0,
        }
    }

    /// Vertical unit component.
    #[must_use]
    pub const fn vertical(self) -> i32 {
        match self {
            Self::South => 1,
            Self::North => -1,
            Self::East | Self::West => 0,
        }
    }

    /// The reverse direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::North => Self::South,
        }
    }

    /// Whether this direction moves along rows.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::South | Self::North)
    }
}

/// Integer cell coordinates: column `x`, row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl CellPos {
    /// Create new cell coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell in `dir`.
    #[must_use]
    pub const fn step(self, dir: Direction) -> Self {
        Self {
            x: self.x + dir.horizontal(),
            y: self.y + dir.vertical(),
        }
    }

    /// Logical position of the cell centre.
    #[must_use]
    pub const fn center(self) -> LogicalPosition {
        LogicalPosition::new(
            self.x * SCALING_FACTOR + HALF_CELL,
            self.y * SCALING_FACTOR + HALF_CELL,
        )
    }

    /// Midpoint of the cell edge crossed when entering the cell moving `dir`.
    #[must_use]
    pub const fn entry_midpoint(self, dir: Direction) -> LogicalPosition {
        self.center().moved(dir, -HALF_CELL)
    }

    /// Midpoint of the cell edge crossed when leaving the cell moving `dir`.
    #[must_use]
    pub const fn exit_midpoint(self, dir: Direction) -> LogicalPosition {
        self.center().moved(dir, HALF_CELL)
    }

    /// Whether `pos` lies inside this cell (floor-based).
    #[must_use]
    pub const fn contains(self, pos: LogicalPosition) -> bool {
        let cell = pos.cell();
        cell.x == self.x && cell.y == self.y
    }
}

/// A point on the playfield in sub-cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LogicalPosition {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl LogicalPosition {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the enclosing cell.
    #[must_use]
    pub const fn cell_x(self) -> i32 {
        self.x.div_euclid(SCALING_FACTOR)
    }

    /// Row of the enclosing cell.
    #[must_use]
    pub const fn cell_y(self) -> i32 {
        self.y.div_euclid(SCALING_FACTOR)
    }

    /// The enclosing cell.
    #[must_use]
    pub const fn cell(self) -> CellPos {
        CellPos::new(self.cell_x(), self.cell_y())
    }

    /// Signed projection on the axis of `dir`.
    #[must_use]
    pub const fn project(self, dir: Direction) -> i32 {
        self.x * dir.horizontal() + self.y * dir.vertical()
    }

    /// This position moved `distance` units along `dir`.
    #[must_use]
    pub const fn moved(self, dir: Direction, distance: i32) -> Self {
        Self {
            x: self.x + distance * dir.horizontal(),
            y: self.y + distance * dir.vertical(),
        }
    }

    /// Continuous coordinates in cell units.
    #[must_use]
    pub fn to_cells(self) -> Vec2Fixed {
        let scale = Fixed::from_num(SCALING_FACTOR);
        Vec2Fixed::new(
            Fixed::from_num(self.x) / scale,
            Fixed::from_num(self.y) / scale,
        )
    }

    /// Nearest logical position to continuous cell-unit coordinates.
    #[must_use]
    pub fn from_cells(value: Vec2Fixed) -> Self {
        let scale = Fixed::from_num(SCALING_FACTOR);
        Self {
            x: (value.x * scale).round().to_num(),
            y: (value.y * scale).round().to_num(),
        }
    }
}

/// Fixed-point 2D vector in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vec2Fixed {
    /// X coordinate.
    pub x: Fixed,
    /// Y coordinate.
    pub y: Fixed,
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Whether `other` lies within `radius` of `self`.
    ///
    /// Compares exact squared distances on the raw fixed-point bits, so it
    /// never overflows for any coordinates or radius.
    #[must_use]
    pub fn within(self, other: Self, radius: Fixed) -> bool {
        let square = |bits: i128| bits.unsigned_abs().saturating_mul(bits.unsigned_abs());
        let dx = i128::from(self.x.to_bits()) - i128::from(other.x.to_bits());
        let dy = i128::from(self.y.to_bits()) - i128::from(other.y.to_bits());
        let distance = square(dx).saturating_add(square(dy));
        distance <= square(i128::from(radius.to_bits()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cell_derivation_uses_floor() {
        assert_eq!(LogicalPosition::new(0, 0).cell(), CellPos::new(0, 0));
        assert_eq!(LogicalPosition::new(99, 199).cell(), CellPos::new(0, 1));
        assert_eq!(LogicalPosition::new(100, 200).cell(), CellPos::new(1, 2));
        assert_eq!(LogicalPosition::new(-1, -100).cell(), CellPos::new(-1, -1));
        assert_eq!(LogicalPosition::new(-101, 0).cell(), CellPos::new(-2, 0));
    }

    #[test]
    fn test_real_modulus_negative_dividend() {
        assert_eq!(real_modulus(-1, SCALING_FACTOR), SCALING_FACTOR - 1);
        assert_eq!(real_modulus(-SCALING_FACTOR, SCALING_FACTOR), 0);
        assert_eq!(real_modulus(250, SCALING_FACTOR), 50);
    }

    #[test]
    fn test_direction_components() {
        for dir in Direction::ALL {
            assert_eq!(dir.horizontal().abs() + dir.vertical().abs(), 1);
            assert_eq!(dir.opposite().horizontal(), -dir.horizontal());
            assert_eq!(dir.opposite().vertical(), -dir.vertical());
        }
        assert!(Direction::North.is_vertical());
        assert!(!Direction::West.is_vertical());
    }

    #[test]
    fn test_cell_midpoints() {
        let cell = CellPos::new(2, 3);
        assert_eq!(cell.center(), LogicalPosition::new(250, 350));
        assert_eq!(
            cell.entry_midpoint(Direction::East),
            LogicalPosition::new(200, 350)
        );
        assert_eq!(
            cell.exit_midpoint(Direction::North),
            LogicalPosition::new(250, 300)
        );
        assert!(cell.contains(cell.entry_midpoint(Direction::East)));
        // Leaving northward lands on the row above.
        assert!(!cell.contains(cell.exit_midpoint(Direction::North)));
    }

    #[test]
    fn test_projection_follows_direction() {
        let pos = LogicalPosition::new(130, 270);
        assert_eq!(pos.project(Direction::East), 130);
        assert_eq!(pos.project(Direction::West), -130);
        assert_eq!(pos.project(Direction::South), 270);
        assert_eq!(pos.project(Direction::North), -270);
    }

    #[test]
    fn test_continuous_conversion() {
        let pos = LogicalPosition::new(150, 250);
        let cells = pos.to_cells();
        assert_eq!(cells.x, Fixed::from_num(1.5));
        assert_eq!(cells.y, Fixed::from_num(2.5));
        assert_eq!(LogicalPosition::from_cells(cells), pos);
    }

    #[test]
    fn test_vec2_within() {
        let a = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(0));
        let b = Vec2Fixed::new(Fixed::from_num(0), Fixed::from_num(4));
        assert!(a.within(b, Fixed::from_num(5)));
        assert!(!a.within(b, Fixed::from_num(4.99)));
    }

    #[test]
    fn test_within_handles_extreme_values() {
        let origin = Vec2Fixed::ZERO;
        let far = Vec2Fixed::new(Fixed::MAX, Fixed::MIN);
        let wide = Vec2Fixed::new(Fixed::from_num(30_000), Fixed::ZERO);
        assert!(origin.within(wide, Fixed::from_num(50_000)));
        assert!(!origin.within(far, Fixed::from_num(50_000)));
        assert!(!far.within(Vec2Fixed::new(Fixed::MIN, Fixed::MAX), Fixed::MAX));
        assert!(far.within(far, Fixed::ZERO));
    }

    proptest! {
        #[test]
        fn prop_real_modulus_in_range(a in any::<i32>(), b in 1i32..10_000) {
            let r = real_modulus(a, b);
            prop_assert!(r >= 0 && r < b);
            prop_assert_eq!((i64::from(a) - i64::from(r)) % i64::from(b), 0);
        }

        #[test]
        fn prop_cell_contains_its_positions(x in -100_000i32..100_000, y in -100_000i32..100_000) {
            let pos = LogicalPosition::new(x, y);
            let cell = pos.cell();
            prop_assert!(cell.contains(pos));
            prop_assert!(x - cell.x * SCALING_FACTOR < SCALING_FACTOR);
            prop_assert!(x >= cell.x * SCALING_FACTOR);
        }
    }
}
