//! Common types for Battleship: grid points and board errors.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A grid position `(x, y)`, 0-indexed. Travels on the wire as `[x, y]`.
///
/// Signed so that a peer's out-of-range shot can still be represented and
/// resolved (it simply misses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether the point lies on a `size`×`size` grid.
    pub fn within(&self, size: u8) -> bool {
        let size = i32::from(size);
        (0..size).contains(&self.x) && (0..size).contains(&self.y)
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Errors returned by fleet placement and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Fleet has the wrong number of ships.
    WrongShipCount { expected: usize, got: usize },
    /// Named ship not found in the fleet template.
    NameNotFound(String),
    /// The same ship was placed twice.
    ShipAlreadyPlaced(String),
    /// Ship length differs from its template entry.
    WrongLength { name: String, expected: usize, got: usize },
    /// Ship cells are not a straight contiguous line.
    NotContiguous(String),
    /// Ship placement overlaps another ship.
    ShipOverlaps(Point),
    /// Ship placement leaves the board.
    ShipOutOfBounds(Point),
    /// Unable to place ship (random placement gave up).
    UnableToPlaceShip(String),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::WrongShipCount { expected, got } => {
                write!(f, "Fleet must have {} ships, got {}", expected, got)
            }
            BoardError::NameNotFound(name) => write!(f, "Ship {:?} is not part of the fleet", name),
            BoardError::ShipAlreadyPlaced(name) => write!(f, "Ship {:?} is placed twice", name),
            BoardError::WrongLength {
                name,
                expected,
                got,
            } => write!(f, "Ship {:?} must have length {}, got {}", name, expected, got),
            BoardError::NotContiguous(name) => {
                write!(f, "Ship {:?} is not a contiguous straight line", name)
            }
            BoardError::ShipOverlaps(p) => write!(f, "Ship placement overlaps at {}", p),
            BoardError::ShipOutOfBounds(p) => write!(f, "Ship placement is out of bounds at {}", p),
            BoardError::UnableToPlaceShip(name) => write!(f, "Unable to place ship {:?}", name),
        }
    }
}

impl std::error::Error for BoardError {}
