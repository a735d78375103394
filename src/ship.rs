//! Ship definitions and per-cell hit tracking.

use core::fmt;

use crate::common::Point;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Fleet template entry: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipDef {
    name: &'static str,
    length: usize,
}

impl ShipDef {
    /// Create a new ship definition.
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    /// Ship's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ship's length.
    pub fn length(&self) -> usize {
        self.length
    }
}

/// One occupied cell of a ship and whether it has been hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
    pub hit: bool,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y, hit: false }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<Point> for Coordinate {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

/// A named ship occupying an ordered run of cells.
#[derive(Clone, PartialEq, Eq)]
pub struct Ship {
    name: String,
    coordinates: Vec<Coordinate>,
}

impl Ship {
    pub fn new(name: impl Into<String>, cells: impl IntoIterator<Item = Point>) -> Self {
        Self {
            name: name.into(),
            coordinates: cells.into_iter().map(Coordinate::from).collect(),
        }
    }

    /// Lay out `def` starting at `origin`, extending right or down.
    pub fn place(def: ShipDef, origin: Point, orientation: Orientation) -> Self {
        let cells = (0..def.length() as i32).map(|i| match orientation {
            Orientation::Horizontal => Point::new(origin.x + i, origin.y),
            Orientation::Vertical => Point::new(origin.x, origin.y + i),
        });
        Self::new(def.name(), cells)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Cells in placement order, without hit flags.
    pub fn cells(&self) -> impl Iterator<Item = Point> + '_ {
        self.coordinates.iter().map(Coordinate::point)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.coordinates.iter().any(|c| c.point() == p)
    }

    /// Mark (`x`, `y`) as hit if the ship occupies it.
    /// Returns `true` on a hit; firing at an already hit cell is a hit again.
    pub fn hit(&mut self, x: i32, y: i32) -> bool {
        match self.coordinates.iter_mut().find(|c| c.x == x && c.y == y) {
            Some(coord) => {
                coord.hit = true;
                true
            }
            None => false,
        }
    }

    /// Check if the ship is sunk (all segments hit).
    pub fn is_sunk(&self) -> bool {
        self.coordinates.iter().all(|c| c.hit)
    }

    /// Cells form one horizontal or vertical run, in order, with no gaps.
    pub fn is_contiguous(&self) -> bool {
        let cells: Vec<Point> = self.cells().collect();
        let (Some(first), Some(second)) = (cells.first(), cells.get(1)) else {
            return true;
        };
        let step = (second.x - first.x, second.y - first.y);
        if !matches!(step, (1, 0) | (-1, 0) | (0, 1) | (0, -1)) {
            return false;
        }
        cells
            .windows(2)
            .all(|w| (w[1].x - w[0].x, w[1].y - w[0].y) == step)
    }
}

impl fmt::Debug for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hits = self.coordinates.iter().filter(|c| c.hit).count();
        write!(
            f,
            "Ship {{ name: {:?}, cells: {:?}, hits: {} }}",
            self.name,
            self.cells().collect::<Vec<_>>(),
            hits,
        )
    }
}
