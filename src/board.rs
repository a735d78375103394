//! Game board state: placed ships, shot resolution and shot logs.

use std::collections::HashSet;

use rand::Rng;

use crate::common::{BoardError, Point};
use crate::config::GameConfig;
use crate::ship::{Orientation, Ship};

/// Result of resolving one shot against a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotOutcome {
    Miss,
    /// Hit a ship that still floats.
    Hit(String),
    /// Hit a ship whose every cell is now hit.
    Sunk(String),
}

impl ShotOutcome {
    pub fn is_hit(&self) -> bool {
        !matches!(self, ShotOutcome::Miss)
    }
}

/// A participant's grid and the ships placed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: u8,
    ships: Vec<Ship>,
}

impl Board {
    /// Create an empty board (no ships placed).
    pub fn new(size: u8) -> Self {
        Self {
            size,
            ships: Vec::new(),
        }
    }

    pub fn with_ships(size: u8, ships: Vec<Ship>) -> Self {
        Self { size, ships }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Replace the whole fleet.
    pub fn assign_ships(&mut self, ships: Vec<Ship>) {
        self.ships = ships;
    }

    /// Fire at (`x`, `y`). Returns the name of the ship that was hit, `None` on a miss.
    pub fn fire_at(&mut self, x: i32, y: i32) -> Option<&str> {
        let index = self.fire_index(x, y)?;
        Some(self.ships[index].name())
    }

    /// Fire at `target` and report whether the ship that was hit is now sunk.
    pub fn resolve_shot(&mut self, target: Point) -> ShotOutcome {
        match self.fire_index(target.x, target.y) {
            None => ShotOutcome::Miss,
            Some(index) => {
                let ship = &self.ships[index];
                let name = ship.name().to_string();
                if ship.is_sunk() {
                    ShotOutcome::Sunk(name)
                } else {
                    ShotOutcome::Hit(name)
                }
            }
        }
    }

    /// Index of the first ship occupying (`x`, `y`), after marking the cell hit.
    fn fire_index(&mut self, x: i32, y: i32) -> Option<usize> {
        self.ships.iter_mut().position(|ship| ship.hit(x, y))
    }

    /// Returns `true` when all ships are sunk.
    pub fn is_lost(&self) -> bool {
        self.ships.iter().all(Ship::is_sunk)
    }

    /// Check a fleet against the template: one ship per entry with matching
    /// name and length, straight and contiguous, on the board, no overlaps.
    pub fn validate_fleet(ships: &[Ship], config: &GameConfig) -> Result<(), BoardError> {
        if ships.len() != config.fleet.len() {
            return Err(BoardError::WrongShipCount {
                expected: config.fleet.len(),
                got: ships.len(),
            });
        }
        let mut placed_names = HashSet::new();
        let mut occupied = HashSet::new();
        for ship in ships {
            let def = config
                .ship_def(ship.name())
                .ok_or_else(|| BoardError::NameNotFound(ship.name().to_string()))?;
            if !placed_names.insert(ship.name()) {
                return Err(BoardError::ShipAlreadyPlaced(ship.name().to_string()));
            }
            if ship.len() != def.length() {
                return Err(BoardError::WrongLength {
                    name: ship.name().to_string(),
                    expected: def.length(),
                    got: ship.len(),
                });
            }
            if !ship.is_contiguous() {
                return Err(BoardError::NotContiguous(ship.name().to_string()));
            }
            for cell in ship.cells() {
                if !cell.within(config.board_size) {
                    return Err(BoardError::ShipOutOfBounds(cell));
                }
                if !occupied.insert(cell) {
                    return Err(BoardError::ShipOverlaps(cell));
                }
            }
        }
        Ok(())
    }

    /// Random non-overlapping placement of the whole fleet.
    pub fn random_fleet<R: Rng>(
        rng: &mut R,
        config: &GameConfig,
    ) -> Result<Vec<Ship>, BoardError> {
        let size = i32::from(config.board_size);
        let mut occupied: HashSet<Point> = HashSet::new();
        let mut ships = Vec::with_capacity(config.fleet.len());
        for def in &config.fleet {
            let len = def.length() as i32;
            if len > size {
                return Err(BoardError::UnableToPlaceShip(def.name().to_string()));
            }
            let mut placed = None;
            for _ in 0..100 {
                let orientation = if rng.random() {
                    Orientation::Horizontal
                } else {
                    Orientation::Vertical
                };
                let (max_x, max_y) = match orientation {
                    Orientation::Horizontal => (size - len, size - 1),
                    Orientation::Vertical => (size - 1, size - len),
                };
                let origin = Point::new(rng.random_range(0..=max_x), rng.random_range(0..=max_y));
                let ship = Ship::place(*def, origin, orientation);
                if ship.cells().all(|c| !occupied.contains(&c)) {
                    placed = Some(ship);
                    break;
                }
            }
            let ship = placed.ok_or_else(|| BoardError::UnableToPlaceShip(def.name().to_string()))?;
            occupied.extend(ship.cells());
            ships.push(ship);
        }
        Ok(ships)
    }
}

/// Hits and misses recorded on one grid, in the order they happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShotLog {
    hits: Vec<Point>,
    misses: Vec<Point>,
}

impl ShotLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(hits: Vec<Point>, misses: Vec<Point>) -> Self {
        Self { hits, misses }
    }

    pub fn hits(&self) -> &[Point] {
        &self.hits
    }

    pub fn misses(&self) -> &[Point] {
        &self.misses
    }

    /// Record a hit; ignored if the point is already logged.
    pub fn record_hit(&mut self, p: Point) -> bool {
        if self.is_targeted(p) {
            return false;
        }
        self.hits.push(p);
        true
    }

    /// Record a miss; ignored if the point is already logged.
    pub fn record_miss(&mut self, p: Point) -> bool {
        if self.is_targeted(p) {
            return false;
        }
        self.misses.push(p);
        true
    }

    pub fn record(&mut self, p: Point, hit: bool) -> bool {
        if hit {
            self.record_hit(p)
        } else {
            self.record_miss(p)
        }
    }

    pub fn hit_at(&self, p: Point) -> bool {
        self.hits.contains(&p)
    }

    pub fn miss_at(&self, p: Point) -> bool {
        self.misses.contains(&p)
    }

    pub fn is_targeted(&self, p: Point) -> bool {
        self.hit_at(p) || self.miss_at(p)
    }

    pub fn len(&self) -> usize {
        self.hits.len() + self.misses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.hits.clear();
        self.misses.clear();
    }
}
