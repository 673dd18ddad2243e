use crate::TilePos;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the eight grid directions, clockwise from North.
///
/// North is `+y`. The discriminant doubles as the index into per-direction tile arrays
/// (cover, edge walls) and is the order in which the pathfinder examines neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Direction> {
        Self::ALL.get(index).copied()
    }

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, -1),
            Direction::South => (0, -1),
            Direction::SouthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, 1),
        }
    }

    pub fn from_offset(dx: i32, dy: i32) -> Option<Direction> {
        Self::ALL
            .into_iter()
            .find(|d| d.offset() == (dx.signum(), dy.signum()) && (dx != 0 || dy != 0))
    }

    /// Rough bearing from one tile to another, by the signs of the coordinate deltas.
    pub fn toward(from: TilePos, to: TilePos) -> Option<Direction> {
        Self::from_offset(to.x - from.x, to.y - from.y)
    }

    pub fn step(self, pos: TilePos) -> TilePos {
        let (dx, dy) = self.offset();
        pos.offset(dx, dy)
    }

    pub fn opposite(self) -> Direction {
        Self::ALL[(self.index() + 4) % 8]
    }

    pub fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }

    /// Index into the four-entry cardinal arrays (N, E, S, W), `None` for diagonals.
    pub fn cardinal_index(self) -> Option<usize> {
        if self.is_diagonal() {
            None
        } else {
            Some(self.index() / 2)
        }
    }

    /// The two cardinals a diagonal is composed of (vertical first). Cardinals return themselves twice.
    pub fn cardinal_components(self) -> (Direction, Direction) {
        match self {
            Direction::NorthEast => (Direction::North, Direction::East),
            Direction::SouthEast => (Direction::South, Direction::East),
            Direction::SouthWest => (Direction::South, Direction::West),
            Direction::NorthWest => (Direction::North, Direction::West),
            d => (d, d),
        }
    }

    /// Smallest number of eighth-turns between two facings (0..=4).
    pub fn eighth_turns(self, other: Direction) -> u32 {
        let diff = (self.index() as i32 - other.index() as i32).rem_euclid(8) as u32;
        diff.min(8 - diff)
    }
}
