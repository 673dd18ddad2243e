use thiserror::Error;

use crate::grid::MAX_DIMENSION;
use crate::TilePos;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid dimensions {width}x{height} outside 1..={max}", max = MAX_DIMENSION)]
    InvalidDimensions { width: u32, height: u32 },
    #[error("unknown map glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph { glyph: char, row: usize, column: usize },
    #[error("map row {row} has {len} columns, expected {expected}")]
    RaggedRows { row: usize, len: usize, expected: usize },
    #[error("grid holds {found} tiles, expected {expected}")]
    TileCount { expected: usize, found: usize },
    #[error("tile {index} is at {found}, expected {expected}")]
    MisplacedTile {
        index: usize,
        expected: TilePos,
        found: TilePos,
    },
}
