use skirmish_grid::TilePos;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SightError {
    #[error("invalid sight request: tile {pos} is outside the grid")]
    InvalidRequest { pos: TilePos },
}
