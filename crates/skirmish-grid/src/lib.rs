//! Bounded tactical tile grid: tiles, cover, occupancy, and per-faction visibility bits.
//!
//! This is the leaf of the skirmish stack. The pathfinder and the line-of-sight engine only
//! read from a [`Grid`]; cover recomputation and visibility writes go through `&mut Grid`, so
//! the borrow checker keeps searches and mutations from overlapping.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod direction;
pub mod error;
pub mod faction;
pub mod grid;
pub mod math;
pub mod tile;

pub use direction::Direction;
pub use error::GridError;
pub use faction::{EntityId, FactionId, FactionMask};
pub use grid::{Grid, GridConfig, MAX_DIMENSION};
pub use math::{TilePos, Vec2};
pub use tile::{BlockerKind, CoverLevel, LosBlocker, Occupant, StructureId, SurfaceType, Tile};
