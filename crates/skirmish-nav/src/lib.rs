//! Grid pathfinding for tactical movers and waypoint post-processing.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod cost;
pub mod mover;
pub mod path;
pub mod pathfinder;
pub mod postprocess;
mod walk;

pub use cost::{CostStrategy, NoAdjustment, TileScores};
pub use mover::MoverProfile;
pub use path::{TilePath, Waypoint, WaypointPath};
pub use pathfinder::{
    heuristic, CancelToken, PathError, PathRequest, Pathfinder, PathfinderConfig,
};
pub use postprocess::{PostPass, PostProcessor};
pub use walk::{can_step, segment_walkable};
