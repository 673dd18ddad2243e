//! Waypoint smoothing passes applied to a found tile path.
//!
//! Every pass is a pure function of the grid, the mover, and the incoming waypoints. Pinned
//! waypoints (structure entry points) are never moved or removed by a later pass.

mod funnel;
mod simplify;
mod spline;
mod structure;

pub use funnel::funnel;
pub use simplify::simplify;
pub use spline::spline;
pub use structure::walk_through_structure;

use skirmish_grid::Grid;

use crate::{MoverProfile, WaypointPath};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PostPass {
    /// Snap waypoints that enter or leave a structure to its entry point and pin them.
    WalkThroughStructure,
    /// Drop waypoints that a straight walk can skip.
    Simplify,
    /// String-pull through the tile corridor between pinned waypoints.
    Funnel,
    /// Catmull-Rom smoothing with `samples` points per segment.
    Spline { samples: u32 },
}

impl PostPass {
    pub fn apply(self, grid: &Grid, mover: &MoverProfile, path: WaypointPath) -> WaypointPath {
        match self {
            PostPass::WalkThroughStructure => walk_through_structure(grid, path),
            PostPass::Simplify => simplify(grid, mover, path),
            PostPass::Funnel => funnel(grid, path),
            PostPass::Spline { samples } => spline(grid, mover, path, samples),
        }
    }
}

/// Ordered list of [`PostPass`]es.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PostProcessor {
    pub passes: Vec<PostPass>,
}

impl PostProcessor {
    pub fn new(passes: Vec<PostPass>) -> Self {
        Self { passes }
    }

    /// Structure entry, simplify, funnel, then a 4-sample spline.
    pub fn standard() -> Self {
        Self::new(vec![
            PostPass::WalkThroughStructure,
            PostPass::Simplify,
            PostPass::Funnel,
            PostPass::Spline { samples: 4 },
        ])
    }

    pub fn run(&self, grid: &Grid, mover: &MoverProfile, path: WaypointPath) -> WaypointPath {
        let before = path.len();
        let out = self
            .passes
            .iter()
            .fold(path, |path, pass| pass.apply(grid, mover, path));
        tracing::trace!(before, after = out.len(), "post-processed path");
        out
    }
}
