use skirmish_grid::Grid;

use crate::walk::segment_walkable;
use crate::{MoverProfile, WaypointPath};

/// Greedy line-of-walk simplification.
///
/// From the last kept waypoint, skip ahead while the straight segment stays walkable. Pinned
/// waypoints always become anchors.
pub fn simplify(grid: &Grid, mover: &MoverProfile, path: WaypointPath) -> WaypointPath {
    let pts = path.waypoints;
    let n = pts.len();
    if n <= 2 {
        return WaypointPath::new(pts);
    }

    let mut out = Vec::with_capacity(n);
    out.push(pts[0]);
    let mut anchor = 0;
    for k in 2..n {
        let prev = k - 1;
        let walkable = segment_walkable(
            grid,
            mover,
            grid.to_tile_space(pts[anchor].pos),
            grid.to_tile_space(pts[k].pos),
        );
        if pts[prev].pinned || !walkable {
            out.push(pts[prev]);
            anchor = prev;
        }
    }
    out.push(pts[n - 1]);
    WaypointPath::new(out)
}
