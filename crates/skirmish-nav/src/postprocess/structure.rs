use skirmish_grid::{Grid, StructureId, Vec2};

use crate::{Waypoint, WaypointPath};

/// Move interior waypoints that cross a structure boundary onto the tile's entry point.
///
/// The first and last waypoints are left alone. Snapped waypoints are pinned.
pub fn walk_through_structure(grid: &Grid, path: WaypointPath) -> WaypointPath {
    let mut waypoints = path.waypoints;
    let n = waypoints.len();
    if n < 3 {
        return WaypointPath::new(waypoints);
    }

    let structure_at = |pos: Vec2| -> Option<StructureId> {
        grid.tile_at_world(pos).and_then(|t| t.structure())
    };

    for i in 1..n - 1 {
        let Some(tile) = grid.tile_at_world(waypoints[i].pos) else {
            continue;
        };
        let (Some(structure), Some(entry)) = (tile.structure(), tile.entry_point()) else {
            continue;
        };
        let entering = structure_at(waypoints[i - 1].pos) != Some(structure);
        let leaving = structure_at(waypoints[i + 1].pos) != Some(structure);
        if !(entering || leaving) {
            continue;
        }
        let pos = tile.pos();
        let local = Vec2::new(pos.x as f32 + entry.x, pos.y as f32 + entry.y);
        waypoints[i] = Waypoint::pinned(grid.to_world(local));
    }

    WaypointPath::new(waypoints)
}
