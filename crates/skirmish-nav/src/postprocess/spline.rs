use skirmish_grid::{Grid, Vec2};

use crate::walk::segment_walkable;
use crate::{MoverProfile, Waypoint, WaypointPath};

/// Catmull-Rom smoothing through every waypoint.
///
/// Each segment contributes `samples` points (the last one being the next knot). A segment whose
/// sampled curve leaves walkable ground is replaced by its straight chord.
pub fn spline(grid: &Grid, mover: &MoverProfile, path: WaypointPath, samples: u32) -> WaypointPath {
    let pts = path.waypoints;
    let n = pts.len();
    if n < 3 || samples <= 1 {
        return WaypointPath::new(pts);
    }

    let mut out = Vec::with_capacity((n - 1) * samples as usize + 1);
    out.push(pts[0]);
    for i in 0..n - 1 {
        let p0 = pts[i.saturating_sub(1)].pos;
        let p1 = pts[i].pos;
        let p2 = pts[i + 1].pos;
        let p3 = pts[(i + 2).min(n - 1)].pos;

        let curve: Vec<Vec2> = (1..samples)
            .map(|j| catmull_rom(p0, p1, p2, p3, j as f32 / samples as f32))
            .collect();

        let mut prev = p1;
        let walkable = curve.iter().chain(std::iter::once(&p2)).all(|&p| {
            let ok = segment_walkable(
                grid,
                mover,
                grid.to_tile_space(prev),
                grid.to_tile_space(p),
            );
            prev = p;
            ok
        });

        if walkable {
            out.extend(curve.into_iter().map(Waypoint::new));
        }
        out.push(pts[i + 1]);
    }

    WaypointPath::new(out)
}

fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    (p1 * 2.0
        + (p2 - p0) * t
        + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
        + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
        * 0.5
}
