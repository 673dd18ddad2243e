use skirmish_grid::{Grid, TilePos, Vec2};

use crate::walk::supercover;
use crate::{Waypoint, WaypointPath};

const COLLINEAR_EPSILON: f32 = 1e-4;

/// String-pull each run of waypoints between pinned waypoints through its tile corridor.
///
/// Runs whose corridor cannot be rasterised are returned unchanged.
pub fn funnel(grid: &Grid, path: WaypointPath) -> WaypointPath {
    let pts = path.waypoints;
    let n = pts.len();
    if n < 2 {
        return WaypointPath::new(pts);
    }

    let mut bounds: Vec<usize> = (0..n)
        .filter(|&i| i == 0 || i == n - 1 || pts[i].pinned)
        .collect();
    bounds.dedup();

    let mut out: Vec<Waypoint> = Vec::with_capacity(n);
    out.push(pts[0]);
    for w in bounds.windows(2) {
        let section = &pts[w[0]..=w[1]];
        let pulled = funnel_section(grid, section).unwrap_or_else(|| section.to_vec());
        out.extend(pulled.into_iter().skip(1));
    }

    WaypointPath::new(prune(grid, out))
}

fn funnel_section(grid: &Grid, section: &[Waypoint]) -> Option<Vec<Waypoint>> {
    let first = *section.first()?;
    let last = *section.last()?;
    if section.len() < 2 {
        return Some(section.to_vec());
    }

    let local: Vec<Vec2> = section
        .iter()
        .map(|w| grid.to_tile_space(w.pos))
        .collect();
    let corridor = corridor(&local)?;
    if corridor.len() <= 1 {
        return Some(vec![first, last]);
    }

    let start = local[0];
    let goal = local[local.len() - 1];
    let mut portals = Vec::with_capacity(corridor.len() + 1);
    portals.push((start, start));
    for w in corridor.windows(2) {
        portals.push(portal(w[0], w[1])?);
    }
    portals.push((goal, goal));

    let corners = string_pull(&portals);
    let mut out = Vec::with_capacity(corners.len());
    out.push(first);
    for p in corners.iter().skip(1) {
        if *p != goal {
            out.push(Waypoint::new(grid.to_world(*p)));
        }
    }
    out.push(last);
    Some(out)
}

/// Tile-space corridor visited by the polyline, without repeats between segments.
fn corridor(points: &[Vec2]) -> Option<Vec<TilePos>> {
    let mut tiles: Vec<TilePos> = Vec::new();
    for w in points.windows(2) {
        let raster = supercover(w[0], w[1]);
        if raster.last().copied() != Some(TilePos::containing(w[1])) {
            return None;
        }
        for tile in raster {
            if tiles.last() != Some(&tile) {
                tiles.push(tile);
            }
        }
    }
    if tiles.is_empty() {
        tiles.push(TilePos::containing(*points.first()?));
    }
    Some(tiles)
}

/// `(left, right)` crossing between two adjacent tiles, seen from `from`.
///
/// Diagonal steps share only a corner, giving a degenerate portal.
fn portal(from: TilePos, to: TilePos) -> Option<(Vec2, Vec2)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let x0 = from.x as f32;
    let y0 = from.y as f32;
    let (p0, p1) = match (dx, dy) {
        (1, 0) => (Vec2::new(x0 + 1.0, y0), Vec2::new(x0 + 1.0, y0 + 1.0)),
        (-1, 0) => (Vec2::new(x0, y0), Vec2::new(x0, y0 + 1.0)),
        (0, 1) => (Vec2::new(x0, y0 + 1.0), Vec2::new(x0 + 1.0, y0 + 1.0)),
        (0, -1) => (Vec2::new(x0, y0), Vec2::new(x0 + 1.0, y0)),
        (1 | -1, 1 | -1) => {
            let corner = Vec2::new(x0 + dx.max(0) as f32, y0 + dy.max(0) as f32);
            (corner, corner)
        }
        _ => return None,
    };

    let c0 = from.center();
    let dir = to.center() - c0;
    let s0 = dir.cross(p0 - c0);
    let s1 = dir.cross(p1 - c0);
    Some(if s0 >= s1 { (p0, p1) } else { (p1, p0) })
}

/// Twice the signed area of `abc`, positive when `c` lies right of `a -> b`.
fn tri_area2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c - a).cross(b - a)
}

fn string_pull(portals: &[(Vec2, Vec2)]) -> Vec<Vec2> {
    let mut out = Vec::new();
    let Some(&(start, _)) = portals.first() else {
        return out;
    };
    out.push(start);

    let mut apex = start;
    let mut left = start;
    let mut right = start;
    let mut left_index: usize = 0;
    let mut right_index: usize = 0;

    let guard = portals.len() * portals.len() + 8;
    let mut iterations = 0;
    let mut i: usize = 1;
    while i < portals.len() {
        iterations += 1;
        if iterations > guard {
            tracing::warn!(portals = portals.len(), "funnel did not converge");
            break;
        }
        let (p_left, p_right) = portals[i];

        if tri_area2(apex, right, p_right) <= 0.0 {
            if apex == right || tri_area2(apex, left, p_right) > 0.0 {
                right = p_right;
                right_index = i;
            } else {
                out.push(left);
                apex = left;
                right = apex;
                right_index = left_index;
                i = left_index + 1;
                continue;
            }
        }

        if tri_area2(apex, left, p_left) >= 0.0 {
            if apex == left || tri_area2(apex, right, p_left) < 0.0 {
                left = p_left;
                left_index = i;
            } else {
                out.push(right);
                apex = right;
                left = apex;
                left_index = right_index;
                i = right_index + 1;
                continue;
            }
        }

        i += 1;
    }

    if let Some(&(goal, _)) = portals.last() {
        if out.last() != Some(&goal) {
            out.push(goal);
        }
    }
    out
}

/// Drop repeated points and unpinned points lying on the segment between their neighbours.
fn prune(grid: &Grid, pts: Vec<Waypoint>) -> Vec<Waypoint> {
    let mut deduped: Vec<Waypoint> = Vec::with_capacity(pts.len());
    for wp in pts {
        match deduped.last_mut() {
            Some(prev) if prev.pos == wp.pos => prev.pinned |= wp.pinned,
            _ => deduped.push(wp),
        }
    }

    let n = deduped.len();
    if n < 3 {
        return deduped;
    }
    let mut out = Vec::with_capacity(n);
    out.push(deduped[0]);
    for i in 1..n - 1 {
        let cur = deduped[i];
        let Some(prev) = out.last().copied() else {
            continue;
        };
        let next = deduped[i + 1];
        let a = grid.to_tile_space(prev.pos);
        let b = grid.to_tile_space(cur.pos);
        let c = grid.to_tile_space(next.pos);
        let collinear = (b - a).cross(c - b).abs() <= COLLINEAR_EPSILON && (b - a).dot(c - b) >= 0.0;
        if cur.pinned || !collinear {
            out.push(cur);
        }
    }
    out.push(deduped[n - 1]);
    out
}
