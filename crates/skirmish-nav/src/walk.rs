//! Traversal rules shared by the pathfinder and the post-processing passes.

use skirmish_grid::{Direction, Grid, Tile, TilePos, Vec2};

use crate::MoverProfile;

/// The neighbour of `from` in `dir`, if the mover may enter it with a single step.
///
/// Ignores the diagonal corner rule; see [`can_step`].
pub(crate) fn enterable<'g>(
    grid: &'g Grid,
    mover: &MoverProfile,
    from: &Tile,
    dir: Direction,
    ignore_allies: bool,
) -> Option<&'g Tile> {
    let to = grid.neighbor(from.pos(), dir)?;
    if to.is_blocked() {
        return None;
    }
    mover.surface_cost(to.surface())?;
    if from.is_movement_blocked(dir) || to.is_movement_blocked(dir.opposite()) {
        return None;
    }
    match to.occupant() {
        None => Some(to),
        Some(o) if o.passable => Some(to),
        Some(o) if mover.is_ally(o.faction) && (ignore_allies || mover.walk_through_allies) => {
            Some(to)
        }
        Some(_) => None,
    }
}

/// Whether the mover can step from `from` in `dir`.
///
/// Diagonal steps also require both adjacent cardinal neighbours to be enterable, so a mover
/// never squeezes between two blocked corners.
pub fn can_step(
    grid: &Grid,
    mover: &MoverProfile,
    from: TilePos,
    dir: Direction,
    ignore_allies: bool,
) -> bool {
    let Some(from_tile) = grid.tile(from) else {
        return false;
    };
    step_target(grid, mover, from_tile, dir, ignore_allies).is_some()
}

pub(crate) fn step_target<'g>(
    grid: &'g Grid,
    mover: &MoverProfile,
    from: &Tile,
    dir: Direction,
    ignore_allies: bool,
) -> Option<&'g Tile> {
    let to = enterable(grid, mover, from, dir, ignore_allies)?;
    if dir.is_diagonal() {
        let (a, b) = dir.cardinal_components();
        enterable(grid, mover, from, a, ignore_allies)?;
        enterable(grid, mover, from, b, ignore_allies)?;
    }
    Some(to)
}

/// Tiles crossed by the tile-space segment `a -> b`, in order.
///
/// When the segment passes exactly through a tile corner the walk takes a single diagonal step.
/// The walk stops early if floating point drift prevents it from reaching `b`'s tile.
pub(crate) fn supercover(a: Vec2, b: Vec2) -> Vec<TilePos> {
    let mut cur = TilePos::containing(a);
    let end = TilePos::containing(b);
    let mut out = vec![cur];

    let d = b - a;
    let axis = |origin: f32, delta: f32, cell: i32| -> (i32, f32, f32) {
        if delta > 0.0 {
            (1, ((cell + 1) as f32 - origin) / delta, 1.0 / delta)
        } else if delta < 0.0 {
            (-1, (cell as f32 - origin) / delta, -1.0 / delta)
        } else {
            (0, f32::INFINITY, f32::INFINITY)
        }
    };
    let (step_x, mut t_max_x, t_delta_x) = axis(a.x, d.x, cur.x);
    let (step_y, mut t_max_y, t_delta_y) = axis(a.y, d.y, cur.y);

    let limit = (end.x - cur.x).abs() + (end.y - cur.y).abs() + 2;
    for _ in 0..limit {
        if cur == end {
            break;
        }
        let (dx, dy) = if step_x != 0 && step_y != 0 && (t_max_x - t_max_y).abs() <= 1e-5 {
            t_max_x += t_delta_x;
            t_max_y += t_delta_y;
            (step_x, step_y)
        } else if t_max_x < t_max_y {
            t_max_x += t_delta_x;
            (step_x, 0)
        } else {
            t_max_y += t_delta_y;
            (0, step_y)
        };
        if dx == 0 && dy == 0 {
            break;
        }
        cur = cur.offset(dx, dy);
        out.push(cur);
    }
    out
}

/// Whether a mover could walk the straight tile-space segment `a -> b`.
pub fn segment_walkable(grid: &Grid, mover: &MoverProfile, a: Vec2, b: Vec2) -> bool {
    let tiles = supercover(a, b);
    if tiles.last().copied() != Some(TilePos::containing(b)) {
        return false;
    }
    if tiles.first().and_then(|p| grid.tile(*p)).is_none() {
        return false;
    }
    tiles.windows(2).all(|w| {
        Direction::toward(w[0], w[1])
            .is_some_and(|dir| can_step(grid, mover, w[0], dir, false))
    })
}
