use skirmish_grid::{FactionId, Grid, GridConfig, StructureId, TilePos, Vec2};
use skirmish_nav::postprocess::{funnel, simplify, spline, walk_through_structure};
use skirmish_nav::{
    MoverProfile, PathRequest, Pathfinder, PostPass, PostProcessor,
    WaypointPath,
};

fn mover() -> MoverProfile {
    MoverProfile::uniform(FactionId(0), 10)
}

fn waypoints(grid: &Grid, start: TilePos, goal: TilePos) -> WaypointPath {
    let mover = mover();
    Pathfinder::default()
        .find_path(grid, &PathRequest::new(start, goal, &mover), None)
        .expect("path")
        .waypoints(grid)
}

fn assert_close(a: Vec2, b: Vec2) {
    assert!(a.distance(b) < 1e-3, "{a:?} != {b:?}");
}

/// Column 0 and the top row are open; everything else is wall.
fn l_corridor() -> Grid {
    Grid::from_ascii(
        "
        ...
        .##
        .##
        ",
        GridConfig::default(),
    )
    .expect("grid")
}

#[test]
fn simplify_collapses_an_open_diagonal() {
    let grid = Grid::new(5, 5).expect("grid");
    let raw = waypoints(&grid, TilePos::new(0, 0), TilePos::new(4, 4));
    assert_eq!(raw.len(), 5);

    let simplified = simplify(&grid, &mover(), raw);
    assert_eq!(simplified.points(), vec![Vec2::new(4.0, 4.0), Vec2::new(36.0, 36.0)]);

    let standard = PostProcessor::standard().run(
        &grid,
        &mover(),
        waypoints(&grid, TilePos::new(0, 0), TilePos::new(4, 4)),
    );
    assert_eq!(standard.len(), 2);
}

#[test]
fn simplify_keeps_the_corner_of_an_l() {
    let grid = l_corridor();
    let raw = waypoints(&grid, TilePos::new(0, 0), TilePos::new(2, 2));
    assert_eq!(raw.len(), 5);

    let simplified = simplify(&grid, &mover(), raw);
    assert_eq!(
        simplified.points(),
        vec![
            Vec2::new(4.0, 4.0),
            Vec2::new(4.0, 20.0),
            Vec2::new(20.0, 20.0)
        ]
    );
}

#[test]
fn funnel_pulls_the_path_tight_around_the_inner_corner() {
    let grid = l_corridor();
    let mover = mover();
    let simplified = simplify(
        &grid,
        &mover,
        waypoints(&grid, TilePos::new(0, 0), TilePos::new(2, 2)),
    );
    let pulled = funnel(&grid, simplified.clone());

    let points = pulled.points();
    assert_eq!(points.len(), 3);
    assert_close(points[0], Vec2::new(4.0, 4.0));
    assert_close(points[1], Vec2::new(8.0, 16.0));
    assert_close(points[2], Vec2::new(20.0, 20.0));
    assert!(pulled.length() < simplified.length());
}

#[test]
fn funnel_leaves_straight_runs_alone() {
    let grid = Grid::new(6, 1).expect("grid");
    let path = WaypointPath::from_points([Vec2::new(4.0, 4.0), Vec2::new(44.0, 4.0)]);
    assert_eq!(funnel(&grid, path.clone()), path);
}

#[test]
fn structure_entry_is_pinned_and_survives_later_passes() {
    // A building occupies x = 3..=5 with a single door at (3, 1).
    let mut grid = Grid::new(6, 3).expect("grid");
    for y in 0..3 {
        for x in 3..6 {
            grid.set_structure(TilePos::new(x, y), Some(StructureId(1)), None);
        }
    }
    grid.set_blocked(TilePos::new(3, 0), true);
    grid.set_blocked(TilePos::new(3, 2), true);
    grid.set_structure(
        TilePos::new(3, 1),
        Some(StructureId(1)),
        Some(Vec2::new(0.1, 0.5)),
    );

    let mover = mover();
    let raw = waypoints(&grid, TilePos::new(0, 1), TilePos::new(5, 1));
    let entered = walk_through_structure(&grid, raw);
    let door: Vec<_> = entered.waypoints.iter().filter(|w| w.pinned).collect();
    assert_eq!(door.len(), 1);
    assert_close(door[0].pos, Vec2::new(24.8, 12.0));

    let smoothed = funnel(&grid, simplify(&grid, &mover, entered));
    assert_eq!(smoothed.len(), 3);
    assert!(smoothed.waypoints[1].pinned);
    assert_close(smoothed.waypoints[1].pos, Vec2::new(24.8, 12.0));

    let standard = PostProcessor::standard().run(
        &grid,
        &mover,
        waypoints(&grid, TilePos::new(0, 1), TilePos::new(5, 1)),
    );
    assert!(standard
        .waypoints
        .iter()
        .any(|w| w.pinned && w.pos.distance(Vec2::new(24.8, 12.0)) < 1e-3));
}

#[test]
fn spline_keeps_every_knot_in_order() {
    let grid = Grid::new(8, 8).expect("grid");
    let knots = WaypointPath::from_points([
        Vec2::new(4.0, 4.0),
        Vec2::new(28.0, 12.0),
        Vec2::new(36.0, 44.0),
        Vec2::new(60.0, 52.0),
    ]);
    let smooth = spline(&grid, &mover(), knots.clone(), 4);

    assert!(smooth.len() > knots.len());
    assert!(smooth.len() <= (knots.len() - 1) * 4 + 1);
    let mut cursor = smooth.points().into_iter();
    for knot in knots.points() {
        assert!(cursor.any(|p| p == knot), "knot {knot:?} missing");
    }
}

#[test]
fn spline_never_samples_inside_walls() {
    let grid = l_corridor();
    let mover = mover();
    let pulled = funnel(
        &grid,
        simplify(
            &grid,
            &mover,
            waypoints(&grid, TilePos::new(0, 0), TilePos::new(2, 2)),
        ),
    );
    let smooth = spline(&grid, &mover, pulled.clone(), 6);

    assert_eq!(smooth.first(), pulled.first());
    assert_eq!(smooth.last(), pulled.last());
    for w in &smooth.waypoints {
        let tile = grid.tile_at_world(w.pos).expect("inside the map");
        assert!(!tile.is_blocked(), "sample {:?} inside a wall", w.pos);
    }
}

#[test]
fn spline_is_a_no_op_on_short_paths() {
    let grid = Grid::new(4, 4).expect("grid");
    let path = WaypointPath::from_points([Vec2::new(4.0, 4.0), Vec2::new(28.0, 28.0)]);
    assert_eq!(spline(&grid, &mover(), path.clone(), 4), path);

    let three = WaypointPath::from_points([
        Vec2::new(4.0, 4.0),
        Vec2::new(12.0, 20.0),
        Vec2::new(28.0, 28.0),
    ]);
    assert_eq!(spline(&grid, &mover(), three.clone(), 1), three);
}

#[test]
fn custom_pass_order_is_respected() {
    let grid = Grid::new(5, 5).expect("grid");
    let raw = waypoints(&grid, TilePos::new(0, 0), TilePos::new(4, 4));
    let none = PostProcessor::default().run(&grid, &mover(), raw.clone());
    assert_eq!(none, raw);

    let only_simplify = PostProcessor::new(vec![PostPass::Simplify]).run(&grid, &mover(), raw);
    assert_eq!(only_simplify.len(), 2);
}
