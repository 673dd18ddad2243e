#![cfg(all(feature = "nav", feature = "sight"))]

use skirmish::grid::{EntityId, FactionId, Grid, GridConfig, Occupant, TilePos};
use skirmish::nav::{MoverProfile, PathRequest, Pathfinder, PostProcessor};
use skirmish::sight::{NoConcealment, Observer, VisibilityManager};

const RED: FactionId = FactionId(0);
const BLUE: FactionId = FactionId(1);

/// Move a unit around a wall, then recompute what its faction sees from the new tile.
#[test]
fn move_then_recompute_visibility() {
    let mut grid = Grid::from_ascii(
        "
        ........
        ...#....
        ...#....
        ...#....
        ........
        ",
        GridConfig::default(),
    )
    .expect("grid");
    let scout = EntityId(1);
    let start = TilePos::new(1, 2);
    let goal = TilePos::new(5, 2);
    grid.set_occupant(start, Occupant::new(scout, RED));
    grid.set_occupant(TilePos::new(7, 2), Occupant::new(EntityId(2), BLUE));

    let observers = [Observer::new(scout, start, RED, 8.0)];
    let mut vis = VisibilityManager::default();
    vis.recompute_all(&mut grid, &observers, &NoConcealment)
        .expect("valid observers");
    assert!(!vis.is_detected(EntityId(2), RED));

    let mover = MoverProfile::infantry(RED);
    let path = Pathfinder::default()
        .find_path(&grid, &PathRequest::new(start, goal, &mover), None)
        .expect("path around the wall");
    assert!(path.tiles.iter().all(|p| p.x != 3 || p.y == 0 || p.y == 4));

    let waypoints = PostProcessor::standard().run(&grid, &mover, path.waypoints(&grid));
    assert_eq!(waypoints.first(), Some(grid.tile_center_world(start)));
    assert_eq!(waypoints.last(), Some(grid.tile_center_world(goal)));

    assert!(grid.move_occupant(start, goal));
    assert!(path.is_stale(&grid));

    let moved = [Observer::new(scout, goal, RED, 8.0)];
    vis.recompute_faction(&mut grid, RED, &moved, &NoConcealment)
        .expect("valid observers");
    assert!(vis.is_detected(EntityId(2), RED));
    assert!(grid.tile(TilePos::new(7, 2)).expect("tile").is_visible_to(RED));
}
