use std::collections::HashSet;

use skirmish_grid::{
    Direction, EntityId, FactionId, Grid, GridConfig, Occupant, TilePos,
};
use skirmish_sight::{
    FactionGroups, NoConcealment, Observer, SightError, Stat, VisibilityConfig,
    VisibilityManager,
};

const RED: FactionId = FactionId(0);
const BLUE: FactionId = FactionId(1);
const GREEN: FactionId = FactionId(2);

const SCOUT: EntityId = EntityId(1);
const TARGET: EntityId = EntityId(2);

fn visible(grid: &Grid, faction: FactionId) -> HashSet<TilePos> {
    grid.visible_tiles(faction).into_iter().collect()
}

fn courtyard() -> Grid {
    Grid::from_ascii(
        "
        .........
        .##...#..
        .#.......
        ....#....
        ..#......
        .....##..
        .........
        ",
        GridConfig::default(),
    )
    .expect("grid")
}

#[test]
fn open_ground_is_seen_out_to_the_vision_range() {
    let mut grid = Grid::new(9, 9).expect("grid");
    let mut vis = VisibilityManager::default();
    let scout = Observer::new(SCOUT, TilePos::new(4, 4), RED, 3.0);

    let marked = vis
        .recompute_visibility(&mut grid, &scout, &NoConcealment)
        .expect("valid observer");
    assert_eq!(marked, 49);
    assert_eq!(grid.visible_tiles(RED).len(), 49);
    assert!(grid.visible_tiles(BLUE).is_empty());
    assert!(!grid.tile(TilePos::new(0, 0)).expect("tile").is_visible_to(RED));
    assert!(vis.active_factions().contains(RED));
}

#[test]
fn vision_multiplier_scales_the_range() {
    let mut grid = Grid::new(9, 9).expect("grid");
    let mut vis = VisibilityManager::default();
    let scout = Observer::new(SCOUT, TilePos::new(4, 4), RED, 3.0)
        .with_vision(Stat::new(3.0).with_multiplier(0.5));
    let marked = vis
        .recompute_visibility(&mut grid, &scout, &NoConcealment)
        .expect("valid observer");
    assert_eq!(marked, 9);
}

#[test]
fn visibility_grows_monotonically_with_vision() {
    let mut last: HashSet<TilePos> = HashSet::new();
    for range in [0.0, 2.0, 3.0, 5.0, 9.0] {
        let mut grid = courtyard();
        let mut vis = VisibilityManager::default();
        let scout = Observer::new(SCOUT, TilePos::new(3, 3), RED, range);
        vis.recompute_visibility(&mut grid, &scout, &NoConcealment)
            .expect("valid observer");

        let now = visible(&grid, RED);
        assert!(last.is_subset(&now), "range {range} lost tiles");
        assert!(now.contains(&TilePos::new(3, 3)));
        last = now;
    }
}

#[test]
fn walls_hide_what_lies_behind_them() {
    let mut grid = Grid::from_ascii(
        "
        .......
        ...#...
        .......
        ",
        GridConfig::default(),
    )
    .expect("grid");
    let mut vis = VisibilityManager::default();
    let scout = Observer::new(SCOUT, TilePos::new(0, 1), RED, 10.0);
    vis.recompute_visibility(&mut grid, &scout, &NoConcealment)
        .expect("valid observer");

    let seen = visible(&grid, RED);
    assert!(seen.contains(&TilePos::new(3, 1)));
    assert!(!seen.contains(&TilePos::new(5, 1)));
    assert!(seen.contains(&TilePos::new(5, 2)));
}

#[test]
fn concealment_shortens_detection_range() {
    let mut grid = Grid::new(9, 1).expect("grid");
    let target = TilePos::new(4, 0);
    grid.set_occupant(TilePos::new(0, 0), Occupant::new(SCOUT, RED));
    grid.set_occupant(target, Occupant::new(TARGET, BLUE));

    let scout = Observer::new(SCOUT, TilePos::new(0, 0), RED, 6.0);
    let sneaky = |id: EntityId| if id == TARGET { 3 } else { 0 };

    let mut vis = VisibilityManager::default();
    vis.recompute_all(&mut grid, &[scout], &sneaky)
        .expect("valid observer");
    assert!(grid.tile(target).expect("tile").is_visible_to(RED));
    assert!(!vis.is_detected(TARGET, RED));
    assert!(!vis.is_detected(SCOUT, RED));

    let sharp = scout.with_detection(Stat::new(2.0));
    vis.recompute_all(&mut grid, &[sharp], &sneaky)
        .expect("valid observer");
    assert!(vis.is_detected(TARGET, RED));
    assert_eq!(vis.detected_entities(RED), vec![TARGET]);
}

#[test]
fn cover_toward_the_observer_adds_concealment() {
    let mut grid = Grid::new(9, 1).expect("grid");
    let target = TilePos::new(4, 0);
    grid.set_occupant(target, Occupant::new(TARGET, BLUE));
    grid.set_half_cover(target, Direction::West, true);

    let scout = Observer::new(SCOUT, TilePos::new(0, 0), RED, 6.0);
    let mut vis = VisibilityManager::default();

    vis.recompute_all(&mut grid, &[scout], &NoConcealment)
        .expect("valid observer");
    assert!(vis.is_detected(TARGET, RED));

    let camouflaged = |_: EntityId| 2;
    vis.recompute_all(&mut grid, &[scout], &camouflaged)
        .expect("valid observer");
    assert!(!vis.is_detected(TARGET, RED));

    // Cover on the far side does not help.
    grid.set_half_cover(target, Direction::West, false);
    grid.set_half_cover(target, Direction::East, true);
    let config = VisibilityConfig {
        half_cover_concealment: 5,
        ..VisibilityConfig::default()
    };
    let mut vis = VisibilityManager::new(config);
    vis.recompute_all(&mut grid, &[scout], &NoConcealment)
        .expect("valid observer");
    assert!(vis.is_detected(TARGET, RED));
}

#[test]
fn extreme_concealment_ratings_hide_without_overflow() {
    let mut grid = Grid::new(9, 1).expect("grid");
    let target = TilePos::new(4, 0);
    grid.set_occupant(target, Occupant::new(TARGET, BLUE));
    grid.set_half_cover(target, Direction::West, true);

    let ghost = |_: EntityId| i32::MAX;
    let scout = Observer::new(SCOUT, TilePos::new(0, 0), RED, 6.0);
    let mut vis = VisibilityManager::default();
    vis.recompute_all(&mut grid, &[scout], &ghost)
        .expect("valid observer");
    assert!(grid.tile(target).expect("tile").is_visible_to(RED));
    assert!(!vis.is_detected(TARGET, RED));

    let glaring = |_: EntityId| i32::MIN;
    let sharp = scout.with_detection(Stat::new(1.0e12));
    vis.recompute_all(&mut grid, &[sharp], &glaring)
        .expect("valid observer");
    assert!(vis.is_detected(TARGET, RED));
}

#[test]
fn grouped_factions_share_vision() {
    let mut grid = Grid::new(7, 7).expect("grid");
    grid.set_occupant(TilePos::new(5, 5), Occupant::new(TARGET, GREEN));
    let mut vis =
        VisibilityManager::default().with_groups(FactionGroups::new().with_group([RED, BLUE]));
    let scout = Observer::new(SCOUT, TilePos::new(3, 3), RED, 4.0);

    vis.recompute_visibility(&mut grid, &scout, &NoConcealment)
        .expect("valid observer");
    assert_eq!(visible(&grid, RED), visible(&grid, BLUE));
    assert!(grid.visible_tiles(GREEN).is_empty());
    assert!(vis.is_detected(TARGET, BLUE));
    assert!(!vis.is_detected(TARGET, GREEN));
}

#[test]
fn fog_toggle_reveals_and_restores() {
    let mut grid = Grid::from_ascii(
        "
        .......
        ...#...
        .......
        ",
        GridConfig::default(),
    )
    .expect("grid");
    let hidden = TilePos::new(5, 1);
    grid.set_occupant(hidden, Occupant::new(TARGET, BLUE));
    let observers = [Observer::new(SCOUT, TilePos::new(0, 1), RED, 10.0)];
    let mut vis = VisibilityManager::default();

    vis.recompute_all(&mut grid, &observers, &NoConcealment)
        .expect("valid observers");
    assert!(!grid.tile(hidden).expect("tile").is_visible_to(RED));
    assert!(!vis.is_detected(TARGET, RED));

    vis.set_fog_of_war(&mut grid, false, &observers, &NoConcealment)
        .expect("valid observers");
    assert!(!vis.fog_of_war());
    assert_eq!(grid.visible_tiles(RED).len(), grid.len());
    assert!(vis.is_detected(TARGET, RED));

    vis.set_fog_of_war(&mut grid, true, &observers, &NoConcealment)
        .expect("valid observers");
    assert!(!grid.tile(hidden).expect("tile").is_visible_to(RED));
    assert!(!vis.is_detected(TARGET, RED));
}

#[test]
fn lifting_fog_does_not_detect_the_observer_itself() {
    let mut grid = Grid::new(5, 5).expect("grid");
    let eye = TilePos::new(0, 0);
    grid.set_occupant(eye, Occupant::new(SCOUT, RED));
    grid.set_occupant(TilePos::new(4, 4), Occupant::new(TARGET, BLUE));
    let observers = [Observer::new(SCOUT, eye, RED, 1.0)];
    let mut vis = VisibilityManager::default();

    vis.set_fog_of_war(&mut grid, false, &observers, &NoConcealment)
        .expect("valid observers");
    assert!(!vis.is_detected(SCOUT, RED));
    assert_eq!(vis.detected_entities(RED), vec![TARGET]);
}

#[test]
fn faction_recompute_drops_stale_tiles() {
    let mut grid = Grid::new(12, 3).expect("grid");
    let mut vis = VisibilityManager::default();
    let red = Observer::new(SCOUT, TilePos::new(0, 1), RED, 2.0);
    let blue = Observer::new(EntityId(5), TilePos::new(11, 1), BLUE, 2.0);
    vis.recompute_all(&mut grid, &[red, blue], &NoConcealment)
        .expect("valid observers");
    assert!(visible(&grid, RED).contains(&TilePos::new(2, 1)));
    let blue_before = visible(&grid, BLUE);

    let moved = Observer {
        pos: TilePos::new(8, 1),
        ..red
    };
    vis.recompute_faction(&mut grid, RED, &[moved, blue], &NoConcealment)
        .expect("valid observers");
    let now = visible(&grid, RED);
    assert!(!now.contains(&TilePos::new(2, 1)));
    assert!(now.contains(&TilePos::new(10, 1)));
    assert_eq!(visible(&grid, BLUE), blue_before);

    vis.clear_faction(&mut grid, RED);
    assert!(grid.visible_tiles(RED).is_empty());
    assert_eq!(visible(&grid, BLUE), blue_before);

    vis.reset(&mut grid);
    assert!(grid.visible_tiles(BLUE).is_empty());
    assert!(vis.active_factions().is_empty());
}

#[test]
fn observers_outside_the_map_are_rejected() {
    let mut grid = Grid::new(4, 4).expect("grid");
    let mut vis = VisibilityManager::default();
    let lost = Observer::new(SCOUT, TilePos::new(9, 9), RED, 3.0);
    assert_eq!(
        vis.recompute_visibility(&mut grid, &lost, &NoConcealment),
        Err(SightError::InvalidRequest {
            pos: TilePos::new(9, 9)
        })
    );
}
