use skirmish_grid::{Grid, GridConfig, GridError, SurfaceType, TilePos, Vec2, MAX_DIMENSION};

#[test]
fn grid_rejects_out_of_range_dimensions() {
    assert!(matches!(
        Grid::new(0, 5),
        Err(GridError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        Grid::new(MAX_DIMENSION + 1, 5),
        Err(GridError::InvalidDimensions { .. })
    ));
    assert!(Grid::new(MAX_DIMENSION, MAX_DIMENSION).is_ok());
}

#[test]
fn tile_lookup_is_bounds_checked() {
    let grid = Grid::new(4, 3).expect("grid");
    assert!(grid.tile(TilePos::new(3, 2)).is_some());
    assert!(grid.tile(TilePos::new(4, 0)).is_none());
    assert!(grid.tile(TilePos::new(0, 3)).is_none());
    assert!(grid.tile(TilePos::new(-1, 0)).is_none());
}

#[test]
fn world_lookup_uses_tile_size() {
    let grid = Grid::new(5, 5).expect("grid");
    assert_eq!(grid.tile_size(), 8.0);

    let tile = grid.tile_at_world(Vec2::new(17.0, 9.5)).expect("in bounds");
    assert_eq!(tile.pos(), TilePos::new(2, 1));
    assert_eq!(grid.tile_center_world(TilePos::new(2, 1)), Vec2::new(20.0, 12.0));

    assert!(grid.tile_at_world(Vec2::new(-0.1, 4.0)).is_none());
    assert!(grid.tile_at_world(Vec2::new(40.0, 4.0)).is_none());
}

#[test]
fn mutations_bump_version() {
    let mut grid = Grid::new(3, 3).expect("grid");
    let v0 = grid.version();
    grid.set_blocked(TilePos::new(1, 1), true);
    let v1 = grid.version();
    assert!(v1 > v0);

    // Out-of-bounds writes are ignored and do not count as layout changes.
    grid.set_blocked(TilePos::new(9, 9), true);
    assert_eq!(grid.version(), v1);

    // Visibility bits are not layout.
    grid.mark_visible(TilePos::new(0, 0), skirmish_grid::FactionMask(1));
    assert_eq!(grid.version(), v1);
}

#[test]
fn ascii_layout_places_rows_top_first() {
    let grid = Grid::from_ascii(
        "
        #..
        .=*
        ,~%
        ",
        GridConfig::default(),
    )
    .expect("layout");

    assert_eq!(grid.width(), 3);
    assert_eq!(grid.height(), 3);

    let wall = grid.tile(TilePos::new(0, 2)).expect("tile");
    assert!(wall.is_blocked());
    assert!(wall.is_blocking_line_of_sight());

    assert_eq!(
        grid.tile(TilePos::new(1, 1)).expect("tile").surface(),
        SurfaceType::Road
    );
    assert!(grid.tile(TilePos::new(2, 1)).expect("tile").is_difficult());
    assert_eq!(
        grid.tile(TilePos::new(1, 0)).expect("tile").surface(),
        SurfaceType::Water
    );
    assert!(grid.tile(TilePos::new(2, 0)).expect("tile").los_blocker().is_some());
}

#[test]
fn ascii_layout_reports_bad_input() {
    assert!(matches!(
        Grid::from_ascii("..\n.", GridConfig::default()),
        Err(GridError::RaggedRows { row: 1, .. })
    ));
    assert!(matches!(
        Grid::from_ascii("..\n.?", GridConfig::default()),
        Err(GridError::UnknownGlyph { glyph: '?', .. })
    ));
}

#[test]
fn move_occupant_requires_free_target() {
    use skirmish_grid::{EntityId, FactionId, Occupant};

    let mut grid = Grid::new(3, 1).expect("grid");
    let a = TilePos::new(0, 0);
    let b = TilePos::new(1, 0);
    let c = TilePos::new(2, 0);
    grid.set_occupant(a, Occupant::new(EntityId(1), FactionId(0)));
    grid.set_occupant(c, Occupant::new(EntityId(2), FactionId(1)));

    assert!(grid.move_occupant(a, b));
    assert_eq!(grid.find_occupant(EntityId(1)), Some(b));
    assert!(!grid.move_occupant(b, c));
    assert!(!grid.move_occupant(a, b));
}
