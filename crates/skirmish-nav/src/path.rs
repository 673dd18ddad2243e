use skirmish_grid::{Grid, TilePos, Vec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of a successful search: the tile sequence from start to goal, inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TilePath {
    pub tiles: Vec<TilePos>,
    pub cost: u32,
    /// [`Grid::version`] the search ran against.
    pub grid_version: u64,
    /// Number of nodes expanded by the search.
    pub expanded: usize,
}

impl TilePath {
    pub fn start(&self) -> Option<TilePos> {
        self.tiles.first().copied()
    }

    pub fn goal(&self) -> Option<TilePos> {
        self.tiles.last().copied()
    }

    /// Number of steps (tiles entered).
    pub fn steps(&self) -> usize {
        self.tiles.len().saturating_sub(1)
    }

    /// True once the grid layout has changed since this path was computed.
    pub fn is_stale(&self, grid: &Grid) -> bool {
        grid.version() != self.grid_version
    }

    /// World-space waypoints through every tile centre.
    pub fn waypoints(&self, grid: &Grid) -> WaypointPath {
        WaypointPath::new(
            self.tiles
                .iter()
                .map(|p| Waypoint::new(grid.tile_center_world(*p)))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waypoint {
    /// World-space position.
    pub pos: Vec2,
    /// Pinned waypoints are never moved or removed by later passes.
    pub pinned: bool,
}

impl Waypoint {
    pub fn new(pos: Vec2) -> Self {
        Self { pos, pinned: false }
    }

    pub fn pinned(pos: Vec2) -> Self {
        Self { pos, pinned: true }
    }
}

/// Waypoint list handed to movement / animation.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaypointPath {
    pub waypoints: Vec<Waypoint>,
}

impl WaypointPath {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        Self::new(points.into_iter().map(Waypoint::new).collect())
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn points(&self) -> Vec<Vec2> {
        self.waypoints.iter().map(|w| w.pos).collect()
    }

    pub fn first(&self) -> Option<Vec2> {
        self.waypoints.first().map(|w| w.pos)
    }

    pub fn last(&self) -> Option<Vec2> {
        self.waypoints.last().map(|w| w.pos)
    }

    /// Total polyline length in world units.
    pub fn length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|w| w[0].pos.distance(w[1].pos))
            .sum()
    }
}
