use crate::{
    BlockerKind, CoverLevel, Direction, EntityId, FactionId, FactionMask, GridError, LosBlocker,
    Occupant, StructureId, SurfaceType, Tile, TilePos, Vec2,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest supported map side, in tiles.
pub const MAX_DIMENSION: u32 = 42;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GridConfig {
    /// World units per tile.
    pub tile_size: f32,
    /// Height difference at which a neighbour counts as elevated cover.
    pub elevation_threshold: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tile_size: 8.0,
            elevation_threshold: 2.0,
        }
    }
}

/// Bounded tile store.
///
/// Every mutation that can change movement or cover bumps [`Grid::version`], so long-lived
/// paths can detect that they were computed against an older layout. Visibility bit writes do
/// not bump the version.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "GridRepr"))]
pub struct Grid {
    width: i32,
    height: i32,
    config: GridConfig,
    tiles: Vec<Tile>,
    version: u64,
}

/// Unchecked wire form of [`Grid`]; only reachable through `TryFrom`.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct GridRepr {
    width: i32,
    height: i32,
    config: GridConfig,
    tiles: Vec<Tile>,
    version: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<GridRepr> for Grid {
    type Error = GridError;

    fn try_from(repr: GridRepr) -> Result<Self, GridError> {
        let width = u32::try_from(repr.width).unwrap_or(0);
        let height = u32::try_from(repr.height).unwrap_or(0);
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(GridError::InvalidDimensions { width, height });
        }
        let expected = (width * height) as usize;
        if repr.tiles.len() != expected {
            return Err(GridError::TileCount {
                expected,
                found: repr.tiles.len(),
            });
        }
        for (index, tile) in repr.tiles.iter().enumerate() {
            let want = TilePos::new(index as i32 % repr.width, index as i32 / repr.width);
            if tile.pos != want {
                return Err(GridError::MisplacedTile {
                    index,
                    expected: want,
                    found: tile.pos,
                });
            }
        }
        Ok(Self {
            width: repr.width,
            height: repr.height,
            config: repr.config,
            tiles: repr.tiles,
            version: repr.version,
        })
    }
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        Self::with_config(width, height, GridConfig::default())
    }

    pub fn with_config(width: u32, height: u32, config: GridConfig) -> Result<Self, GridError> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(GridError::InvalidDimensions { width, height });
        }
        let width = width as i32;
        let height = height as i32;
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(TilePos::new(x, y)));
            }
        }
        Ok(Self {
            width,
            height,
            config,
            tiles,
            version: 0,
        })
    }

    /// Parse an ascii layout, top row (highest `y`) first.
    ///
    /// | glyph | meaning                                   |
    /// |-------|-------------------------------------------|
    /// | `.`   | open ground                               |
    /// | `#`   | blocked wall, blocks line of sight        |
    /// | `=`   | road                                      |
    /// | `,`   | grass                                     |
    /// | `~`   | water                                     |
    /// | `%`   | grass under foliage (partial LOS blocker) |
    /// | `h`   | half-cover markers on all four cardinals  |
    /// | `^`   | raised ground (elevation 3.0)             |
    /// | `*`   | rubble, difficult terrain                 |
    pub fn from_ascii(layout: &str, config: GridConfig) -> Result<Self, GridError> {
        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let expected = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        for (row, line) in rows.iter().enumerate() {
            let len = line.chars().count();
            if len != expected {
                return Err(GridError::RaggedRows { row, len, expected });
            }
        }

        let mut grid = Self::with_config(expected as u32, rows.len() as u32, config)?;
        let top = grid.height - 1;
        for (row, line) in rows.iter().enumerate() {
            for (column, glyph) in line.chars().enumerate() {
                let pos = TilePos::new(column as i32, top - row as i32);
                let Some(tile) = grid.tile_mut(pos) else {
                    continue;
                };
                match glyph {
                    '.' => {}
                    '#' => {
                        tile.blocked = true;
                        tile.blocks_los = true;
                    }
                    '=' => tile.surface = SurfaceType::Road,
                    ',' => tile.surface = SurfaceType::Grass,
                    '~' => tile.surface = SurfaceType::Water,
                    '%' => {
                        tile.surface = SurfaceType::Grass;
                        tile.los_blocker = Some(LosBlocker::full(BlockerKind::Foliage));
                    }
                    'h' => tile.half_cover = [true; 4],
                    '^' => tile.elevation = 3.0,
                    '*' => {
                        tile.surface = SurfaceType::Rubble;
                        tile.difficult = true;
                    }
                    other => {
                        return Err(GridError::UnknownGlyph {
                            glyph: other,
                            row,
                            column,
                        })
                    }
                }
            }
        }
        grid.recalculate_all_cover();
        tracing::debug!(width = grid.width, height = grid.height, "parsed ascii grid");
        Ok(grid)
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn tile_size(&self) -> f32 {
        self.config.tile_size
    }

    /// Monotonic counter of layout mutations.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Row-major index of an in-bounds tile.
    pub fn index_of(&self, pos: TilePos) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some((pos.y * self.width + pos.x) as usize)
    }

    pub fn pos_at_index(&self, index: usize) -> Option<TilePos> {
        if index >= self.tiles.len() {
            return None;
        }
        let index = index as i32;
        Some(TilePos::new(index % self.width, index / self.width))
    }

    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.index_of(pos).map(|i| &self.tiles[i])
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter()
    }

    pub fn neighbor(&self, pos: TilePos, dir: Direction) -> Option<&Tile> {
        self.tile(dir.step(pos))
    }

    /// In-bounds neighbours in direction order.
    pub fn neighbors(&self, pos: TilePos) -> impl Iterator<Item = (Direction, &Tile)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.neighbor(pos, d).map(|t| (d, t)))
    }

    pub fn world_to_tile(&self, world: Vec2) -> Option<TilePos> {
        let pos = TilePos::containing(self.to_tile_space(world));
        self.in_bounds(pos).then_some(pos)
    }

    pub fn tile_at_world(&self, world: Vec2) -> Option<&Tile> {
        self.world_to_tile(world).and_then(|p| self.tile(p))
    }

    pub fn tile_center_world(&self, pos: TilePos) -> Vec2 {
        self.to_world(pos.center())
    }

    pub fn to_world(&self, tile_space: Vec2) -> Vec2 {
        tile_space * self.config.tile_size
    }

    pub fn to_tile_space(&self, world: Vec2) -> Vec2 {
        world / self.config.tile_size
    }

    /// Entity positions are not indexed; this is a linear scan.
    pub fn find_occupant(&self, id: EntityId) -> Option<TilePos> {
        self.tiles
            .iter()
            .find(|t| t.occupant.map(|o| o.id) == Some(id))
            .map(|t| t.pos)
    }

    pub fn set_blocked(&mut self, pos: TilePos, blocked: bool) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.blocked = blocked;
            self.recalculate_cover_around(pos);
            tracing::trace!(%pos, blocked, version = self.version, "tile blocking changed");
        }
    }

    pub fn set_elevation(&mut self, pos: TilePos, elevation: f32) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.elevation = elevation;
            self.recalculate_cover_around(pos);
        }
    }

    pub fn set_surface(&mut self, pos: TilePos, surface: SurfaceType) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.surface = surface;
        }
    }

    pub fn set_half_cover(&mut self, pos: TilePos, dir: Direction, enabled: bool) {
        let Some(index) = dir.cardinal_index() else {
            return;
        };
        if let Some(tile) = self.tile_mut(pos) {
            tile.half_cover[index] = enabled;
            self.calculate_surrounding_cover(pos);
        }
    }

    /// Place or remove a wall on the edge between `pos` and its neighbour in `dir`.
    ///
    /// Both sides of the edge are updated so the wall is symmetric.
    pub fn set_edge_blocked(&mut self, pos: TilePos, dir: Direction, blocked: bool) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.movement_blocked[dir.index()] = blocked;
        }
        if let Some(other) = self.tile_mut(dir.step(pos)) {
            other.movement_blocked[dir.opposite().index()] = blocked;
        }
    }

    pub fn set_occupant(&mut self, pos: TilePos, occupant: Occupant) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.occupant = Some(occupant);
            self.recalculate_cover_around(pos);
        }
    }

    pub fn clear_occupant(&mut self, pos: TilePos) -> Option<Occupant> {
        let previous = self.tile_mut(pos)?.occupant.take();
        self.recalculate_cover_around(pos);
        previous
    }

    /// Move whatever stands on `from` to `to`. Fails when `from` is empty or `to` is taken.
    pub fn move_occupant(&mut self, from: TilePos, to: TilePos) -> bool {
        let target_free = self.tile(to).is_some_and(|t| t.occupant.is_none());
        let source_taken = self.tile(from).is_some_and(|t| t.occupant.is_some());
        if !target_free || !source_taken || from == to {
            return false;
        }
        if let Some(occupant) = self.clear_occupant(from) {
            self.set_occupant(to, occupant);
        }
        true
    }

    pub fn set_blocks_los(&mut self, pos: TilePos, blocks: bool) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.blocks_los = blocks;
        }
    }

    pub fn set_los_blocker(&mut self, pos: TilePos, blocker: Option<LosBlocker>) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.los_blocker = blocker;
        }
    }

    /// Assign a tile to a structure. `entry_point` is tile-local and marks an entrance.
    pub fn set_structure(
        &mut self,
        pos: TilePos,
        structure: Option<StructureId>,
        entry_point: Option<Vec2>,
    ) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.structure = structure;
            tile.entry_point = structure.and(entry_point);
        }
    }

    pub fn set_difficult(&mut self, pos: TilePos, difficult: bool) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.difficult = difficult;
        }
    }

    /// Recompute the cover array of one tile from its neighbours.
    ///
    /// Idempotent: repeated calls without intervening changes store the same array.
    pub fn calculate_surrounding_cover(&mut self, pos: TilePos) {
        let Some(tile) = self.tile(pos) else {
            return;
        };

        let mut cover = [CoverLevel::None; 8];
        if !tile.blocked {
            let threshold = tile.elevation + self.config.elevation_threshold;
            for dir in Direction::ALL {
                let Some(neighbor) = self.neighbor(pos, dir) else {
                    continue;
                };
                cover[dir.index()] = if neighbor.blocked {
                    CoverLevel::Full
                } else if neighbor.elevation >= threshold {
                    CoverLevel::Elevated
                } else if let Some(occupant) = neighbor.occupant {
                    if dir.is_diagonal() {
                        occupant.cover.downgraded()
                    } else {
                        occupant.cover
                    }
                } else {
                    CoverLevel::None
                };
            }

            for dir in Direction::CARDINALS {
                let slot = &mut cover[dir.index()];
                if *slot != CoverLevel::Full && tile.has_half_cover(dir) {
                    *slot = (*slot).max(CoverLevel::Half);
                }
            }
        }

        if let Some(index) = self.index_of(pos) {
            self.tiles[index].cover = cover;
        }
    }

    pub fn recalculate_all_cover(&mut self) {
        for index in 0..self.tiles.len() {
            let pos = self.tiles[index].pos;
            self.calculate_surrounding_cover(pos);
        }
        self.version += 1;
    }

    pub fn mark_visible(&mut self, pos: TilePos, mask: FactionMask) {
        if let Some(index) = self.index_of(pos) {
            let tile = &mut self.tiles[index];
            tile.visibility = tile.visibility.union(mask);
        }
    }

    pub fn clear_visibility(&mut self, mask: FactionMask) {
        for tile in self.tiles.iter_mut() {
            tile.visibility = tile.visibility.without(mask);
        }
    }

    pub fn clear_all_visibility(&mut self) {
        self.clear_visibility(FactionMask::ALL);
    }

    pub fn visible_tiles(&self, faction: FactionId) -> Vec<TilePos> {
        self.tiles
            .iter()
            .filter(|t| t.visibility.contains(faction))
            .map(|t| t.pos)
            .collect()
    }

    fn recalculate_cover_around(&mut self, pos: TilePos) {
        self.calculate_surrounding_cover(pos);
        for dir in Direction::ALL {
            self.calculate_surrounding_cover(dir.step(pos));
        }
    }

    // Layout mutation entry point; bumps the version.
    fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        let index = self.index_of(pos)?;
        self.version += 1;
        Some(&mut self.tiles[index])
    }
}
