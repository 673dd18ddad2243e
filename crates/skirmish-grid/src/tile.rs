use crate::{Direction, EntityId, FactionId, FactionMask, TilePos, Vec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Protection a tile offers from one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoverLevel {
    #[default]
    None,
    Half,
    Full,
    Elevated,
}

impl CoverLevel {
    /// One step down the ladder; used for cover provided across a diagonal.
    pub fn downgraded(self) -> CoverLevel {
        match self {
            CoverLevel::Elevated => CoverLevel::Full,
            CoverLevel::Full => CoverLevel::Half,
            CoverLevel::Half | CoverLevel::None => CoverLevel::None,
        }
    }
}

/// Terrain surface, indexing a mover's per-surface movement cost table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SurfaceType {
    #[default]
    Ground,
    Road,
    Grass,
    Rough,
    Sand,
    Mud,
    Water,
    Rubble,
}

impl SurfaceType {
    pub const COUNT: usize = 8;

    pub const ALL: [SurfaceType; SurfaceType::COUNT] = [
        SurfaceType::Ground,
        SurfaceType::Road,
        SurfaceType::Grass,
        SurfaceType::Rough,
        SurfaceType::Sand,
        SurfaceType::Mud,
        SurfaceType::Water,
        SurfaceType::Rubble,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Identifier of a multi-tile structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StructureId(pub u32);

/// Snapshot of the entity standing on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Occupant {
    pub id: EntityId,
    pub faction: FactionId,
    /// Other movers may path through this occupant regardless of faction.
    pub passable: bool,
    /// Cover this occupant provides to the tiles around it.
    pub cover: CoverLevel,
}

impl Occupant {
    pub fn new(id: EntityId, faction: FactionId) -> Self {
        Self {
            id,
            faction,
            passable: false,
            cover: CoverLevel::None,
        }
    }

    pub fn with_cover(mut self, cover: CoverLevel) -> Self {
        self.cover = cover;
        self
    }

    pub fn passable(mut self) -> Self {
        self.passable = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BlockerKind {
    Foliage,
    Smoke,
    Prop,
    Structure,
}

/// Partial line-of-sight obstruction with a footprint in tile-local `[0, 1]²` coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LosBlocker {
    pub kind: BlockerKind,
    pub min: Vec2,
    pub max: Vec2,
}

impl LosBlocker {
    /// Blocker occupying the whole tile.
    pub fn full(kind: BlockerKind) -> Self {
        Self {
            kind,
            min: Vec2::ZERO,
            max: Vec2::new(1.0, 1.0),
        }
    }

    pub fn with_footprint(kind: BlockerKind, min: Vec2, max: Vec2) -> Self {
        Self { kind, min, max }
    }

    /// Whether the tile-space segment `a -> b` crosses this blocker when placed on `tile`.
    pub fn overlaps_segment(&self, tile: TilePos, a: Vec2, b: Vec2) -> bool {
        let origin = Vec2::new(tile.x as f32, tile.y as f32);
        segment_hits_aabb(a, b, origin + self.min, origin + self.max)
    }
}

// Slab test; touching the box boundary counts as a hit.
fn segment_hits_aabb(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> bool {
    let d = b - a;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    for (origin, delta, lo, hi) in [(a.x, d.x, min.x, max.x), (a.y, d.y, min.y, max.y)] {
        if delta.abs() <= f32::EPSILON {
            if origin < lo || origin > hi {
                return false;
            }
            continue;
        }
        let inv = 1.0 / delta;
        let (mut near, mut far) = ((lo - origin) * inv, (hi - origin) * inv);
        if near > far {
            core::mem::swap(&mut near, &mut far);
        }
        t0 = t0.max(near);
        t1 = t1.min(far);
        if t0 > t1 {
            return false;
        }
    }
    true
}

/// One cell of the tactical grid.
///
/// Tiles are created with the grid and only mutated through [`crate::Grid`], which keeps
/// cover and the grid version consistent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tile {
    pub(crate) pos: TilePos,
    pub(crate) elevation: f32,
    pub(crate) blocked: bool,
    pub(crate) surface: SurfaceType,
    pub(crate) cover: [CoverLevel; 8],
    pub(crate) half_cover: [bool; 4],
    pub(crate) movement_blocked: [bool; 8],
    pub(crate) occupant: Option<Occupant>,
    pub(crate) blocks_los: bool,
    pub(crate) los_blocker: Option<LosBlocker>,
    pub(crate) structure: Option<StructureId>,
    pub(crate) entry_point: Option<Vec2>,
    pub(crate) difficult: bool,
    pub(crate) visibility: FactionMask,
}

impl Tile {
    pub(crate) fn new(pos: TilePos) -> Self {
        Self {
            pos,
            elevation: 0.0,
            blocked: false,
            surface: SurfaceType::Ground,
            cover: [CoverLevel::None; 8],
            half_cover: [false; 4],
            movement_blocked: [false; 8],
            occupant: None,
            blocks_los: false,
            los_blocker: None,
            structure: None,
            entry_point: None,
            difficult: false,
            visibility: FactionMask::EMPTY,
        }
    }

    pub fn pos(&self) -> TilePos {
        self.pos
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn surface(&self) -> SurfaceType {
        self.surface
    }

    pub fn cover(&self, dir: Direction) -> CoverLevel {
        self.cover[dir.index()]
    }

    pub fn cover_array(&self) -> [CoverLevel; 8] {
        self.cover
    }

    /// Best cover this tile offers from any direction.
    pub fn best_cover(&self) -> CoverLevel {
        self.cover.iter().copied().max().unwrap_or_default()
    }

    pub fn has_half_cover(&self, dir: Direction) -> bool {
        dir.cardinal_index()
            .map(|i| self.half_cover[i])
            .unwrap_or(false)
    }

    /// Whether an edge wall prevents leaving this tile in `dir`.
    pub fn is_movement_blocked(&self, dir: Direction) -> bool {
        self.movement_blocked[dir.index()]
    }

    pub fn occupant(&self) -> Option<&Occupant> {
        self.occupant.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn is_blocking_line_of_sight(&self) -> bool {
        self.blocks_los
    }

    pub fn los_blocker(&self) -> Option<&LosBlocker> {
        self.los_blocker.as_ref()
    }

    pub fn structure(&self) -> Option<StructureId> {
        self.structure
    }

    /// Tile-local structure entry point, if this tile is a structure entrance.
    pub fn entry_point(&self) -> Option<Vec2> {
        self.entry_point
    }

    pub fn is_difficult(&self) -> bool {
        self.difficult
    }

    pub fn visibility(&self) -> FactionMask {
        self.visibility
    }

    pub fn is_visible_to(&self, faction: FactionId) -> bool {
        self.visibility.contains(faction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_downgrade_walks_the_ladder() {
        assert_eq!(CoverLevel::Elevated.downgraded(), CoverLevel::Full);
        assert_eq!(CoverLevel::Full.downgraded(), CoverLevel::Half);
        assert_eq!(CoverLevel::Half.downgraded(), CoverLevel::None);
        assert_eq!(CoverLevel::None.downgraded(), CoverLevel::None);
    }

    #[test]
    fn footprint_overlap_respects_placement() {
        let pillar = LosBlocker::with_footprint(
            BlockerKind::Prop,
            Vec2::new(0.4, 0.4),
            Vec2::new(0.6, 0.6),
        );
        let tile = TilePos::new(2, 0);
        // Horizontal ray through the tile centre.
        assert!(pillar.overlaps_segment(tile, Vec2::new(0.5, 0.5), Vec2::new(4.5, 0.5)));
        // Parallel ray along the tile's lower edge misses the pillar.
        assert!(!pillar.overlaps_segment(tile, Vec2::new(0.5, 0.1), Vec2::new(4.5, 0.1)));
        // Segment stopping short of the tile.
        assert!(!pillar.overlaps_segment(tile, Vec2::new(0.5, 0.5), Vec2::new(1.9, 0.5)));
    }
}
