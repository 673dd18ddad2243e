use std::collections::HashMap;

use skirmish_grid::{CoverLevel, Direction, EntityId, FactionId, FactionMask, Grid, TilePos};

use crate::{LosCache, LosEngine, LosFlags, SightError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Base value scaled by a multiplier, as reported by the stats system.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stat {
    pub base: f32,
    pub multiplier: f32,
}

impl Stat {
    pub fn new(base: f32) -> Self {
        Self {
            base,
            multiplier: 1.0,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// `floor(base × max(0, multiplier))`, never negative.
    pub fn value(&self) -> u32 {
        let v = (self.base * self.multiplier.max(0.0)).floor();
        if v.is_finite() && v > 0.0 {
            v as u32
        } else {
            0
        }
    }
}

/// A unit looking at the map.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observer {
    pub entity: EntityId,
    pub pos: TilePos,
    pub faction: FactionId,
    /// Vision range in tiles.
    pub vision: Stat,
    /// Offsets target concealment.
    pub detection: Stat,
    /// Blocker kinds this unit sees through.
    pub see_through: LosFlags,
}

impl Observer {
    pub fn new(entity: EntityId, pos: TilePos, faction: FactionId, vision: f32) -> Self {
        Self {
            entity,
            pos,
            faction,
            vision: Stat::new(vision),
            detection: Stat::new(0.0),
            see_through: LosFlags::NONE,
        }
    }

    pub fn with_vision(mut self, vision: Stat) -> Self {
        self.vision = vision;
        self
    }

    pub fn with_detection(mut self, detection: Stat) -> Self {
        self.detection = detection;
        self
    }

    pub fn with_see_through(mut self, flags: LosFlags) -> Self {
        self.see_through = flags;
        self
    }
}

/// Concealment rating of an entity, supplied by the stats system.
pub trait ConcealmentProvider {
    fn concealment(&self, entity: EntityId) -> i32;
}

impl<F> ConcealmentProvider for F
where
    F: Fn(EntityId) -> i32,
{
    fn concealment(&self, entity: EntityId) -> i32 {
        self(entity)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoConcealment;

impl ConcealmentProvider for NoConcealment {
    fn concealment(&self, _entity: EntityId) -> i32 {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VisibilityConfig {
    pub half_cover_concealment: i32,
    pub full_cover_concealment: i32,
    pub elevated_cover_concealment: i32,
    /// Fog of war at construction.
    pub fog_of_war: bool,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            half_cover_concealment: 1,
            full_cover_concealment: 2,
            elevated_cover_concealment: 1,
            fog_of_war: true,
        }
    }
}

impl VisibilityConfig {
    pub fn cover_concealment(&self, cover: CoverLevel) -> i32 {
        match cover {
            CoverLevel::None => 0,
            CoverLevel::Half => self.half_cover_concealment,
            CoverLevel::Full => self.full_cover_concealment,
            CoverLevel::Elevated => self.elevated_cover_concealment,
        }
    }
}

/// Shared-vision groups. Every faction in a group sees what any member sees.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactionGroups {
    groups: Vec<FactionMask>,
}

impl FactionGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, members: impl IntoIterator<Item = FactionId>) -> Self {
        self.add_group(members);
        self
    }

    pub fn add_group(&mut self, members: impl IntoIterator<Item = FactionId>) {
        let mask = FactionMask::from_factions(members);
        if !mask.is_empty() {
            self.groups.push(mask);
        }
    }

    /// Bits written when `faction` sees a tile.
    pub fn write_mask(&self, faction: FactionId) -> FactionMask {
        self.groups
            .iter()
            .filter(|g| g.contains(faction))
            .fold(FactionMask::of(faction), |acc, g| acc.union(*g))
    }
}

/// Per-faction visibility bits on the grid plus entity detection state.
#[derive(Debug, Clone)]
pub struct VisibilityManager {
    config: VisibilityConfig,
    los: LosEngine,
    groups: FactionGroups,
    fog_of_war: bool,
    active: FactionMask,
    detected: HashMap<EntityId, FactionMask>,
    cache: LosCache,
}

impl Default for VisibilityManager {
    fn default() -> Self {
        Self::new(VisibilityConfig::default())
    }
}

impl VisibilityManager {
    pub fn new(config: VisibilityConfig) -> Self {
        Self {
            fog_of_war: config.fog_of_war,
            config,
            los: LosEngine::default(),
            groups: FactionGroups::default(),
            active: FactionMask::EMPTY,
            detected: HashMap::new(),
            cache: LosCache::new(),
        }
    }

    pub fn with_los(mut self, los: LosEngine) -> Self {
        self.los = los;
        self
    }

    pub fn with_groups(mut self, groups: FactionGroups) -> Self {
        self.groups = groups;
        self
    }

    pub fn config(&self) -> &VisibilityConfig {
        &self.config
    }

    pub fn groups(&self) -> &FactionGroups {
        &self.groups
    }

    pub fn fog_of_war(&self) -> bool {
        self.fog_of_war
    }

    /// Factions that have recomputed at least once since the last reset.
    pub fn active_factions(&self) -> FactionMask {
        self.active
    }

    pub fn is_detected(&self, entity: EntityId, faction: FactionId) -> bool {
        self.detected
            .get(&entity)
            .is_some_and(|mask| mask.contains(faction))
    }

    /// Entities `faction` currently detects, in id order.
    pub fn detected_entities(&self, faction: FactionId) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self
            .detected
            .iter()
            .filter(|(_, mask)| mask.contains(faction))
            .map(|(id, _)| *id)
            .collect();
        out.sort();
        out
    }

    /// Mark what `observer` sees and detects. Bits are only added; callers clear first.
    ///
    /// Returns the number of tiles marked.
    pub fn recompute_visibility(
        &mut self,
        grid: &mut Grid,
        observer: &Observer,
        concealment: &dyn ConcealmentProvider,
    ) -> Result<usize, SightError> {
        if !grid.in_bounds(observer.pos) {
            return Err(SightError::InvalidRequest { pos: observer.pos });
        }
        let mask = self.groups.write_mask(observer.faction);
        self.active = self.active.union(mask);

        if !self.fog_of_war {
            return Ok(self.reveal_all(grid, mask, observer.entity));
        }

        let range = observer.vision.value().min(i32::MAX as u32) as i32;
        let detection = observer.detection.value().min(i32::MAX as u32) as i32;
        let min_x = observer.pos.x.saturating_sub(range).max(0);
        let min_y = observer.pos.y.saturating_sub(range).max(0);
        let max_x = observer.pos.x.saturating_add(range).min(grid.width() as i32 - 1);
        let max_y = observer.pos.y.saturating_add(range).min(grid.height() as i32 - 1);

        let mut seen = Vec::new();
        let mut spotted = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let pos = TilePos::new(x, y);
                let distance = observer.pos.chebyshev(pos) as i32;
                if distance > range {
                    continue;
                }
                let visible = pos == observer.pos
                    || self.cache.line_of_sight(
                        &self.los,
                        grid,
                        observer.pos,
                        pos,
                        observer.see_through,
                    )?;
                if !visible {
                    continue;
                }
                seen.push(pos);

                let Some(tile) = grid.tile(pos) else {
                    continue;
                };
                let Some(occupant) = tile.occupant() else {
                    continue;
                };
                if occupant.id == observer.entity {
                    continue;
                }
                let cover = Direction::toward(pos, observer.pos)
                    .map_or(CoverLevel::None, |dir| tile.cover(dir));
                let penalty = concealment
                    .concealment(occupant.id)
                    .saturating_add(self.config.cover_concealment(cover))
                    .saturating_sub(detection)
                    .max(0);
                if distance <= range.saturating_sub(penalty) {
                    spotted.push(occupant.id);
                }
            }
        }

        for pos in &seen {
            grid.mark_visible(*pos, mask);
        }
        for id in &spotted {
            let entry = self.detected.entry(*id).or_insert(FactionMask::EMPTY);
            *entry = entry.union(mask);
        }

        tracing::debug!(
            entity = observer.entity.0,
            faction = observer.faction.0,
            range,
            tiles = seen.len(),
            detected = spotted.len(),
            "recomputed observer visibility"
        );
        Ok(seen.len())
    }

    /// Drop every visibility bit and detection of `faction`.
    pub fn clear_faction(&mut self, grid: &mut Grid, faction: FactionId) {
        self.clear_mask(grid, FactionMask::of(faction));
    }

    /// Mission-wide reset.
    pub fn reset(&mut self, grid: &mut Grid) {
        grid.clear_all_visibility();
        self.detected.clear();
        self.active = FactionMask::EMPTY;
        self.cache.clear();
    }

    /// Clear `faction`'s shared-vision bits, then recompute every observer that writes them.
    pub fn recompute_faction(
        &mut self,
        grid: &mut Grid,
        faction: FactionId,
        observers: &[Observer],
        concealment: &dyn ConcealmentProvider,
    ) -> Result<(), SightError> {
        let mask = self.groups.write_mask(faction);
        self.clear_mask(grid, mask);
        for observer in observers {
            if self.groups.write_mask(observer.faction).intersects(mask) {
                self.recompute_visibility(grid, observer, concealment)?;
            }
        }
        Ok(())
    }

    /// Clear everything, then recompute every observer.
    pub fn recompute_all(
        &mut self,
        grid: &mut Grid,
        observers: &[Observer],
        concealment: &dyn ConcealmentProvider,
    ) -> Result<(), SightError> {
        grid.clear_all_visibility();
        self.detected.clear();
        for observer in observers {
            self.recompute_visibility(grid, observer, concealment)?;
        }
        tracing::debug!(
            observers = observers.len(),
            fog_of_war = self.fog_of_war,
            cache_hits = self.cache.hits(),
            cache_misses = self.cache.misses(),
            "recomputed all visibility"
        );
        Ok(())
    }

    /// Toggle fog of war. A change triggers a full recompute.
    pub fn set_fog_of_war(
        &mut self,
        grid: &mut Grid,
        enabled: bool,
        observers: &[Observer],
        concealment: &dyn ConcealmentProvider,
    ) -> Result<(), SightError> {
        if self.fog_of_war == enabled {
            return Ok(());
        }
        self.fog_of_war = enabled;
        tracing::debug!(enabled, "fog of war toggled");
        self.recompute_all(grid, observers, concealment)
    }

    fn reveal_all(&mut self, grid: &mut Grid, mask: FactionMask, observer: EntityId) -> usize {
        let positions: Vec<TilePos> = grid.tiles().map(|t| t.pos()).collect();
        let occupants: Vec<EntityId> = grid
            .tiles()
            .filter_map(|t| t.occupant().map(|o| o.id))
            .filter(|&id| id != observer)
            .collect();
        for pos in &positions {
            grid.mark_visible(*pos, mask);
        }
        for id in occupants {
            let entry = self.detected.entry(id).or_insert(FactionMask::EMPTY);
            *entry = entry.union(mask);
        }
        positions.len()
    }

    fn clear_mask(&mut self, grid: &mut Grid, mask: FactionMask) {
        grid.clear_visibility(mask);
        self.detected.retain(|_, seen| {
            *seen = seen.without(mask);
            !seen.is_empty()
        });
    }
}
