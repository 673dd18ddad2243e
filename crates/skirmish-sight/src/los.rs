use core::ops::{BitOr, BitOrAssign};
use std::collections::HashMap;

use skirmish_grid::{BlockerKind, Grid, LosBlocker, Tile, TilePos};

use crate::SightError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Blocker kinds a sight check looks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LosFlags(u8);

impl LosFlags {
    pub const NONE: LosFlags = LosFlags(0);
    pub const IGNORE_FOLIAGE: LosFlags = LosFlags(1 << 0);
    pub const IGNORE_SMOKE: LosFlags = LosFlags(1 << 1);
    pub const IGNORE_PROPS: LosFlags = LosFlags(1 << 2);
    pub const IGNORE_STRUCTURES: LosFlags = LosFlags(1 << 3);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: LosFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: LosFlags) -> LosFlags {
        LosFlags(self.0 | other.0)
    }

    pub fn ignores(self, kind: BlockerKind) -> bool {
        let flag = match kind {
            BlockerKind::Foliage => Self::IGNORE_FOLIAGE,
            BlockerKind::Smoke => Self::IGNORE_SMOKE,
            BlockerKind::Prop => Self::IGNORE_PROPS,
            BlockerKind::Structure => Self::IGNORE_STRUCTURES,
        };
        self.contains(flag)
    }

    fn blocker<'t>(self, tile: &'t Tile) -> Option<&'t LosBlocker> {
        tile.los_blocker().filter(|b| !self.ignores(b.kind))
    }
}

impl BitOr for LosFlags {
    type Output = LosFlags;

    fn bitor(self, rhs: LosFlags) -> LosFlags {
        self.union(rhs)
    }
}

impl BitOrAssign for LosFlags {
    fn bitor_assign(&mut self, rhs: LosFlags) {
        *self = self.union(rhs);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LosConfig {
    /// Ray step length in tiles.
    pub step: f32,
    /// Step cap; a ray longer than `step * max_steps` tiles is treated as blocked.
    pub max_steps: u32,
}

impl Default for LosConfig {
    fn default() -> Self {
        Self {
            step: 0.25,
            max_steps: 1000,
        }
    }
}

/// Tile-to-tile line of sight along the segment between tile centres.
///
/// Every tile the segment enters is tested, see [`TilePos::line_to`]. The engine only reads the
/// grid. Checks are one-directional; use
/// [`LosEngine::line_of_sight_between`] for the symmetric query units use.
#[derive(Debug, Clone, Copy, Default)]
pub struct LosEngine {
    config: LosConfig,
}

impl LosEngine {
    pub fn new(config: LosConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LosConfig {
        &self.config
    }

    pub fn has_line_of_sight(
        &self,
        grid: &Grid,
        from: TilePos,
        to: TilePos,
        flags: LosFlags,
    ) -> Result<bool, SightError> {
        grid.tile(from)
            .ok_or(SightError::InvalidRequest { pos: from })?;
        let target = grid.tile(to).ok_or(SightError::InvalidRequest { pos: to })?;

        if from == to {
            return Ok(true);
        }

        let target_blocker = flags.blocker(target);
        if target_blocker.is_some() && target.is_occupied() {
            return Ok(false);
        }

        let a = from.center();
        let b = to.center();
        if from.is_adjacent(to) {
            return Ok(!target_blocker.is_some_and(|blk| blk.overlaps_segment(to, a, b)));
        }

        let step = self.config.step;
        if step <= 0.0 || !step.is_finite() {
            tracing::warn!(step, %from, %to, "line of sight step is not positive");
            return Ok(false);
        }
        let steps = (a.distance(b) / step).ceil();
        if steps > self.config.max_steps as f32 {
            tracing::warn!(
                %from,
                %to,
                max_steps = self.config.max_steps,
                "line of sight ray exceeded its step cap"
            );
            return Ok(false);
        }

        let structure = target.structure();
        for pos in from.line_to(to) {
            if pos == to {
                return Ok(true);
            }
            if pos == from {
                continue;
            }
            let Some(tile) = grid.tile(pos) else {
                return Ok(false);
            };
            if structure.is_some() && tile.structure() == structure {
                continue;
            }
            if tile.is_blocking_line_of_sight() {
                return Ok(false);
            }
            if flags
                .blocker(tile)
                .is_some_and(|blk| blk.overlaps_segment(pos, a, b))
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Symmetric sight check between two tiles.
    ///
    /// `see_through` is the looking unit's own capability and is merged into `flags`. The result
    /// is true if the ray succeeds in either direction.
    pub fn line_of_sight_between(
        &self,
        grid: &Grid,
        a: TilePos,
        b: TilePos,
        flags: LosFlags,
        see_through: LosFlags,
    ) -> Result<bool, SightError> {
        let flags = flags | see_through;
        Ok(self.has_line_of_sight(grid, a, b, flags)? || self.has_line_of_sight(grid, b, a, flags)?)
    }

    /// Evaluate many symmetric checks; results are in input order.
    pub fn batch(
        &self,
        grid: &Grid,
        pairs: &[(TilePos, TilePos)],
        flags: LosFlags,
    ) -> Result<Vec<bool>, SightError> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            pairs
                .par_iter()
                .map(|&(a, b)| self.line_of_sight_between(grid, a, b, flags, LosFlags::NONE))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            pairs
                .iter()
                .map(|&(a, b)| self.line_of_sight_between(grid, a, b, flags, LosFlags::NONE))
                .collect()
        }
    }
}

/// Memo of symmetric sight results for one visibility pass.
///
/// Keys are unordered tile pairs plus flags. The cache empties itself when it is used with a
/// grid whose version differs from the one it was filled against.
#[derive(Debug, Clone, Default)]
pub struct LosCache {
    entries: HashMap<(TilePos, TilePos, LosFlags), bool>,
    grid_version: Option<u64>,
    hits: u64,
    misses: u64,
}

impl LosCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_of_sight(
        &mut self,
        engine: &LosEngine,
        grid: &Grid,
        a: TilePos,
        b: TilePos,
        flags: LosFlags,
    ) -> Result<bool, SightError> {
        if self.grid_version != Some(grid.version()) {
            self.entries.clear();
            self.grid_version = Some(grid.version());
        }

        let key = if a <= b { (a, b, flags) } else { (b, a, flags) };
        if let Some(&seen) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(seen);
        }
        self.misses += 1;
        let seen = engine.line_of_sight_between(grid, a, b, flags, LosFlags::NONE)?;
        self.entries.insert(key, seen);
        Ok(seen)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.grid_version = None;
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_blocker_kinds() {
        let flags = LosFlags::IGNORE_FOLIAGE | LosFlags::IGNORE_PROPS;
        assert!(flags.ignores(BlockerKind::Foliage));
        assert!(flags.ignores(BlockerKind::Prop));
        assert!(!flags.ignores(BlockerKind::Smoke));
        assert!(!flags.ignores(BlockerKind::Structure));
        assert!(flags.contains(LosFlags::IGNORE_FOLIAGE));
        assert!(flags.contains(LosFlags::NONE));
        assert_eq!(flags.bits(), 0b101);
    }
}
