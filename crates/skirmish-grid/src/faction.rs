#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of an externally owned entity (unit, structure piece, prop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId(pub u32);

/// Faction index. Valid indices are `0..FactionMask::CAPACITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactionId(pub u8);

/// One bit per faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactionMask(pub u32);

impl FactionMask {
    pub const CAPACITY: u8 = 32;
    pub const EMPTY: FactionMask = FactionMask(0);
    pub const ALL: FactionMask = FactionMask(u32::MAX);

    /// Mask with only `faction`'s bit set. Out-of-range factions yield the empty mask.
    pub fn of(faction: FactionId) -> FactionMask {
        if faction.0 >= Self::CAPACITY {
            return Self::EMPTY;
        }
        FactionMask(1 << faction.0)
    }

    pub fn from_factions(factions: impl IntoIterator<Item = FactionId>) -> FactionMask {
        factions
            .into_iter()
            .fold(Self::EMPTY, |acc, f| acc.union(Self::of(f)))
    }

    pub fn contains(self, faction: FactionId) -> bool {
        let bit = Self::of(faction);
        bit != Self::EMPTY && self.0 & bit.0 != 0
    }

    pub fn intersects(self, other: FactionMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: FactionMask) -> FactionMask {
        FactionMask(self.0 | other.0)
    }

    pub fn without(self, other: FactionMask) -> FactionMask {
        FactionMask(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn factions(self) -> impl Iterator<Item = FactionId> {
        (0..Self::CAPACITY)
            .map(FactionId)
            .filter(move |f| self.contains(*f))
    }
}
