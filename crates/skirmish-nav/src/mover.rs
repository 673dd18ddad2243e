use skirmish_grid::{FactionId, FactionMask, SurfaceType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Movement stats of one mover, as supplied by the external stats system.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MoverProfile {
    pub faction: FactionId,
    /// Base cost of entering each surface, indexed by [`SurfaceType::index`].
    /// `None` marks a surface the mover cannot enter at all.
    pub surface_costs: [Option<u32>; SurfaceType::COUNT],
    /// Flat per-step modifier from the mover's template (may be negative).
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost_modifier: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub player_controlled: bool,
    /// Allied occupants never block this mover.
    #[cfg_attr(feature = "serde", serde(default))]
    pub walk_through_allies: bool,
    /// Factions (besides its own) this mover treats as allies.
    #[cfg_attr(feature = "serde", serde(default))]
    pub allies: FactionMask,
}

impl MoverProfile {
    /// Every surface costs `cost`.
    pub fn uniform(faction: FactionId, cost: u32) -> Self {
        Self {
            faction,
            surface_costs: [Some(cost); SurfaceType::COUNT],
            cost_modifier: 0,
            player_controlled: false,
            walk_through_allies: false,
            allies: FactionMask::EMPTY,
        }
    }

    /// Infantry-style table: roads are cheap, mud and rubble are slow, water is impassable.
    pub fn infantry(faction: FactionId) -> Self {
        let mut profile = Self::uniform(faction, 10);
        profile.surface_costs[SurfaceType::Road.index()] = Some(8);
        profile.surface_costs[SurfaceType::Rough.index()] = Some(14);
        profile.surface_costs[SurfaceType::Sand.index()] = Some(12);
        profile.surface_costs[SurfaceType::Mud.index()] = Some(16);
        profile.surface_costs[SurfaceType::Rubble.index()] = Some(15);
        profile.surface_costs[SurfaceType::Water.index()] = None;
        profile
    }

    pub fn with_surface_cost(mut self, surface: SurfaceType, cost: Option<u32>) -> Self {
        self.surface_costs[surface.index()] = cost;
        self
    }

    pub fn with_cost_modifier(mut self, modifier: i32) -> Self {
        self.cost_modifier = modifier;
        self
    }

    pub fn player_controlled(mut self, player_controlled: bool) -> Self {
        self.player_controlled = player_controlled;
        self
    }

    pub fn walking_through_allies(mut self, enabled: bool) -> Self {
        self.walk_through_allies = enabled;
        self
    }

    pub fn with_allies(mut self, allies: FactionMask) -> Self {
        self.allies = allies;
        self
    }

    pub fn surface_cost(&self, surface: SurfaceType) -> Option<u32> {
        self.surface_costs[surface.index()]
    }

    pub fn is_ally(&self, faction: FactionId) -> bool {
        faction == self.faction || self.allies.contains(faction)
    }
}
