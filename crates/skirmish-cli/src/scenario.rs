//! YAML scenario files: a map, the units on it, and the queries to run.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use skirmish::grid::{BlockerKind, EntityId, FactionId, Grid, GridConfig, Occupant, TilePos};
use skirmish::nav::{MoverProfile, PathfinderConfig, PostProcessor};
use skirmish::sight::{
    FactionGroups, LosConfig, LosFlags, Observer, Stat, VisibilityConfig,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: Option<String>,

    /// Ascii layout, top row first.
    pub map: String,

    pub grid: GridConfig,

    pub pathfinder: PathfinderConfig,

    /// Post-processing passes; the standard pipeline when absent.
    pub post_process: Option<PostProcessor>,

    pub los: LosConfig,

    pub visibility: VisibilityConfig,

    /// Groups of factions that share vision.
    pub shared_vision: Vec<Vec<FactionId>>,

    pub units: Vec<Unit>,

    /// Path queries run by `skirmish path` without explicit endpoints.
    pub paths: Vec<PathQuery>,

    /// Sight queries run by `skirmish los` without explicit endpoints.
    pub sight: Vec<SightQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: EntityId,
    pub faction: FactionId,
    pub pos: TilePos,

    #[serde(default = "default_vision")]
    pub vision: f32,

    #[serde(default)]
    pub detection: f32,

    #[serde(default)]
    pub concealment: i32,

    #[serde(default)]
    pub see_through: Vec<BlockerKind>,

    #[serde(default)]
    pub movement: Movement,

    #[serde(default)]
    pub player_controlled: bool,

    /// Units that can be walked through by allies.
    #[serde(default)]
    pub passable: bool,
}

fn default_vision() -> f32 {
    8.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    #[default]
    Infantry,
    Uniform { cost: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathQuery {
    pub unit: EntityId,
    pub to: TilePos,

    #[serde(default)]
    pub budget: u32,

    #[serde(default)]
    pub ignore_allies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SightQuery {
    pub from: TilePos,
    pub to: TilePos,

    #[serde(default)]
    pub see_through: Vec<BlockerKind>,
}

impl Scenario {
    /// Load a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario from {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse scenario from {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if self.map.trim().is_empty() {
            bail!("scenario has no map");
        }
        let mut seen = HashMap::new();
        for unit in &self.units {
            if let Some(other) = seen.insert(unit.id, unit.pos) {
                bail!("unit {} is listed twice (at {} and {})", unit.id.0, other, unit.pos);
            }
        }
        for query in &self.paths {
            if self.unit(query.unit).is_none() {
                bail!("path query references unknown unit {}", query.unit.0);
            }
        }
        Ok(())
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Parse the map and place every unit on it.
    pub fn build_grid(&self) -> Result<Grid> {
        let mut grid = Grid::from_ascii(&self.map, self.grid).context("Invalid scenario map")?;
        for unit in &self.units {
            let Some(tile) = grid.tile(unit.pos) else {
                bail!("unit {} is placed off the map at {}", unit.id.0, unit.pos);
            };
            if tile.is_blocked() {
                bail!("unit {} is placed on a blocked tile at {}", unit.id.0, unit.pos);
            }
            if tile.is_occupied() {
                bail!("unit {} shares tile {} with another unit", unit.id.0, unit.pos);
            }
            let mut occupant = Occupant::new(unit.id, unit.faction);
            if unit.passable {
                occupant = occupant.passable();
            }
            grid.set_occupant(unit.pos, occupant);
        }
        tracing::debug!(
            width = grid.width(),
            height = grid.height(),
            units = self.units.len(),
            "scenario grid built"
        );
        Ok(grid)
    }

    pub fn post_processor(&self) -> PostProcessor {
        self.post_process
            .clone()
            .unwrap_or_else(PostProcessor::standard)
    }

    pub fn groups(&self) -> FactionGroups {
        self.shared_vision
            .iter()
            .fold(FactionGroups::new(), |groups, members| {
                groups.with_group(members.iter().copied())
            })
    }

    pub fn observers(&self) -> Vec<Observer> {
        self.units.iter().map(Unit::observer).collect()
    }

    pub fn concealment(&self) -> HashMap<EntityId, i32> {
        self.units.iter().map(|u| (u.id, u.concealment)).collect()
    }

    /// Factions present in the scenario, in ascending order.
    pub fn factions(&self) -> Vec<FactionId> {
        let mut factions: Vec<FactionId> = self.units.iter().map(|u| u.faction).collect();
        factions.sort();
        factions.dedup();
        factions
    }
}

impl Unit {
    pub fn mover(&self) -> MoverProfile {
        let profile = match self.movement {
            Movement::Infantry => MoverProfile::infantry(self.faction),
            Movement::Uniform { cost } => MoverProfile::uniform(self.faction, cost),
        };
        profile.player_controlled(self.player_controlled)
    }

    pub fn observer(&self) -> Observer {
        Observer::new(self.id, self.pos, self.faction, self.vision)
            .with_detection(Stat::new(self.detection))
            .with_see_through(see_through(&self.see_through))
    }
}

pub fn see_through(kinds: &[BlockerKind]) -> LosFlags {
    kinds.iter().fold(LosFlags::NONE, |flags, kind| {
        flags
            | match kind {
                BlockerKind::Foliage => LosFlags::IGNORE_FOLIAGE,
                BlockerKind::Smoke => LosFlags::IGNORE_SMOKE,
                BlockerKind::Prop => LosFlags::IGNORE_PROPS,
                BlockerKind::Structure => LosFlags::IGNORE_STRUCTURES,
            }
    })
}
