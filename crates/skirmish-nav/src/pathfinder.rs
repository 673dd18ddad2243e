use core::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use skirmish_grid::{Direction, Grid, Tile, TilePos};
use thiserror::Error;

use crate::walk::step_target;
use crate::{CostStrategy, MoverProfile, TilePath};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Straight and diagonal step weights of the heuristic (14 ≈ 10·√2).
const STRAIGHT_WEIGHT: u32 = 10;
const DIAGONAL_WEIGHT: u32 = 14;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid path request: tile {pos} is outside the grid")]
    InvalidRequest { pos: TilePos },
    #[error("no path to the goal within budget")]
    NoPath,
    #[error("path search cancelled after {expanded} expansions")]
    Cancelled { expanded: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PathfinderConfig {
    /// Multiplier on the heuristic term of `F`.
    pub heuristic_weight: f32,
    /// Process-wide addition to every step.
    pub flat_cost: i32,
    /// Added when entering a tile that belongs to a structure.
    pub structure_surcharge: u32,
    /// Cost per eighth-turn of facing change.
    pub turn_penalty: u32,
    /// Multiplier for difficult tiles, applied to player-controlled movers only.
    pub difficult_multiplier: u32,
    /// Added when entering an occupied (but passable) tile.
    pub occupied_surcharge: u32,
    /// Expansions between cancellation checks.
    pub cancel_check_interval: usize,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            heuristic_weight: 1.0,
            flat_cost: 0,
            structure_surcharge: 5,
            turn_penalty: 1,
            difficult_multiplier: 8,
            occupied_surcharge: 2,
            cancel_check_interval: 64,
        }
    }
}

/// Cooperative cancellation flag, shareable with another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

/// One pathfinding query. Consumed by a single [`Pathfinder::find_path`] call.
#[derive(Debug, Clone, Copy)]
pub struct PathRequest<'a> {
    pub start: TilePos,
    pub goal: TilePos,
    pub mover: &'a MoverProfile,
    /// Facing before the first step; `None` skips the turn penalty on the first step.
    pub initial_direction: Option<Direction>,
    /// Maximum path cost; 0 means unlimited.
    pub ap_budget: u32,
    /// Allow stepping through tiles held by allies.
    pub ignore_allies: bool,
}

impl<'a> PathRequest<'a> {
    pub fn new(start: TilePos, goal: TilePos, mover: &'a MoverProfile) -> Self {
        Self {
            start,
            goal,
            mover,
            initial_direction: None,
            ap_budget: 0,
            ignore_allies: false,
        }
    }

    pub fn facing(mut self, direction: Direction) -> Self {
        self.initial_direction = Some(direction);
        self
    }

    pub fn with_budget(mut self, ap_budget: u32) -> Self {
        self.ap_budget = ap_budget;
        self
    }

    pub fn ignoring_allies(mut self, ignore: bool) -> Self {
        self.ignore_allies = ignore;
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Node {
    generation: u32,
    g: u32,
    parent: Option<usize>,
    arrival: Option<Direction>,
    closed: bool,
}

#[derive(Debug)]
struct OpenNode {
    f: u32,
    tie: u64,
    g: u32,
    index: usize,
}

impl OpenNode {
    fn key(&self) -> (u32, u64) {
        (self.f, self.tie)
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest (f, tie) first.
        other.key().cmp(&self.key())
    }
}

/// Diagonal-distance heuristic in fixed-point tenths.
pub fn heuristic(a: TilePos, b: TilePos) -> u32 {
    let dx = (a.x - b.x).unsigned_abs();
    let dy = (a.y - b.y).unsigned_abs();
    let diagonal = dx.min(dy);
    let straight = dx.abs_diff(dy);
    diagonal * DIAGONAL_WEIGHT + straight * STRAIGHT_WEIGHT
}

/// A* search over a [`Grid`] with a reusable node arena.
///
/// The arena is sized to the grid on first use and reset between searches by bumping a
/// generation stamp, so repeated queries do not reallocate. A `Pathfinder` never mutates the
/// grid; independent searches can run on separate threads with one `Pathfinder` each.
#[derive(Debug, Default)]
pub struct Pathfinder {
    config: PathfinderConfig,
    nodes: Vec<Node>,
    open: BinaryHeap<OpenNode>,
    generation: u32,
    cancel: Option<CancelToken>,
}

impl Pathfinder {
    pub fn new(config: PathfinderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &PathfinderConfig {
        &self.config
    }

    pub fn find_path(
        &mut self,
        grid: &Grid,
        request: &PathRequest<'_>,
        strategy: Option<&dyn CostStrategy>,
    ) -> Result<TilePath, PathError> {
        let start_idx = grid
            .index_of(request.start)
            .ok_or(PathError::InvalidRequest { pos: request.start })?;
        let goal_idx = grid
            .index_of(request.goal)
            .ok_or(PathError::InvalidRequest { pos: request.goal })?;

        if start_idx == goal_idx {
            return Ok(TilePath {
                tiles: vec![request.start],
                cost: 0,
                grid_version: grid.version(),
                expanded: 0,
            });
        }

        if grid.tile(request.goal).map_or(true, Tile::is_blocked) {
            tracing::debug!(goal = %request.goal, "path goal is blocked");
            return Err(PathError::NoPath);
        }

        self.reset(grid.len());
        let mover = request.mover;
        let weight = self.config.heuristic_weight.max(0.0);
        let weighted_h =
            |pos: TilePos| -> u32 { (heuristic(pos, request.goal) as f32 * weight).round() as u32 };

        let mut tie: u64 = 0;
        self.touch(start_idx, 0, None, request.initial_direction);
        self.open.push(OpenNode {
            f: weighted_h(request.start),
            tie,
            g: 0,
            index: start_idx,
        });
        tie += 1;

        let max_expansions = grid.len();
        let mut expanded = 0usize;

        while let Some(open) = self.open.pop() {
            let node = self.nodes[open.index];
            if node.closed || open.g != node.g {
                // Stale heap entry.
                continue;
            }

            if open.index == goal_idx {
                let tiles = self.reconstruct(grid, goal_idx);
                tracing::debug!(
                    start = %request.start,
                    goal = %request.goal,
                    cost = node.g,
                    steps = tiles.len().saturating_sub(1),
                    expanded,
                    "path found"
                );
                return Ok(TilePath {
                    tiles,
                    cost: node.g,
                    grid_version: grid.version(),
                    expanded,
                });
            }

            if let Some(token) = &self.cancel {
                let interval = self.config.cancel_check_interval.max(1);
                if expanded % interval == 0 && token.is_cancelled() {
                    tracing::debug!(expanded, "path search cancelled");
                    return Err(PathError::Cancelled { expanded });
                }
            }

            self.nodes[open.index].closed = true;
            expanded += 1;
            if expanded > max_expansions {
                break;
            }

            let Some(pos) = grid.pos_at_index(open.index) else {
                continue;
            };
            let Some(from) = grid.tile(pos) else {
                continue;
            };

            for dir in Direction::ALL {
                let Some(to) = step_target(grid, mover, from, dir, request.ignore_allies) else {
                    continue;
                };
                let Some(to_idx) = grid.index_of(to.pos()) else {
                    continue;
                };
                let existing = self.current(to_idx);
                if existing.is_some_and(|n| n.closed) {
                    continue;
                }

                let Some(step) = self.step_cost(node.arrival, dir, to, mover, strategy) else {
                    continue;
                };
                let tentative_g = node.g.saturating_add(step);
                if request.ap_budget > 0 && tentative_g > request.ap_budget {
                    tracing::trace!(tile = %to.pos(), tentative_g, "pruned by budget");
                    continue;
                }
                if existing.is_some_and(|n| tentative_g >= n.g) {
                    continue;
                }

                self.touch(to_idx, tentative_g, Some(open.index), Some(dir));
                self.open.push(OpenNode {
                    f: tentative_g.saturating_add(weighted_h(to.pos())),
                    tie,
                    g: tentative_g,
                    index: to_idx,
                });
                tie += 1;
            }
        }

        tracing::debug!(
            start = %request.start,
            goal = %request.goal,
            budget = request.ap_budget,
            expanded,
            "no path"
        );
        Err(PathError::NoPath)
    }

    /// Cost of entering `to` by stepping in `dir`, having arrived facing `previous`.
    ///
    /// `None` when the mover cannot enter the tile's surface at all. The difficult-terrain
    /// multiplier scales the movement part only; turn and occupancy surcharges are added after.
    pub fn step_cost(
        &self,
        previous: Option<Direction>,
        dir: Direction,
        to: &Tile,
        mover: &MoverProfile,
        strategy: Option<&dyn CostStrategy>,
    ) -> Option<u32> {
        let cfg = &self.config;
        let mut base = i64::from(mover.surface_cost(to.surface())?)
            + i64::from(mover.cost_modifier)
            + i64::from(cfg.flat_cost);
        if to.structure().is_some() {
            base += i64::from(cfg.structure_surcharge);
        }

        let mut cost = base.max(0);
        if dir.is_diagonal() {
            cost = cost * 141 / 100;
        }
        if mover.player_controlled && to.is_difficult() {
            cost *= i64::from(cfg.difficult_multiplier);
        }
        if let Some(previous) = previous {
            cost += i64::from(previous.eighth_turns(dir)) * i64::from(cfg.turn_penalty);
        }
        if to.is_occupied() {
            cost += i64::from(cfg.occupied_surcharge);
        }

        let mut cost = u32::try_from(cost).unwrap_or(u32::MAX);
        if let Some(strategy) = strategy {
            cost = strategy.adjust(to, cost);
        }
        Some(cost.max(1))
    }

    fn reset(&mut self, len: usize) {
        self.open.clear();
        if self.nodes.len() != len {
            self.nodes.clear();
            self.nodes.resize(len, Node::default());
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.nodes.fill(Node::default());
            self.generation = 1;
        }
    }

    fn current(&self, index: usize) -> Option<Node> {
        let node = self.nodes[index];
        (node.generation == self.generation).then_some(node)
    }

    fn touch(&mut self, index: usize, g: u32, parent: Option<usize>, arrival: Option<Direction>) {
        self.nodes[index] = Node {
            generation: self.generation,
            g,
            parent,
            arrival,
            closed: false,
        };
    }

    fn reconstruct(&self, grid: &Grid, goal: usize) -> Vec<TilePos> {
        let mut out = Vec::new();
        let mut current = Some(goal);
        while let Some(index) = current {
            if let Some(pos) = grid.pos_at_index(index) {
                out.push(pos);
            }
            current = self.nodes[index].parent;
        }
        out.reverse();
        out
    }
}
