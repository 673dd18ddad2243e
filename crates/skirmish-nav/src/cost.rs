use skirmish_grid::{Grid, Tile, TilePos};

/// Per-step cost hook for the AI decision layer.
///
/// The pathfinder calls this after the built-in cost model; the result is clamped to at least 1
/// so strategies that subtract bonuses cannot produce free or negative steps.
pub trait CostStrategy {
    fn adjust(&self, tile: &Tile, cost: u32) -> u32;
}

impl<F> CostStrategy for F
where
    F: Fn(&Tile, u32) -> u32,
{
    fn adjust(&self, tile: &Tile, cost: u32) -> u32 {
        self(tile, cost)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdjustment;

impl CostStrategy for NoAdjustment {
    fn adjust(&self, _tile: &Tile, cost: u32) -> u32 {
        cost
    }
}

/// Externally evaluated per-tile AI data: a safety score and a hidden-from-opponents flag.
///
/// Safe and hidden tiles get cheaper, pulling AI movers along covered routes.
#[derive(Debug, Clone)]
pub struct TileScores {
    width: i32,
    height: i32,
    safety: Vec<f32>,
    hidden: Vec<bool>,
    pub safety_weight: f32,
    pub hidden_bonus: u32,
}

impl TileScores {
    pub fn new(grid: &Grid) -> Self {
        Self {
            width: grid.width() as i32,
            height: grid.height() as i32,
            safety: vec![0.0; grid.len()],
            hidden: vec![false; grid.len()],
            safety_weight: 1.0,
            hidden_bonus: 4,
        }
    }

    pub fn with_weights(mut self, safety_weight: f32, hidden_bonus: u32) -> Self {
        self.safety_weight = safety_weight;
        self.hidden_bonus = hidden_bonus;
        self
    }

    pub fn set_safety(&mut self, pos: TilePos, score: f32) {
        if let Some(i) = self.index(pos) {
            self.safety[i] = score;
        }
    }

    pub fn set_hidden(&mut self, pos: TilePos, hidden: bool) {
        if let Some(i) = self.index(pos) {
            self.hidden[i] = hidden;
        }
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some((pos.y * self.width + pos.x) as usize)
    }
}

impl CostStrategy for TileScores {
    fn adjust(&self, tile: &Tile, cost: u32) -> u32 {
        let Some(i) = self.index(tile.pos()) else {
            return cost;
        };
        let safety = (self.safety[i] * self.safety_weight).round().max(0.0) as u32;
        let hidden = if self.hidden[i] { self.hidden_bonus } else { 0 };
        cost.saturating_sub(safety).saturating_sub(hidden)
    }
}
