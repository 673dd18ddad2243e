//! Skirmish CLI - run path and sight queries against a scenario file.
//!
//! - `skirmish path` - A* search plus post-processing for a unit
//! - `skirmish los` - symmetric line-of-sight checks
//! - `skirmish vis` - visibility pass with an ascii fog map

mod scenario;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use skirmish::grid::{EntityId, FactionId, Grid, TilePos, Vec2};
use skirmish::nav::{PathRequest, Pathfinder};
use skirmish::sight::{LosEngine, LosFlags, VisibilityManager};

use crate::scenario::{see_through, PathQuery, Scenario, SightQuery};

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(about = "Tactical grid pathfinding and visibility", version)]
struct Cli {
    /// Scenario file (YAML)
    #[arg(short, long, global = true, default_value = "scenario.yaml")]
    scenario: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find paths for units
    Path {
        /// Unit to move; runs the scenario's path queries when omitted
        #[arg(long, requires = "to")]
        unit: Option<u32>,

        /// Destination tile as `x,y`
        #[arg(long, value_parser = parse_tile)]
        to: Option<TilePos>,

        /// Action point budget, 0 for unlimited
        #[arg(long, default_value_t = 0)]
        budget: u32,

        /// Walk through allied units
        #[arg(long)]
        ignore_allies: bool,
    },

    /// Check line of sight between tiles
    Los {
        /// Viewer tile as `x,y`; runs the scenario's sight queries when omitted
        #[arg(long, value_parser = parse_tile, requires = "to")]
        from: Option<TilePos>,

        #[arg(long, value_parser = parse_tile)]
        to: Option<TilePos>,
    },

    /// Recompute visibility and draw the fog map
    Vis {
        /// Faction whose view to draw
        #[arg(long, default_value_t = 0)]
        faction: u8,

        /// Reveal the whole map
        #[arg(long)]
        no_fog: bool,
    },
}

fn parse_tile(s: &str) -> Result<TilePos, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in `{s}`: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in `{s}`: {e}"))?;
    Ok(TilePos::new(x, y))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let scenario = Scenario::load(&cli.scenario)?;
    tracing::info!(
        scenario = scenario.name.as_deref().unwrap_or("unnamed"),
        units = scenario.units.len(),
        "Loaded scenario"
    );
    let mut grid = scenario.build_grid()?;

    match cli.command {
        Commands::Path {
            unit,
            to,
            budget,
            ignore_allies,
        } => {
            let queries = match (unit, to) {
                (Some(unit), Some(to)) => vec![PathQuery {
                    unit: EntityId(unit),
                    to,
                    budget,
                    ignore_allies,
                }],
                _ => scenario.paths.clone(),
            };
            run_paths(&scenario, &grid, &queries, cli.json)
        }
        Commands::Los { from, to } => {
            let queries = match (from, to) {
                (Some(from), Some(to)) => vec![SightQuery {
                    from,
                    to,
                    see_through: Vec::new(),
                }],
                _ => scenario.sight.clone(),
            };
            run_sight(&scenario, &grid, &queries, cli.json)
        }
        Commands::Vis { faction, no_fog } => {
            run_visibility(&scenario, &mut grid, FactionId(faction), no_fog, cli.json)
        }
    }
}

#[derive(Serialize)]
struct PathReport {
    unit: EntityId,
    from: TilePos,
    to: TilePos,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<u32>,
    tiles: Vec<TilePos>,
    waypoints: Vec<Vec2>,
    expanded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn run_paths(scenario: &Scenario, grid: &Grid, queries: &[PathQuery], json: bool) -> Result<()> {
    if queries.is_empty() {
        bail!("no path queries; pass --unit and --to or add `paths` to the scenario");
    }

    let mut pathfinder = Pathfinder::new(scenario.pathfinder);
    let post = scenario.post_processor();
    let mut reports = Vec::with_capacity(queries.len());

    for query in queries {
        let unit = scenario
            .unit(query.unit)
            .with_context(|| format!("Unknown unit {}", query.unit.0))?;
        let mover = unit.mover();
        let request = PathRequest::new(unit.pos, query.to, &mover)
            .with_budget(query.budget)
            .ignoring_allies(query.ignore_allies);

        let report = match pathfinder.find_path(grid, &request, None) {
            Ok(path) => {
                let waypoints = post.run(grid, &mover, path.waypoints(grid)).points();
                tracing::debug!(
                    unit = unit.id.0,
                    cost = path.cost,
                    steps = path.steps(),
                    waypoints = waypoints.len(),
                    "Path found"
                );
                PathReport {
                    unit: unit.id,
                    from: unit.pos,
                    to: query.to,
                    cost: Some(path.cost),
                    expanded: path.expanded,
                    tiles: path.tiles,
                    waypoints,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(unit = unit.id.0, to = %query.to, error = %e, "Path query failed");
                PathReport {
                    unit: unit.id,
                    from: unit.pos,
                    to: query.to,
                    cost: None,
                    tiles: Vec::new(),
                    waypoints: Vec::new(),
                    expanded: 0,
                    error: Some(e.to_string()),
                }
            }
        };
        reports.push(report);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        print!("unit {} {} -> {}: ", report.unit.0, report.from, report.to);
        match (&report.error, report.cost) {
            (Some(error), _) => println!("{error}"),
            (None, Some(cost)) => {
                println!("cost {cost}, {} tiles, {} expanded", report.tiles.len(), report.expanded);
                let route: Vec<String> = report.tiles.iter().map(ToString::to_string).collect();
                println!("  tiles: {}", route.join(" "));
                let points: Vec<String> = report
                    .waypoints
                    .iter()
                    .map(|p| format!("({:.1}, {:.1})", p.x, p.y))
                    .collect();
                println!("  waypoints: {}", points.join(" "));
            }
            (None, None) => println!("no result"),
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct SightReport {
    from: TilePos,
    to: TilePos,
    see_through: LosFlags,
    visible: bool,
}

fn run_sight(scenario: &Scenario, grid: &Grid, queries: &[SightQuery], json: bool) -> Result<()> {
    if queries.is_empty() {
        bail!("no sight queries; pass --from and --to or add `sight` to the scenario");
    }

    let engine = LosEngine::new(scenario.los);
    let reports = queries
        .iter()
        .map(|q| {
            let flags = see_through(&q.see_through);
            let visible = engine
                .line_of_sight_between(grid, q.from, q.to, LosFlags::NONE, flags)
                .with_context(|| format!("Sight query {} -> {}", q.from, q.to))?;
            Ok(SightReport {
                from: q.from,
                to: q.to,
                see_through: flags,
                visible,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for r in &reports {
            let seen = if r.visible { "visible" } else { "blocked" };
            println!("{} <-> {} [see-through {:#06b}]: {seen}", r.from, r.to, r.see_through.bits());
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct VisibilityReport {
    faction: FactionId,
    visible_tiles: usize,
    detected: Vec<EntityId>,
}

fn run_visibility(
    scenario: &Scenario,
    grid: &mut Grid,
    faction: FactionId,
    no_fog: bool,
    json: bool,
) -> Result<()> {
    let mut vis = VisibilityManager::new(scenario.visibility)
        .with_los(LosEngine::new(scenario.los))
        .with_groups(scenario.groups());
    if !scenario.factions().contains(&faction) {
        tracing::warn!(faction = faction.0, "Faction has no units in this scenario");
    }
    let observers = scenario.observers();
    let concealment = scenario.concealment();
    let rating = |id: EntityId| concealment.get(&id).copied().unwrap_or(0);

    if no_fog {
        vis.set_fog_of_war(grid, false, &observers, &rating)?;
    } else {
        vis.recompute_all(grid, &observers, &rating)?;
    }

    let report = VisibilityReport {
        faction,
        visible_tiles: grid.visible_tiles(faction).len(),
        detected: vis.detected_entities(faction),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", render_fog(grid, faction));
    println!(
        "faction {}: {} tiles visible, detected {:?}",
        faction.0,
        report.visible_tiles,
        report.detected.iter().map(|e| e.0).collect::<Vec<_>>()
    );
    Ok(())
}

/// Ascii view of one faction's fog, top row first.
///
/// Walls draw as `#`, unseen tiles as a space, seen units as `@` (own side) or `!` (others).
fn render_fog(grid: &Grid, faction: FactionId) -> String {
    let mut out = String::new();
    for y in (0..grid.height() as i32).rev() {
        for x in 0..grid.width() as i32 {
            let Some(tile) = grid.tile(TilePos::new(x, y)) else {
                continue;
            };
            let glyph = if tile.is_blocked() {
                '#'
            } else if !tile.is_visible_to(faction) {
                ' '
            } else {
                match tile.occupant() {
                    Some(o) if o.faction == faction => '@',
                    Some(_) => '!',
                    None => '.',
                }
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}
