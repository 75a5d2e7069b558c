use std::convert::Infallible;
use std::path::{Path, PathBuf};

use anyhow::Context;
use cellspace_common::{CategoryMask, ObjectKind, ZoneId};
use cellspace_grid::{BucketStore, GridConfig, GridLayout, within_radius};
use cellspace_kernel::Map;
use cellspace_weather::{Season, WeatherRegistry, WeatherTable};
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec2;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellspace-cli", about = "CLI tool for cellspace operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Grid layout file (YAML); the default layout is used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the grid layout
    Info,
    /// Show the bucket a position falls into
    Locate {
        #[arg(allow_negative_numbers = true)]
        x: f32,
        #[arg(allow_negative_numbers = true)]
        y: f32,
    },
    /// Populate a map and run one radius query
    Query {
        #[arg(allow_negative_numbers = true)]
        x: f32,
        #[arg(allow_negative_numbers = true)]
        y: f32,
        /// Query radius in world units
        #[arg(short, long, default_value = "50")]
        radius: f32,
        /// Objects to spawn on a lattice around the query centre
        #[arg(short, long, default_value = "1000")]
        objects: usize,
        /// Lattice spacing in world units
        #[arg(short, long, default_value = "8")]
        spacing: f32,
        /// Which containers to sweep
        #[arg(long, value_enum, default_value_t = Sweep::All)]
        sweep: Sweep,
        /// Print the map event log as JSON lines
        #[arg(long)]
        events: bool,
    },
    /// Simulate zone weather from a weather table
    Weather {
        /// Weather table (YAML)
        table: PathBuf,
        /// Zones that have players in them
        #[arg(short, long, value_delimiter = ',')]
        occupied: Vec<u32>,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "20")]
        ticks: u32,
        /// Milliseconds per tick
        #[arg(long, default_value = "60000")]
        tick_ms: u32,
        /// Day of the year, selects the season
        #[arg(long, default_value = "100")]
        day: u32,
        /// RNG seed for deterministic weather
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Sweep {
    Grid,
    World,
    All,
}

impl Sweep {
    fn categories(self) -> CategoryMask {
        match self {
            Self::Grid => CategoryMask::GRID,
            Self::World => CategoryMask::WORLD,
            Self::All => CategoryMask::all(),
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GridConfig> {
    let Some(path) = path else {
        return Ok(GridConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading grid config {}", path.display()))?;
    let config: GridConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing grid config {}", path.display()))?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_deref())?;
    let layout = GridLayout::new(config)?;

    match cli.command {
        Commands::Info => {
            println!("cellspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "buckets: {0}x{0} of {1} units, {2} per region",
                layout.dimension(),
                layout.bucket_size(),
                layout.sub_buckets_per_region()
            );
            println!("regions: {0}x{0} of {1} units", config.regions_per_axis, layout.region_size());
            println!("world: {} .. {}", layout.world_min(), layout.world_max());
        }
        Commands::Locate { x, y } => {
            let key = layout.key_at(x, y)?;
            let address = layout.address_from_key(key);
            let (min, max) = layout.bucket_bounds(key);
            println!(
                "bucket: region ({}, {}) sub ({}, {}) packed {:#010x}",
                key.region_x,
                key.region_y,
                key.sub_x,
                key.sub_y,
                key.packed()
            );
            println!("address: ({}, {})", address.x, address.y);
            println!("covers: {min} .. {max}");
        }
        Commands::Query {
            x,
            y,
            radius,
            objects,
            spacing,
            sweep,
            events,
        } => {
            let center = Vec2::new(x, y);
            let map = populate(config, center, objects, spacing)?;
            let area = map.layout().resolve(center, radius);
            println!(
                "map: {} objects ({} players) in {} buckets",
                map.object_count(),
                map.player_count(),
                map.bucket_count()
            );
            println!(
                "area: ({}, {}) .. ({}, {}), {} buckets",
                area.low_bound.x,
                area.low_bound.y,
                area.high_bound.x,
                area.high_bound.y,
                area.bucket_count()
            );

            let mut inside = 0;
            let Ok(visited) = map
                .dispatcher()
                .visit_around(center, radius, sweep.categories(), |object| {
                    if within_radius(center, radius, object.position) {
                        inside += 1;
                    }
                    Ok::<_, Infallible>(())
                });
            println!("visited: {visited} objects, {inside} within radius");

            if events {
                for event in map.events() {
                    println!("{}", serde_json::to_string(event)?);
                }
            }
        }
        Commands::Weather {
            table,
            occupied,
            ticks,
            tick_ms,
            day,
            seed,
        } => {
            let table = WeatherTable::load(&table)
                .with_context(|| format!("loading weather table {}", table.display()))?;
            let mut registry = WeatherRegistry::with_seed(table, seed);
            registry.set_season(Season::from_day_of_year(day));
            println!("season: {:?}", registry.season());

            let occupied: Vec<ZoneId> = occupied.into_iter().map(ZoneId).collect();
            for zone in &occupied {
                let change = registry.weather_for_zone_entry(*zone);
                println!("zone {}: {:?} ({:.2})", zone.0, change.state, change.grade);
            }

            for tick in 1..=ticks {
                for change in registry.update(tick_ms, |zone| occupied.contains(&zone)) {
                    println!(
                        "tick {tick}: zone {} -> {:?} ({:.2})",
                        change.zone.0, change.state, change.grade
                    );
                }
            }
            println!("live weather: {} zones", registry.len());
        }
    }

    Ok(())
}

/// Spawn `count` objects on a square lattice centred on `center`; every
/// tenth one is a player.
fn populate(config: GridConfig, center: Vec2, count: usize, spacing: f32) -> anyhow::Result<Map> {
    let mut map = Map::new(config)?;
    let side = (count as f32).sqrt().ceil().max(1.0) as usize;
    let offset = Vec2::splat((side as f32 - 1.0) * spacing / 2.0);
    let mut skipped = 0;
    for i in 0..count {
        let kind = if i % 10 == 0 {
            ObjectKind::Player
        } else {
            ObjectKind::Creature
        };
        let position = center - offset + Vec2::new((i % side) as f32, (i / side) as f32) * spacing;
        if map.spawn(kind, position, ZoneId(0)).is_err() {
            skipped += 1;
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "objects outside the world were not spawned");
    }
    Ok(map)
}
