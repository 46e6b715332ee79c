//! Outpost Planner
//!
//! Finds a minimal set of outposts covering every resource in a star-system
//! catalog.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use outpost_planner::config::{SolverConfig, Strategy};
use outpost_planner::db;
use outpost_planner::import;
use outpost_planner::models::{BiomeResources, Planet, Rarity, ResourceKind, SystemRecord};
use outpost_planner::scoring::RarityScorer;
use outpost_planner::solver::{CancelToken, ProgressFn, SearchProgress, Solver};

#[derive(Parser)]
#[command(name = "outpost-planner")]
#[command(about = "Minimal outpost set planner for resource coverage across star systems")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "outposts.db")]
    database: PathBuf,

    /// Log solver decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import resource tables, groups and systems from a data directory
    Import {
        /// Directory containing the CSV and JSON data files
        data_dir: PathBuf,

        /// Clear existing data before import
        #[arg(long)]
        clear: bool,
    },

    /// Select outposts for the imported catalog
    Solve {
        /// Search every combination of full-chain planets
        #[arg(long)]
        exhaustive: bool,

        /// Cover inorganics biome by biome instead of by resource chain
        #[arg(long, conflicts_with = "exhaustive")]
        biome: bool,

        /// Maximum number of outposts considered a success
        #[arg(long)]
        cap: Option<usize>,

        /// Worker threads for the exhaustive search (0 = all cores)
        #[arg(long)]
        threads: Option<usize>,

        /// Stop the exhaustive search once a plan this small is found
        #[arg(long)]
        target: Option<usize>,

        /// Write the result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Solver configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List all systems in the database
    ListSystems,

    /// Show details for a specific planet
    Planet {
        /// Planet name
        name: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load sample data for testing (without a data directory)
    LoadSample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Import { data_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_catalog(&conn)?;
            }

            let stats = import::import_dir(&conn, &data_dir)
                .with_context(|| format!("Failed to import {}", data_dir.display()))?;
            println!("\n{}", stats);
        }

        Commands::Solve {
            exhaustive,
            biome,
            cap,
            threads,
            target,
            output,
            config,
        } => {
            let mut config = match config {
                Some(path) => SolverConfig::load(&path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?,
                None => SolverConfig::default(),
            };
            if exhaustive {
                config.strategy = Strategy::Exhaustive;
            }
            if biome {
                config.strategy = Strategy::Biome;
            }
            if let Some(cap) = cap {
                config.location_cap = cap;
            }
            if let Some(threads) = threads {
                config.threads = threads;
            }
            if target.is_some() {
                config.target_count = target;
            }

            let catalog = db::load_catalog(&conn)?;
            if catalog.planet_count() == 0 {
                println!("No planets in database. Run 'import' or 'load-sample' first.");
                return Ok(());
            }
            let taxonomy = db::load_taxonomy(&conn)?;
            let scorer = RarityScorer::new(&taxonomy);
            let solver = Solver::new(&catalog, &taxonomy, &scorer, &config);

            let json = match config.strategy {
                Strategy::Iterative => {
                    let plan = solver.solve();
                    println!("{}", plan);
                    serde_json::to_string_pretty(&plan)?
                }
                Strategy::Exhaustive => {
                    let on_progress: &ProgressFn<'_> = &|p: &SearchProgress| {
                        log::info!(
                            "{}/{} combinations, best so far {:?}",
                            p.evaluated,
                            p.total,
                            p.min_count
                        );
                    };
                    let report = solver.search(&CancelToken::new(), Some(on_progress));
                    println!("{}", report);
                    serde_json::to_string_pretty(&report)?
                }
                Strategy::Biome => {
                    let plan = solver.cover_biomes();
                    println!("{}", plan);
                    serde_json::to_string_pretty(&plan)?
                }
            };

            if let Some(path) = output {
                fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Result written to {}", path.display());
            }
        }

        Commands::ListSystems => {
            let systems = db::list_systems(&conn)?;
            if systems.is_empty() {
                println!("No systems in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<30} {:>8}", "System", "Planets");
                println!("{}", "-".repeat(39));
                for s in systems {
                    println!("{:<30} {:>8}", s.name, s.planet_count);
                }
            }
        }

        Commands::Planet { name } => {
            let catalog = db::load_catalog(&conn)?;
            let Some(id) = catalog.planet_id(&name) else {
                println!("Planet '{}' not found", name);
                return Ok(());
            };
            let planet = catalog.planet(id);
            println!("Planet: {}", planet.name);
            println!("  System: {}", catalog.system_of(id).name);
            if !planet.resources.inorganic.is_empty() {
                println!("  Inorganic: {}", planet.resources.inorganic.join(", "));
            }
            if !planet.resources.organic.is_empty() {
                println!("  Organic: {}", planet.resources.organic.join(", "));
            }
            for (label, entries) in [
                ("Domesticable flora", &planet.flora.domesticable),
                ("Gatherable flora", &planet.flora.gatherable),
                ("Domesticable fauna", &planet.fauna.domesticable),
                ("Gatherable fauna", &planet.fauna.gatherable),
            ] {
                if !entries.is_empty() {
                    println!("  {}:", label);
                    for (resource, organism) in entries {
                        println!("    {} ({})", resource, organism);
                    }
                }
            }
            for (biome, resources) in &planet.biome_resources {
                println!("  Biome {}: {}", biome, resources.inorganic.join(", "));
            }

            let taxonomy = db::load_taxonomy(&conn)?;
            let chains = taxonomy.full_chains(planet);
            if !chains.is_empty() {
                println!("  Full chains: {}", chains.join(", "));
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }
    }

    Ok(())
}

fn sample_planet(name: &str, inorganic: &[&str], flora: &[&str], fauna: &[&str]) -> Planet {
    let mut planet = Planet::new(name);
    planet.resources.inorganic = inorganic.iter().map(|s| s.to_string()).collect();
    for r in flora {
        planet.flora.domesticable.insert(r.to_string(), format!("{r} Creeper"));
        planet.resources.organic.push(r.to_string());
    }
    for r in fauna {
        planet.fauna.domesticable.insert(r.to_string(), format!("{r} Grazer"));
        planet.resources.organic.push(r.to_string());
    }
    planet.biomes.push("Plains".to_string());
    planet.biome_resources.insert(
        "Plains".to_string(),
        BiomeResources {
            inorganic: planet.resources.inorganic.clone(),
        },
    );
    planet
}

/// Load a small sample catalog for testing without a data directory
fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_catalog(conn)?;

    let inorganic = [
        ("Iron", Rarity::Common),
        ("Nickel", Rarity::Common),
        ("Aluminum", Rarity::Common),
        ("Copper", Rarity::Uncommon),
        ("Lithium", Rarity::Uncommon),
        ("Cobalt", Rarity::Rare),
        ("Tungsten", Rarity::Rare),
        ("Helium-3", Rarity::Common),
        ("Water", Rarity::Common),
        ("Veryl", Rarity::Exotic),
        ("Rothicite", Rarity::Unique),
    ];
    let organic = [
        ("Fiber", Rarity::Common),
        ("Sealant", Rarity::Uncommon),
        ("Spice", Rarity::Rare),
        ("Venom", Rarity::Rare),
        ("Aromatic", Rarity::Exotic),
    ];
    for (name, rarity) in inorganic {
        db::upsert_resource(conn, ResourceKind::Inorganic, name, None, rarity)?;
    }
    for (name, rarity) in organic {
        db::upsert_resource(conn, ResourceKind::Organic, name, None, rarity)?;
    }

    let set = |names: &[&str]| -> BTreeSet<String> { names.iter().map(|s| s.to_string()).collect() };
    db::upsert_group(conn, ResourceKind::Inorganic, "Alloys", &set(&["Iron", "Nickel"]))?;
    db::upsert_group(conn, ResourceKind::Inorganic, "Wiring", &set(&["Aluminum", "Copper"]))?;
    db::upsert_group(conn, ResourceKind::Inorganic, "Batteries", &set(&["Lithium", "Cobalt"]))?;
    db::upsert_group(conn, ResourceKind::Inorganic, "Filaments", &set(&["Tungsten", "Veryl"]))?;
    db::upsert_group(conn, ResourceKind::Organic, "flora", &set(&["Fiber", "Sealant", "Spice"]))?;
    db::upsert_group(conn, ResourceKind::Organic, "fauna", &set(&["Venom", "Aromatic"]))?;
    db::insert_gatherable_only(conn, ResourceKind::Organic, "Fiber")?;

    let systems = vec![
        SystemRecord {
            name: "Alpha Centauri".to_string(),
            planets: vec![
                sample_planet("Jemison", &["Iron", "Nickel", "Water", "Helium-3"], &["Sealant"], &[]),
                sample_planet("Gagarin", &["Rothicite", "Aluminum"], &[], &["Venom"]),
            ],
        },
        SystemRecord {
            name: "Narion".to_string(),
            planets: vec![
                sample_planet("Andraphon", &["Aluminum", "Copper", "Iron"], &["Spice"], &[]),
                sample_planet("Zeta", &["Lithium"], &[], &["Aromatic"]),
            ],
        },
        SystemRecord {
            name: "Cheyenne".to_string(),
            planets: vec![
                sample_planet("Cheyenne I", &["Lithium", "Cobalt", "Nickel"], &[], &[]),
                sample_planet("Cheyenne II", &["Tungsten", "Veryl"], &["Fiber"], &[]),
            ],
        },
        SystemRecord {
            name: "Porrima".to_string(),
            planets: vec![
                sample_planet("Porrima III", &["Lithium", "Cobalt", "Tungsten", "Veryl"], &[], &[]),
                sample_planet("Porrima IV", &["Copper", "Cobalt"], &["Sealant"], &[]),
            ],
        },
    ];
    let planets: usize = systems.iter().map(|s| s.planets.len()).sum();
    for system in &systems {
        db::upsert_system(conn, system)?;
    }

    println!("Loaded {} sample systems with {} planets", systems.len(), planets);
    Ok(())
}
