//! # Citygen Command Line Entry Point
//!
//! Generates a city layout or a world map and prints it as glyphs or JSON.

use citygen::{
    render_legend, render_sites, render_tiles, render_world, CityGenError, CityGenResult,
    CityGenerator, GenerationOptions, Generator, WorldConfig, WorldGenerator,
};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use std::path::PathBuf;

/// Command line arguments for citygen.
#[derive(Parser, Debug)]
#[command(name = "citygen")]
#[command(about = "Wave Function Collapse city layouts and noise-driven world maps")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a single city layout
    City {
        /// Random seed (0 or absent picks one from the clock)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Side length of the square layout
        #[arg(long)]
        size: Option<usize>,

        /// Built-tile weight in cached entropy scores, 0.0 to 1.0 (does not change the layout)
        #[arg(long)]
        density: Option<f64>,

        /// Skip post-processing
        #[arg(long)]
        raw: bool,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,

        /// Print a legend with per-kind counts
        #[arg(long)]
        legend: bool,

        /// JSON file with generation options
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Generate a world map with city sites
    World {
        /// Random seed (0 or absent picks one from the clock)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Print the map as JSON
        #[arg(long)]
        json: bool,

        /// Also lay out the city with this index in the site list
        #[arg(long)]
        city: Option<usize>,
    },
}

fn main() -> CityGenResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;

    info!("Starting citygen v{}", citygen::VERSION);

    match args.command {
        Command::City {
            seed,
            size,
            density,
            raw,
            json,
            legend,
            options,
        } => {
            let mut opts = match options {
                Some(path) => GenerationOptions::from_file(path)?,
                None => GenerationOptions::organic_city(0),
            };
            if let Some(seed) = seed {
                opts = opts.with_seed(seed);
            }
            if let Some(size) = size {
                opts = opts.with_size(size, size);
            }
            if let Some(density) = density {
                opts = opts.with_density(density);
            }

            let mut generator = CityGenerator::new(opts);
            if raw {
                generator = generator.without_post_processing();
            }
            run_city(&generator, json, legend)
        }
        Command::World { seed, json, city } => {
            let world = WorldGenerator::new(WorldConfig::new(seed.unwrap_or(0))).generate()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&world)?);
            } else {
                print!("{}", render_world(&world));
                print!("{}", render_sites(&world));
            }

            if let Some(index) = city {
                let site = world.settlements().get(index).ok_or_else(|| {
                    CityGenError::InvalidConfig(format!(
                        "world has {} cities, no city at index {}",
                        world.settlements().len(),
                        index
                    ))
                })?;
                info!("Laying out {}", site.name);
                run_city(&CityGenerator::for_settlement(site), json, false)?;
            }
            Ok(())
        }
    }
}

fn run_city(generator: &CityGenerator, json: bool, legend: bool) -> CityGenResult<()> {
    let layout = generator.generate_layout()?;
    generator.validate(&layout.grid)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    let catalog = &generator.options().catalog;
    print!("{}", render_tiles(&layout.grid, catalog));
    if legend {
        print!("{}", render_legend(&layout.grid, catalog));
    }
    Ok(())
}

/// Initializes logging based on the specified level.
fn initialize_logging(log_level: &str) -> CityGenResult<()> {
    let level: LevelFilter = log_level.parse().map_err(|_| {
        CityGenError::InvalidConfig(format!("unknown log level '{}'", log_level))
    })?;

    #[cfg(feature = "dev-tools")]
    {
        let level = match level {
            LevelFilter::Off | LevelFilter::Error => tracing::Level::ERROR,
            LevelFilter::Warn => tracing::Level::WARN,
            LevelFilter::Info => tracing::Level::INFO,
            LevelFilter::Debug => tracing::Level::DEBUG,
            LevelFilter::Trace => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .filter_level(level)
            .format_target(false)
            .init();
    }

    Ok(())
}
