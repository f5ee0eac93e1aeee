use anyhow::{bail, Context, Result};
use clap::Parser;
use isobenefit_core::{Affine, CellClass, Grid, Land, LandConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, Level};

/// Grow an isobenefit city on a land-use raster and report per-step metrics as JSON.
#[derive(Parser, Debug)]
#[command(name = "isobenefit", version)]
struct Args {
    /// JSON model parameters; every field is required. Defaults to the reference parameterisation.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// JSON extents raster: `{ rows, cols, classes, transform }`.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["rows", "cols"])]
    extents: Option<PathBuf>,
    /// Rows of an all-Nature extent anchored at the origin.
    #[arg(long, requires = "cols", required_unless_present = "extents")]
    rows: Option<usize>,
    /// Columns of an all-Nature extent anchored at the origin.
    #[arg(long, requires = "rows", required_unless_present = "extents")]
    cols: Option<usize>,
    /// Initial centre as `EAST,NORTH` in real-world coordinates. Repeatable.
    #[arg(long = "centre", value_name = "EAST,NORTH")]
    centres: Vec<CentreArg>,
    #[arg(long, default_value_t = 10)]
    steps: usize,
    #[arg(long, default_value_t = 1)]
    sample_every: usize,
    /// Capture the full grid after this step. Repeatable.
    #[arg(long = "snapshot-step", value_name = "STEP")]
    snapshot_steps: Vec<usize>,
    /// Override the configured random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Write the run summary here instead of stdout.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
    #[arg(long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug)]
struct CentreArg {
    east: f64,
    north: f64,
}

impl FromStr for CentreArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (east, north) = value
            .split_once(',')
            .ok_or_else(|| "expected format EAST,NORTH".to_string())?;
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid coordinate `{}`: {e}", s.trim()))
        };
        Ok(Self {
            east: parse(east)?,
            north: parse(north)?,
        })
    }
}

#[derive(Deserialize)]
struct ExtentsFile {
    rows: usize,
    cols: usize,
    classes: Vec<i16>,
    transform: [f64; 6],
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_extents(args: &Args, config: &LandConfig) -> Result<(Grid<CellClass>, Affine)> {
    if let Some(path) = &args.extents {
        let file: ExtentsFile = read_json(path)?;
        let grid = Grid::from_class_codes(file.rows, file.cols, &file.classes)
            .with_context(|| format!("invalid extents in {}", path.display()))?;
        return Ok((grid, Affine::from_coefficients(file.transform)));
    }
    match (args.rows, args.cols) {
        (Some(rows), Some(cols)) if rows > 0 && cols > 0 => {
            let north = rows as f64 * config.cell_size_m;
            Ok((
                Grid::filled(rows, cols, CellClass::Nature),
                Affine::north_up(0.0, north, config.cell_size_m),
            ))
        }
        _ => bail!("--rows and --cols must both be positive"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => read_json(path)?,
        None => LandConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }
    let (extents, transform) = load_extents(&args, &config)?;
    let seeds: Vec<(f64, f64)> = args.centres.iter().map(|c| (c.east, c.north)).collect();

    let mut land = Land::try_new(extents, transform, &seeds, config)
        .context("failed to initialise land")?;
    let (rows, cols) = land.shape();
    info!(rows, cols, steps = args.steps, "starting run");

    let summary = land
        .try_run_simulation_with_snapshots(args.steps, args.sample_every, &args.snapshot_steps)
        .context("run failed")?;
    info!(
        added_blocks = summary.total_added_blocks,
        added_centrality = summary.total_added_centrality,
        population = land.population_estimate(),
        "run complete"
    );

    let json = serde_json::to_string_pretty(&summary).context("serializing run summary")?;
    match &args.out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?
        }
        None => println!("{json}"),
    }
    Ok(())
}
