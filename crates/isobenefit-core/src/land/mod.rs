pub mod growth;
pub mod metrics;

pub use growth::*;
pub use metrics::*;

use crate::access::{compute_centre_access, AccessKernel, Influence};
use crate::areas::GreenAreas;
use crate::cell::{CellClass, Frontier};
use crate::config::{LandConfig, LandConfigError};
use crate::density::assign_density;
use crate::frontier::GreenInterface;
use crate::grid::{Affine, Cell, Grid, GridError};
use crate::neighbors::count_contiguous_runs;
use crate::spatial::recompute_surface;
use crate::span::SpanRule;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::{error::Error, fmt};
use tracing::debug;

/// One isobenefit growth simulation: the land-use grid, its derived
/// accessibility surfaces and the random stream that drives it.
///
/// All mutation goes through [`Land::step`], which keeps the surfaces
/// consistent with the grid.
pub struct Land {
    pub(crate) config: LandConfig,
    pub(crate) transform: Affine,
    pub(crate) classes: Grid<CellClass>,
    pub(crate) density: Grid<f64>,
    pub(crate) centre_access: Grid<f64>,
    pub(crate) green: GreenInterface,
    /// Green components labelled at the start of the most recent step.
    pub(crate) areas: Option<GreenAreas>,
    pub(crate) kernel: AccessKernel,
    pub(crate) span_rule: SpanRule,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) step_index: usize,
    pub(crate) added_blocks_last_step: usize,
    pub(crate) added_centrality_last_step: usize,
    pub(crate) total_added_blocks: usize,
    pub(crate) total_added_centrality: usize,
}

/// Fatal problems detected while building a [`Land`]; no partial engine is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    Config(LandConfigError),
    Grid(GridError),
    DegenerateTransform,
    ExtentsTooSmall { area_km2: f64, required_km2: f64 },
    SeedOutOfBounds { east: f64, north: f64 },
    EmptyGreenInterface,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::Config(e) => write!(f, "{}", e),
            ConfigurationError::Grid(e) => write!(f, "{}", e),
            ConfigurationError::DegenerateTransform => {
                write!(f, "extents transform is not invertible")
            }
            ConfigurationError::ExtentsTooSmall {
                area_km2,
                required_km2,
            } => write!(
                f,
                "extents cover {area_km2} km² but at least {required_km2} km² (twice min_green_km2) is required; decrease min_green_km2"
            ),
            ConfigurationError::SeedOutOfBounds { east, north } => {
                write!(f, "centre seed ({east}, {north}) falls outside the extents")
            }
            ConfigurationError::EmptyGreenInterface => write!(
                f,
                "no green interface to grow from: seed a centre or set cent_prob_isol above 0"
            ),
        }
    }
}

impl From<LandConfigError> for ConfigurationError {
    fn from(err: LandConfigError) -> Self {
        ConfigurationError::Config(err)
    }
}

impl From<GridError> for ConfigurationError {
    fn from(err: GridError) -> Self {
        ConfigurationError::Grid(err)
    }
}

impl Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigurationError::Config(e) => Some(e),
            ConfigurationError::Grid(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    InvalidSampleEvery,
    TooManySteps { max: usize, actual: usize },
    TooManySamples { max: usize, actual: usize },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            RunError::TooManySteps { max, actual } => {
                write!(f, "steps ({actual}) exceed supported maximum ({max})")
            }
            RunError::TooManySamples { max, actual } => {
                write!(
                    f,
                    "sample count ({actual}) exceeds supported maximum ({max})"
                )
            }
        }
    }
}

impl Error for RunError {}

impl Land {
    pub const MAX_RUN_STEPS: usize = 1_000_000;
    pub const MAX_RUN_SAMPLES: usize = 50_000;

    pub fn new(
        extents: Grid<CellClass>,
        transform: Affine,
        centre_seeds: &[(f64, f64)],
        config: LandConfig,
    ) -> Self {
        Self::try_new(extents, transform, centre_seeds, config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Build the engine from an extents raster, its geotransform and optional
    /// real-world `(east, north)` centre seeds.
    pub fn try_new(
        extents: Grid<CellClass>,
        transform: Affine,
        centre_seeds: &[(f64, f64)],
        config: LandConfig,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        if !transform.is_invertible() {
            return Err(ConfigurationError::DegenerateTransform);
        }
        let (rows, cols) = extents.shape();
        let area_km2 = rows as f64 * config.cell_size_m * cols as f64 * config.cell_size_m
            / 1_000_000.0;
        let required_km2 = 2.0 * config.min_green_km2;
        if area_km2 < required_km2 {
            return Err(ConfigurationError::ExtentsTooSmall {
                area_km2,
                required_km2,
            });
        }

        let mut classes = extents;
        for &(east, north) in centre_seeds {
            let cell = transform
                .rowcol(east, north)
                .and_then(|(row, col)| {
                    let row = usize::try_from(row).ok()?;
                    let col = usize::try_from(col).ok()?;
                    (row < rows && col < cols).then_some(Cell::new(row, col))
                })
                .ok_or(ConfigurationError::SeedOutOfBounds { east, north })?;
            classes.set(cell, CellClass::Centre);
        }

        let kernel = AccessKernel::for_shape(config.cell_size_m, config.walk_dist_m, rows, cols);
        let green = GreenInterface::initialize(&classes, &kernel);
        if green.active_count() == 0 && config.cent_prob_isol == 0.0 {
            return Err(ConfigurationError::EmptyGreenInterface);
        }
        let centre_access = compute_centre_access(&classes, &kernel);
        debug!(
            rows,
            cols,
            seeds = centre_seeds.len(),
            frontier = green.active_count(),
            kernel_cells = kernel.footprint(),
            "land initialised"
        );

        Ok(Self {
            density: classes.same_shape(0.0),
            span_rule: SpanRule::from_config(&config),
            rng: ChaCha12Rng::seed_from_u64(config.random_seed),
            transform,
            classes,
            centre_access,
            green,
            areas: None,
            kernel,
            config,
            step_index: 0,
            added_blocks_last_step: 0,
            added_centrality_last_step: 0,
            total_added_blocks: 0,
            total_added_centrality: 0,
        })
    }

    pub fn config(&self) -> &LandConfig {
        &self.config
    }

    pub fn transform(&self) -> &Affine {
        &self.transform
    }

    pub fn shape(&self) -> (usize, usize) {
        self.classes.shape()
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn classes(&self) -> &Grid<CellClass> {
        &self.classes
    }

    pub fn density(&self) -> &Grid<f64> {
        &self.density
    }

    pub fn centre_access(&self) -> &Grid<f64> {
        &self.centre_access
    }

    pub fn green_access(&self) -> &Grid<f64> {
        self.green.access()
    }

    pub fn frontier(&self) -> &Grid<Frontier> {
        self.green.marks()
    }

    /// Green components as labelled at the start of the latest step.
    pub fn green_areas(&self) -> Option<&GreenAreas> {
        self.areas.as_ref()
    }

    pub fn class_at(&self, cell: Cell) -> Option<CellClass> {
        self.classes.get(cell).copied()
    }

    pub fn density_at(&self, cell: Cell) -> Option<f64> {
        self.density.get(cell).copied()
    }

    /// Overwrite the density of a developed cell. Returns false, leaving the
    /// grid untouched, for undeveloped or out-of-range cells and for negative
    /// or non-finite values.
    pub fn set_density(&mut self, cell: Cell, density: f64) -> bool {
        let developed = self.class_at(cell).is_some_and(CellClass::is_developed);
        if !developed || !density.is_finite() || density < 0.0 {
            return false;
        }
        self.density[cell] = density;
        true
    }

    /// Real-world coordinates of a cell centre.
    pub fn cell_xy(&self, cell: Cell) -> (f64, f64) {
        self.transform.xy(cell)
    }

    /// Longest run and number of runs of `targets` around `cell`'s queen ring.
    pub fn contiguous_runs(&self, cell: Cell, targets: &[CellClass]) -> (usize, usize) {
        count_contiguous_runs(&self.classes, cell, targets)
    }

    /// Whether developing `cell` would keep the green spans through it wide enough.
    pub fn validate_span(&self, cell: Cell) -> bool {
        self.span_rule.validate_span(&self.classes, cell)
    }

    pub fn recompute_centre_access(&self) -> Grid<f64> {
        let (rows, cols) = self.shape();
        let centres = self
            .classes
            .iter()
            .filter(|(_, &class)| class == CellClass::Centre)
            .map(|(cell, _)| cell);
        recompute_surface(rows, cols, centres, &self.kernel)
    }

    pub fn recompute_green_access(&self) -> Grid<f64> {
        let (rows, cols) = self.shape();
        recompute_surface(rows, cols, self.green.contributing_cells(), &self.kernel)
    }

    /// Largest absolute difference between the incrementally maintained
    /// surfaces and a from-scratch recomputation.
    pub fn surface_drift(&self) -> f64 {
        let max_diff = |a: &Grid<f64>, b: &Grid<f64>| {
            a.data()
                .iter()
                .zip(b.data())
                .map(|(x, y)| (x - y).abs())
                .fold(0.0f64, f64::max)
        };
        max_diff(&self.centre_access, &self.recompute_centre_access())
            .max(max_diff(self.green.access(), &self.recompute_green_access()))
    }

    /// Set a cell developed after the green interface accepted it, assigning
    /// its density and extending centrality access for centres.
    pub(crate) fn commit_development(&mut self, cell: Cell, class: CellClass) {
        debug_assert!(class.is_developed());
        self.classes[cell] = class;
        if class == CellClass::Centre {
            self.kernel
                .aggregate(&mut self.centre_access, cell, Influence::Add);
        }
        self.density[cell] = assign_density(
            &mut self.rng,
            &self.config.prob_distribution,
            &self.config.density_factors,
        );
    }

    pub fn run_simulation(&mut self, steps: usize, sample_every: usize) -> RunSummary {
        self.try_run_simulation(steps, sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_run_simulation(
        &mut self,
        steps: usize,
        sample_every: usize,
    ) -> Result<RunSummary, RunError> {
        self.try_run_simulation_with_snapshots(steps, sample_every, &[])
    }

    /// Run like `try_run_simulation`, also capturing the grid at `snapshot_steps`
    /// (1-based, relative to the start of this run).
    pub fn try_run_simulation_with_snapshots(
        &mut self,
        steps: usize,
        sample_every: usize,
        snapshot_steps: &[usize],
    ) -> Result<RunSummary, RunError> {
        if sample_every == 0 {
            return Err(RunError::InvalidSampleEvery);
        }
        if steps > Self::MAX_RUN_STEPS {
            return Err(RunError::TooManySteps {
                max: Self::MAX_RUN_STEPS,
                actual: steps,
            });
        }
        let estimated_samples = if steps == 0 {
            0
        } else {
            ((steps - 1) / sample_every) + 1
        };
        if estimated_samples > Self::MAX_RUN_SAMPLES {
            return Err(RunError::TooManySamples {
                max: Self::MAX_RUN_SAMPLES,
                actual: estimated_samples,
            });
        }

        let blocks_before = self.total_added_blocks;
        let centrality_before = self.total_added_centrality;
        let mut samples = Vec::with_capacity(estimated_samples);
        let mut snapshots = Vec::with_capacity(snapshot_steps.len());
        for step in 1..=steps {
            self.step();
            if step % sample_every == 0 || step == steps {
                samples.push(self.collect_step_metrics(step));
            }
            if snapshot_steps.contains(&step) {
                snapshots.push(self.snapshot(step));
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            total_added_blocks: self.total_added_blocks - blocks_before,
            total_added_centrality: self.total_added_centrality - centrality_before,
            samples,
            snapshots,
        })
    }
}
