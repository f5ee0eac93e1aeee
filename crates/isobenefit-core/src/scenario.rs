//! Parameter sweeps: independent simulations over shared extents.

use crate::cell::CellClass;
use crate::config::LandConfig;
use crate::grid::{Affine, Grid};
use crate::land::{ConfigurationError, Land, RunError, RunSummary};
use rayon::prelude::*;
use std::{error::Error, fmt};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioError {
    Configuration {
        index: usize,
        source: ConfigurationError,
    },
    Run {
        index: usize,
        source: RunError,
    },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::Configuration { index, source } => {
                write!(f, "scenario {index}: {source}")
            }
            ScenarioError::Run { index, source } => write!(f, "scenario {index}: {source}"),
        }
    }
}

impl Error for ScenarioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ScenarioError::Configuration { source, .. } => Some(source),
            ScenarioError::Run { source, .. } => Some(source),
        }
    }
}

/// Run one simulation per config in parallel. Results keep the order of
/// `configs`; a failing scenario does not affect the others.
pub fn run_scenarios(
    extents: &Grid<CellClass>,
    transform: Affine,
    centre_seeds: &[(f64, f64)],
    configs: &[LandConfig],
    steps: usize,
    sample_every: usize,
) -> Vec<Result<RunSummary, ScenarioError>> {
    configs
        .par_iter()
        .enumerate()
        .map(|(index, config)| {
            let mut land = Land::try_new(extents.clone(), transform, centre_seeds, config.clone())
                .map_err(|source| ScenarioError::Configuration { index, source })?;
            land.try_run_simulation(steps, sample_every)
                .map_err(|source| ScenarioError::Run { index, source })
        })
        .inspect(|result| {
            if let Err(e) = result {
                warn!("{e}");
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    fn extents() -> (Grid<CellClass>, Affine) {
        (
            Grid::filled(20, 20, CellClass::Nature),
            Affine::north_up(0.0, 2000.0, 100.0),
        )
    }

    fn config(seed: u64) -> LandConfig {
        LandConfig {
            walk_dist_m: 500.0,
            build_prob: 0.5,
            min_green_km2: 1.0,
            random_seed: seed,
            ..LandConfig::default()
        }
    }

    #[test]
    fn scenarios_match_sequential_runs_in_order() {
        let (grid, transform) = extents();
        let centre = transform.xy(Cell::new(10, 10));
        let configs = [config(1), config(2), config(3)];
        let results = run_scenarios(&grid, transform, &[centre], &configs, 4, 2);
        assert_eq!(results.len(), 3);
        for (config, result) in configs.iter().zip(&results) {
            let summary = result.as_ref().unwrap();
            let mut land = Land::new(grid.clone(), transform, &[centre], config.clone());
            let expected = land.run_simulation(4, 2);
            assert_eq!(summary.total_added_blocks, expected.total_added_blocks);
            assert_eq!(summary.samples.len(), expected.samples.len());
        }
    }

    #[test]
    fn failing_scenario_is_reported_with_its_index() {
        let (grid, transform) = extents();
        let centre = transform.xy(Cell::new(10, 10));
        let bad = LandConfig {
            min_green_km2: 50.0,
            ..config(0)
        };
        let results = run_scenarios(&grid, transform, &[centre], &[config(0), bad], 2, 1);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(ScenarioError::Configuration { index, source }) => {
                assert_eq!(*index, 1);
                assert!(matches!(source, ConfigurationError::ExtentsTooSmall { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn run_errors_surface_per_scenario() {
        let (grid, transform) = extents();
        let centre = transform.xy(Cell::new(10, 10));
        let results = run_scenarios(&grid, transform, &[centre], &[config(0)], 2, 0);
        assert!(matches!(
            results[0],
            Err(ScenarioError::Run {
                index: 0,
                source: RunError::InvalidSampleEvery
            })
        ));
    }
}
