use super::Land;
use crate::areas::label_green_areas;
use crate::cell::CellClass;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default)]
pub struct StepTimings {
    pub areas_us: u64,
    pub scan_us: u64,
    pub total_us: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StepMetrics {
    pub step: usize,
    pub added_blocks: usize,
    pub added_centrality: usize,
    pub nature_cells: usize,
    pub built_cells: usize,
    pub centre_cells: usize,
    pub frontier_cells: usize,
    pub tombstoned_cells: usize,
    pub green_components: usize,
    pub largest_green_km2: i64,
    /// Sum of density times `max_local_pop` over developed cells.
    pub population_estimate: f64,
}

/// Raster state at one step, row-major.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LandSnapshot {
    pub step: usize,
    pub rows: usize,
    pub cols: usize,
    pub classes: Vec<i8>,
    pub density: Vec<f64>,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub total_added_blocks: usize,
    pub total_added_centrality: usize,
    pub samples: Vec<StepMetrics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snapshots: Vec<LandSnapshot>,
}

impl Land {
    pub fn population_estimate(&self) -> f64 {
        let max_local_pop = f64::from(self.config.max_local_pop);
        self.classes
            .data()
            .iter()
            .zip(self.density.data())
            .filter(|(class, _)| class.is_developed())
            .map(|(_, density)| density * max_local_pop)
            .sum()
    }

    pub(crate) fn collect_step_metrics(&self, step: usize) -> StepMetrics {
        let green = label_green_areas(&self.classes, self.config.cell_size_m);
        StepMetrics {
            step,
            added_blocks: self.added_blocks_last_step,
            added_centrality: self.added_centrality_last_step,
            nature_cells: self.classes.count(CellClass::Nature),
            built_cells: self.classes.count(CellClass::Built),
            centre_cells: self.classes.count(CellClass::Centre),
            frontier_cells: self.green.active_count(),
            tombstoned_cells: self.green.tombstoned_count(),
            green_components: green.component_count,
            largest_green_km2: green.largest_km2,
            population_estimate: self.population_estimate(),
        }
    }

    pub fn snapshot(&self, step: usize) -> LandSnapshot {
        let (rows, cols) = self.shape();
        LandSnapshot {
            step,
            rows,
            cols,
            classes: self.classes.data().iter().map(|c| c.code()).collect(),
            density: self.density.data().to_vec(),
        }
    }
}
