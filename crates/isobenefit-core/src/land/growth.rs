use super::metrics::StepTimings;
use super::Land;
use crate::areas::{label_green_areas, GreenAreas};
use crate::cell::{CellClass, Frontier};
use crate::frontier::FrontierUpdate;
use crate::grid::Cell;
use rand::Rng;
use std::time::Instant;
use tracing::info;

/// Cells developed during one step.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub added_blocks: usize,
    pub added_centrality: usize,
    pub timings: StepTimings,
}

/// What the scan did with one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Development {
    Block,
    Centrality,
}

impl Land {
    /// Advance the simulation by one step.
    ///
    /// Green components are labelled once up front; every cell is then visited in
    /// row-major order and sees the development already committed earlier in the
    /// same step.
    pub fn step(&mut self) -> StepOutcome {
        let total_start = Instant::now();
        self.step_index = self.step_index.saturating_add(1);

        let t0 = Instant::now();
        let areas = label_green_areas(&self.classes, self.config.cell_size_m);
        let areas_us = t0.elapsed().as_micros() as u64;

        let t1 = Instant::now();
        let mut added_blocks = 0;
        let mut added_centrality = 0;
        for idx in 0..self.classes.len() {
            let cell = self.classes.cell_at(idx);
            match self.scan_cell(cell, &areas) {
                Some(Development::Block) => added_blocks += 1,
                Some(Development::Centrality) => added_centrality += 1,
                None => {}
            }
        }
        let scan_us = t1.elapsed().as_micros() as u64;

        self.areas = Some(areas);
        self.added_blocks_last_step = added_blocks;
        self.added_centrality_last_step = added_centrality;
        self.total_added_blocks += added_blocks;
        self.total_added_centrality += added_centrality;

        let total_us = total_start.elapsed().as_micros() as u64;
        info!(
            step = self.step_index,
            added_blocks,
            added_centrality,
            frontier = self.green.active_count(),
            total_us,
            "growth step"
        );
        StepOutcome {
            added_blocks,
            added_centrality,
            timings: StepTimings {
                areas_us,
                scan_us,
                total_us,
            },
        }
    }

    fn scan_cell(&mut self, cell: Cell, areas: &GreenAreas) -> Option<Development> {
        match self.green.status(cell) {
            Frontier::Active => {
                if !self.frontier_cell_may_develop(cell, areas) {
                    return None;
                }
                let p = self.rng.random::<f64>();
                if self.centre_access[cell] > 0.0 {
                    (p < self.config.build_prob && self.try_develop(cell, CellClass::Built))
                        .then_some(Development::Block)
                } else {
                    (p < self.config.cent_prob_nb && self.try_develop(cell, CellClass::Centre))
                        .then_some(Development::Centrality)
                }
            }
            _ if self.classes[cell] == CellClass::Nature => {
                let p = self.rng.random::<f64>();
                (p < self.config.cent_prob_isol && self.try_develop(cell, CellClass::Centre))
                    .then_some(Development::Centrality)
            }
            _ => None,
        }
    }

    /// Green-area and span gates. A frontier cell inside a component that is
    /// bigger than one cell yet smaller than the minimum green area is protected.
    fn frontier_cell_may_develop(&self, cell: Cell, areas: &GreenAreas) -> bool {
        let area = areas.area_at(cell);
        let cell_km2 = self.config.cell_area_km2().floor() as i64;
        if area > cell_km2 && (area as f64) < self.config.min_green_km2 {
            return false;
        }
        self.span_rule.validate_span(&self.classes, cell)
    }

    fn try_develop(&mut self, cell: Cell, class: CellClass) -> bool {
        match self
            .green
            .update_on_built(&self.classes, cell, &self.kernel)
        {
            FrontierUpdate::Committed => {
                self.commit_development(cell, class);
                true
            }
            FrontierUpdate::Rejected => false,
        }
    }
}
