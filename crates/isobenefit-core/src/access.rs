//! Walkable accessibility surfaces.
//!
//! A surface holds, per cell, the summed influence of a set of source cells,
//! where each source contributes `1 - d / walk_dist_m` to every cell closer
//! than the walking radius. Sources are added and removed incrementally, so
//! the kernel is precomputed once and applied over a bounded window.

use crate::cell::CellClass;
use crate::grid::{Cell, Grid};
use std::collections::HashMap;

/// Direction of an aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Influence {
    Add,
    Remove,
}

#[derive(Clone, Debug)]
pub struct AccessKernel {
    cell_size_m: f64,
    walk_dist_m: f64,
    /// `(d_row, d_col, weight)` for every offset strictly inside the radius.
    offsets: Vec<(isize, isize, f64)>,
}

impl AccessKernel {
    /// Both lengths must be positive and finite; `LandConfig::validate` guarantees this.
    pub fn new(cell_size_m: f64, walk_dist_m: f64) -> Self {
        Self::bounded(cell_size_m, walk_dist_m, isize::MAX as usize)
    }

    /// Kernel for a raster of `rows x cols`: offsets that can never land inside
    /// it are dropped, which leaves every aggregation unchanged.
    pub fn for_shape(cell_size_m: f64, walk_dist_m: f64, rows: usize, cols: usize) -> Self {
        Self::bounded(cell_size_m, walk_dist_m, rows.max(cols).saturating_sub(1))
    }

    fn bounded(cell_size_m: f64, walk_dist_m: f64, max_reach: usize) -> Self {
        debug_assert!(cell_size_m > 0.0 && walk_dist_m > 0.0);
        let max_reach = max_reach.min(isize::MAX as usize);
        let cells = (walk_dist_m / cell_size_m).floor();
        let reach = if cells >= max_reach as f64 {
            max_reach as isize
        } else {
            cells as isize
        };
        let mut offsets = Vec::new();
        for d_row in -reach..=reach {
            for d_col in -reach..=reach {
                let weight = Self::decay(cell_size_m, walk_dist_m, d_row, d_col);
                if weight > 0.0 {
                    offsets.push((d_row, d_col, weight));
                }
            }
        }
        Self {
            cell_size_m,
            walk_dist_m,
            offsets,
        }
    }

    fn decay(cell_size_m: f64, walk_dist_m: f64, d_row: isize, d_col: isize) -> f64 {
        let dy = d_row.unsigned_abs() as f64 * cell_size_m;
        let dx = d_col.unsigned_abs() as f64 * cell_size_m;
        let dist = dy.hypot(dx);
        if dist >= walk_dist_m {
            0.0
        } else {
            1.0 - dist / walk_dist_m
        }
    }

    pub fn walk_dist_m(&self) -> f64 {
        self.walk_dist_m
    }

    pub fn cell_size_m(&self) -> f64 {
        self.cell_size_m
    }

    /// Influence of a source at `from` on the cell `to`.
    pub fn contribution(&self, from: Cell, to: Cell) -> f64 {
        let d_row = to.row as isize - from.row as isize;
        let d_col = to.col as isize - from.col as isize;
        Self::decay(self.cell_size_m, self.walk_dist_m, d_row, d_col)
    }

    /// Number of cells a single source can reach (the window size).
    pub fn footprint(&self) -> usize {
        self.offsets.len()
    }

    /// Add or subtract the influence of a source at `center` over `surface`.
    pub fn aggregate(&self, surface: &mut Grid<f64>, center: Cell, influence: Influence) {
        self.apply(surface, center, influence, |_, _| {});
    }

    /// As [`aggregate`](Self::aggregate), recording each touched cell's prior
    /// value so the change can be inspected and rolled back.
    pub(crate) fn aggregate_journaled(
        &self,
        surface: &mut Grid<f64>,
        center: Cell,
        influence: Influence,
        journal: &mut SurfaceJournal,
    ) {
        self.apply(surface, center, influence, |idx, prior| {
            journal.record(idx, prior)
        });
    }

    fn apply(
        &self,
        surface: &mut Grid<f64>,
        center: Cell,
        influence: Influence,
        mut on_touch: impl FnMut(usize, f64),
    ) {
        let (rows, cols) = surface.shape();
        let data = surface.data_mut();
        for &(d_row, d_col, weight) in &self.offsets {
            let Some(target) = center.offset(d_row, d_col, rows, cols) else {
                continue;
            };
            let idx = target.row * cols + target.col;
            on_touch(idx, data[idx]);
            match influence {
                Influence::Add => data[idx] += weight,
                Influence::Remove => data[idx] -= weight,
            }
        }
    }
}

/// First-seen values of every cell touched during a tentative update.
#[derive(Debug, Default)]
pub(crate) struct SurfaceJournal {
    originals: HashMap<usize, f64>,
}

impl SurfaceJournal {
    fn record(&mut self, idx: usize, prior: f64) {
        self.originals.entry(idx).or_insert(prior);
    }

    /// `(flat index, value before the update)` pairs, in no particular order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.originals.iter().map(|(&idx, &v)| (idx, v))
    }

    /// Restore every touched cell to its value before the update.
    pub(crate) fn rollback(self, surface: &mut Grid<f64>) {
        let data = surface.data_mut();
        for (idx, original) in self.originals {
            data[idx] = original;
        }
    }
}

/// Build the centrality access surface from every Centre cell.
pub fn compute_centre_access(classes: &Grid<CellClass>, kernel: &AccessKernel) -> Grid<f64> {
    let mut surface = classes.same_shape(0.0);
    for (cell, &class) in classes.iter() {
        if class == CellClass::Centre {
            kernel.aggregate(&mut surface, cell, Influence::Add);
        }
    }
    surface
}
