use crate::cell::CellClass;
use crate::grid::{Cell, Grid};
use crate::neighbors::{neighbors, Connectivity};
use std::collections::VecDeque;

/// Area value for cells that are not part of any green component.
pub const NOT_GREEN: i64 = -1;

/// Per-step labelling of 4-connected Nature components.
#[derive(Clone, Debug, PartialEq)]
pub struct GreenAreas {
    /// Each Nature cell holds its component's area in whole km²; others hold [`NOT_GREEN`].
    pub areas: Grid<i64>,
    pub component_count: usize,
    pub largest_km2: i64,
}

impl GreenAreas {
    pub fn area_at(&self, cell: Cell) -> i64 {
        self.areas[cell]
    }
}

/// Label every green component and rasterise its floored area back onto the grid.
///
/// Connectivity can change anywhere when a single cell develops, so this is a
/// full pass rather than an incremental update.
pub fn label_green_areas(classes: &Grid<CellClass>, cell_size_m: f64) -> GreenAreas {
    let (rows, cols) = classes.shape();
    let cell_area_m2 = cell_size_m * cell_size_m;
    let mut areas = classes.same_shape(NOT_GREEN);
    let mut visited = classes.same_shape(false);
    let mut queue = VecDeque::new();
    let mut members = Vec::new();
    let mut component_count = 0;
    let mut largest_km2 = NOT_GREEN;

    for seed in classes.cells() {
        if classes[seed] != CellClass::Nature || visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);
        members.clear();
        while let Some(cell) = queue.pop_front() {
            members.push(cell);
            for nb in neighbors(rows, cols, cell, Connectivity::Rook) {
                if classes[nb] == CellClass::Nature && !visited[nb] {
                    visited[nb] = true;
                    queue.push_back(nb);
                }
            }
        }
        let km2 = (members.len() as f64 * cell_area_m2 / 1_000_000.0).floor() as i64;
        for &cell in &members {
            areas[cell] = km2;
        }
        component_count += 1;
        largest_km2 = largest_km2.max(km2);
    }

    GreenAreas {
        areas,
        component_count,
        largest_km2,
    }
}
