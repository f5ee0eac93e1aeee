use crate::access::AccessKernel;
use crate::grid::{Cell, Grid};
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};

/// A source cell positioned in metres (`[row * cell_size, col * cell_size]`).
pub type SourcePoint = GeomWithData<[f64; 2], Cell>;

fn position(cell: Cell, cell_size_m: f64) -> [f64; 2] {
    [cell.row as f64 * cell_size_m, cell.col as f64 * cell_size_m]
}

/// Build an R*-tree over source cells via bulk_load (O(n log n)).
pub fn build_index(sources: impl IntoIterator<Item = Cell>, cell_size_m: f64) -> RTree<SourcePoint> {
    let points = sources
        .into_iter()
        .map(|cell| SourcePoint::new(position(cell, cell_size_m), cell))
        .collect();
    RTree::bulk_load(points)
}

/// Sources within `radius` metres of `cell`.
/// Uses AABB envelope query then filters by Euclidean distance.
pub fn query_sources(
    tree: &RTree<SourcePoint>,
    cell: Cell,
    cell_size_m: f64,
    radius: f64,
) -> impl Iterator<Item = Cell> + '_ {
    let center = position(cell, cell_size_m);
    let envelope = AABB::from_corners(
        [center[0] - radius, center[1] - radius],
        [center[0] + radius, center[1] + radius],
    );
    let r_sq = radius * radius;
    tree.locate_in_envelope(&envelope)
        .filter(move |source| {
            let dy = source.geom()[0] - center[0];
            let dx = source.geom()[1] - center[1];
            dy * dy + dx * dx <= r_sq
        })
        .map(|source| source.data)
}

/// Rebuild a surface from scratch: every cell sums the decayed influence of
/// each source within the walking radius. Rows are independent and are
/// evaluated in parallel.
pub fn recompute_surface(
    rows: usize,
    cols: usize,
    sources: impl IntoIterator<Item = Cell>,
    kernel: &AccessKernel,
) -> Grid<f64> {
    let cell_size_m = kernel.cell_size_m();
    let tree = build_index(sources, cell_size_m);
    let mut surface = Grid::filled(rows, cols, 0.0);
    surface
        .data_mut()
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, values)| {
            for (col, value) in values.iter_mut().enumerate() {
                let cell = Cell::new(row, col);
                *value = query_sources(&tree, cell, cell_size_m, kernel.walk_dist_m())
                    .map(|source| kernel.contribution(source, cell))
                    .sum();
            }
        });
    surface
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Influence;

    #[test]
    fn query_filters_envelope_corners() {
        let sources = [Cell::new(0, 0), Cell::new(3, 3), Cell::new(0, 3)];
        let tree = build_index(sources, 100.0);
        let mut found: Vec<Cell> = query_sources(&tree, Cell::new(0, 0), 100.0, 300.0).collect();
        found.sort();
        // (3, 3) lies inside the square envelope but 424 m away.
        assert_eq!(found, vec![Cell::new(0, 0), Cell::new(0, 3)]);
    }

    #[test]
    fn recomputation_matches_incremental_aggregation() {
        let kernel = AccessKernel::new(100.0, 350.0);
        let sources = [Cell::new(1, 1), Cell::new(4, 6), Cell::new(8, 2), Cell::new(4, 5)];
        let mut incremental = Grid::filled(10, 9, 0.0);
        for &cell in &sources {
            kernel.aggregate(&mut incremental, cell, Influence::Add);
        }
        let rebuilt = recompute_surface(10, 9, sources, &kernel);
        for (a, b) in incremental.data().iter().zip(rebuilt.data()) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn no_sources_gives_zero_surface() {
        let kernel = AccessKernel::new(100.0, 500.0);
        let rebuilt = recompute_surface(4, 4, std::iter::empty(), &kernel);
        assert!(rebuilt.data().iter().all(|&v| v == 0.0));
    }
}
