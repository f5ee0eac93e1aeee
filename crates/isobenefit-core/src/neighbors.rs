use crate::cell::CellClass;
use crate::grid::{Cell, Grid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
    /// 4-connected.
    Rook,
    /// 8-connected.
    Queen,
}

const ROOK_OFFSETS: [(isize, isize); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

// Walks the ring in a fixed circular order so adjacent entries are adjacent cells.
const QUEEN_OFFSETS: [(isize, isize); 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
];

/// In-bounds neighbours of `cell` in ring order. Neighbours that would fall
/// off the raster are omitted, there is no wraparound or padding.
pub fn neighbors(
    rows: usize,
    cols: usize,
    cell: Cell,
    connectivity: Connectivity,
) -> impl Iterator<Item = Cell> {
    let offsets: &'static [(isize, isize)] = match connectivity {
        Connectivity::Rook => &ROOK_OFFSETS,
        Connectivity::Queen => &QUEEN_OFFSETS,
    };
    offsets
        .iter()
        .filter_map(move |&(dr, dc)| cell.offset(dr, dc, rows, cols))
}

/// Longest run and number of distinct runs of `targets` classes around the
/// queen ring of `cell`, treating a complete ring as circular.
pub fn count_contiguous_runs(
    classes: &Grid<CellClass>,
    cell: Cell,
    targets: &[CellClass],
) -> (usize, usize) {
    let ring: Vec<bool> = neighbors(classes.rows(), classes.cols(), cell, Connectivity::Queen)
        .map(|nb| targets.contains(&classes[nb]))
        .collect();
    runs_in_ring(&ring)
}

pub(crate) fn runs_in_ring(ring: &[bool]) -> (usize, usize) {
    let mut runs: Vec<usize> = Vec::with_capacity(4);
    let mut run = 0;
    for &hit in ring {
        if hit {
            run += 1;
        } else if run > 0 {
            runs.push(run);
            run = 0;
        }
    }
    if run > 0 {
        runs.push(run);
    }
    // Only a full ring closes on itself; border cells have a broken ring.
    if runs.len() > 1 && ring.len() == QUEEN_OFFSETS.len() && ring[0] && ring[ring.len() - 1] {
        if let Some(last) = runs.pop() {
            runs[0] += last;
        }
    }
    match runs.iter().max() {
        Some(&longest) => (longest, runs.len()),
        None => (0, 0),
    }
}
