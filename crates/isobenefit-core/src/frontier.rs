//! Green interface tracking.
//!
//! The frontier is the set of Nature cells rook-adjacent to development. Each
//! frontier cell radiates green access; the tracker keeps the green access
//! surface equal to the summed influence of every contributing frontier cell,
//! and refuses any development that would cut a cell off from green access
//! entirely.

use crate::access::{AccessKernel, Influence, SurfaceJournal};
use crate::cell::{CellClass, Frontier};
use crate::grid::{Cell, Grid};
use crate::neighbors::{neighbors, Connectivity};
use tracing::debug;

/// Access at or below this value counts as none.
pub const ACCESS_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrontierUpdate {
    Committed,
    /// The update would have stranded a cell from all green space; nothing changed
    /// except that the candidate is now tombstoned.
    Rejected,
}

#[derive(Clone, Debug)]
pub struct GreenInterface {
    marks: Grid<Frontier>,
    access: Grid<f64>,
}

impl GreenInterface {
    /// Bootstrap the frontier and green access from every developed cell, in row-major order.
    pub fn initialize(classes: &Grid<CellClass>, kernel: &AccessKernel) -> Self {
        let mut interface = Self {
            marks: classes.same_shape(Frontier::Inactive),
            access: classes.same_shape(0.0),
        };
        for cell in classes.cells() {
            if classes[cell].is_developed() {
                let outcome = interface.update_on_built(classes, cell, kernel);
                // Access only grows while bootstrapping.
                debug_assert_eq!(outcome, FrontierUpdate::Committed);
            }
        }
        interface
    }

    pub fn marks(&self) -> &Grid<Frontier> {
        &self.marks
    }

    pub fn access(&self) -> &Grid<f64> {
        &self.access
    }

    pub fn status(&self, cell: Cell) -> Frontier {
        self.marks[cell]
    }

    pub fn active_count(&self) -> usize {
        self.marks.data().iter().filter(|m| m.is_active()).count()
    }

    pub fn tombstoned_count(&self) -> usize {
        self.marks
            .data()
            .iter()
            .filter(|&&m| m == Frontier::Tombstoned)
            .count()
    }

    /// Cells whose influence is folded into the green access surface.
    pub fn contributing_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.marks
            .iter()
            .filter(|(_, m)| m.contributes())
            .map(|(cell, _)| cell)
    }

    /// Re-derive frontier membership and green access for `cell` becoming developed.
    ///
    /// `classes` must still show `cell` in its pre-development class; the caller
    /// commits the new class only on [`FrontierUpdate::Committed`].
    pub(crate) fn update_on_built(
        &mut self,
        classes: &Grid<CellClass>,
        cell: Cell,
        kernel: &AccessKernel,
    ) -> FrontierUpdate {
        let mut journal = SurfaceJournal::default();
        let mut prior_marks: Vec<(Cell, Frontier)> = Vec::with_capacity(5);

        let was = self.marks[cell];
        if was.contributes() {
            prior_marks.push((cell, was));
            self.marks[cell] = Frontier::Inactive;
            kernel.aggregate_journaled(&mut self.access, cell, Influence::Remove, &mut journal);
        }

        for nb in neighbors(classes.rows(), classes.cols(), cell, Connectivity::Rook) {
            if classes[nb] == CellClass::Nature && self.marks[nb] == Frontier::Inactive {
                prior_marks.push((nb, Frontier::Inactive));
                self.marks[nb] = Frontier::Active;
                kernel.aggregate_journaled(&mut self.access, nb, Influence::Add, &mut journal);
            }
        }

        if self.strands_any(&journal) {
            journal.rollback(&mut self.access);
            for (restored, mark) in prior_marks.into_iter().rev() {
                self.marks[restored] = mark;
            }
            // Only removing the candidate's own influence can lower access,
            // so a rejected candidate was contributing and stays that way.
            self.marks[cell] = Frontier::Tombstoned;
            debug!(row = cell.row, col = cell.col, "green access would be stranded; frontier cell tombstoned");
            return FrontierUpdate::Rejected;
        }
        FrontierUpdate::Committed
    }

    /// Whether any touched cell went from positive access to none.
    fn strands_any(&self, journal: &SurfaceJournal) -> bool {
        let data = self.access.data();
        journal.entries().any(|(idx, old)| {
            let new = data[idx];
            new < old && old > ACCESS_EPSILON && new <= ACCESS_EPSILON
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::recompute_surface;

    fn strip(codes: &[i16]) -> Grid<CellClass> {
        Grid::from_class_codes(1, codes.len(), codes).unwrap()
    }

    fn assert_matches_recomputation(interface: &GreenInterface, kernel: &AccessKernel) {
        let (rows, cols) = interface.access().shape();
        let rebuilt = recompute_surface(rows, cols, interface.contributing_cells(), kernel);
        for (a, b) in interface.access().data().iter().zip(rebuilt.data()) {
            assert!((a - b).abs() < 1e-9, "incremental {a} vs rebuilt {b}");
        }
    }

    #[test]
    fn initialize_marks_rook_neighbours_of_development() {
        let mut classes = Grid::filled(5, 5, CellClass::Nature);
        classes.set(Cell::new(2, 2), CellClass::Centre);
        classes.set(Cell::new(0, 0), CellClass::OutOfBounds);
        classes.set(Cell::new(0, 1), CellClass::Built);
        let kernel = AccessKernel::new(100.0, 300.0);
        let interface = GreenInterface::initialize(&classes, &kernel);
        let active: Vec<Cell> = interface
            .marks()
            .iter()
            .filter(|(_, m)| m.is_active())
            .map(|(c, _)| c)
            .collect();
        assert_eq!(
            active,
            vec![
                Cell::new(0, 2),
                Cell::new(1, 1),
                Cell::new(1, 2),
                Cell::new(2, 1),
                Cell::new(2, 3),
                Cell::new(3, 2),
            ]
        );
        // Out-of-bounds neighbours are never frontier.
        assert_eq!(interface.status(Cell::new(0, 0)), Frontier::Inactive);
        assert_matches_recomputation(&interface, &kernel);
    }

    #[test]
    fn development_that_strands_green_access_is_rejected() {
        // Built | N N N N N N with a 150 m radius: only the first green cell
        // reaches the built cell, so developing it would strand it.
        let classes = strip(&[1, 0, 0, 0, 0, 0, 0]);
        let kernel = AccessKernel::new(100.0, 150.0);
        let mut interface = GreenInterface::initialize(&classes, &kernel);
        let before = interface.access().clone();
        assert_eq!(interface.status(Cell::new(0, 1)), Frontier::Active);

        let outcome = interface.update_on_built(&classes, Cell::new(0, 1), &kernel);
        assert_eq!(outcome, FrontierUpdate::Rejected);
        assert_eq!(interface.access(), &before);
        assert_eq!(
            interface.status(Cell::new(0, 1)),
            Frontier::Tombstoned
        );
        assert_eq!(interface.status(Cell::new(0, 2)), Frontier::Inactive);
        assert_matches_recomputation(&interface, &kernel);
    }

    #[test]
    fn development_that_keeps_green_access_is_committed() {
        let mut classes = strip(&[1, 0, 0, 0, 0, 0, 0]);
        let kernel = AccessKernel::new(100.0, 250.0);
        let mut interface = GreenInterface::initialize(&classes, &kernel);
        let before = interface.access().clone();

        let outcome = interface.update_on_built(&classes, Cell::new(0, 1), &kernel);
        assert_eq!(outcome, FrontierUpdate::Committed);
        classes.set(Cell::new(0, 1), CellClass::Built);

        assert_eq!(interface.status(Cell::new(0, 1)), Frontier::Inactive);
        assert_eq!(interface.status(Cell::new(0, 2)), Frontier::Active);
        for (old, new) in before.data().iter().zip(interface.access().data()) {
            assert!(
                !(*old > ACCESS_EPSILON && *new <= ACCESS_EPSILON),
                "access dropped from {old} to {new}"
            );
        }
        assert_matches_recomputation(&interface, &kernel);
    }

    #[test]
    fn tombstones_are_not_reactivated_by_later_development() {
        let mut classes = strip(&[1, 0, 0, 0, 0, 0, 0]);
        let kernel = AccessKernel::new(100.0, 150.0);
        let mut interface = GreenInterface::initialize(&classes, &kernel);
        interface.update_on_built(&classes, Cell::new(0, 1), &kernel);

        // Developing the cell on the far side is independent of the tombstone.
        let outcome = interface.update_on_built(&classes, Cell::new(0, 2), &kernel);
        assert_eq!(outcome, FrontierUpdate::Committed);
        classes.set(Cell::new(0, 2), CellClass::Centre);
        assert_eq!(
            interface.status(Cell::new(0, 1)),
            Frontier::Tombstoned
        );
        assert_eq!(interface.status(Cell::new(0, 3)), Frontier::Active);
        assert_eq!(interface.tombstoned_count(), 1);
        assert_matches_recomputation(&interface, &kernel);
    }

    #[test]
    fn committed_tombstone_withdraws_its_influence() {
        let classes = strip(&[0, 0, 0, 0, 0]);
        let kernel = AccessKernel::new(100.0, 150.0);
        let mut marks = classes.same_shape(Frontier::Inactive);
        marks.set(Cell::new(0, 0), Frontier::Active);
        marks.set(Cell::new(0, 1), Frontier::Tombstoned);
        let access = recompute_surface(1, 5, [Cell::new(0, 0), Cell::new(0, 1)], &kernel);
        let mut interface = GreenInterface { marks, access };

        let outcome = interface.update_on_built(&classes, Cell::new(0, 1), &kernel);
        assert_eq!(outcome, FrontierUpdate::Committed);
        assert_eq!(interface.status(Cell::new(0, 1)), Frontier::Inactive);
        assert_eq!(interface.status(Cell::new(0, 2)), Frontier::Active);
        assert_eq!(interface.tombstoned_count(), 0);
        assert_matches_recomputation(&interface, &kernel);
    }

    #[test]
    fn plain_nature_development_only_adds_frontier() {
        let classes = strip(&[0, 0, 0, 0, 0]);
        let kernel = AccessKernel::new(100.0, 150.0);
        let mut interface = GreenInterface::initialize(&classes, &kernel);
        assert_eq!(interface.active_count(), 0);
        let outcome = interface.update_on_built(&classes, Cell::new(0, 2), &kernel);
        assert_eq!(outcome, FrontierUpdate::Committed);
        assert_eq!(interface.active_count(), 2);
        assert_matches_recomputation(&interface, &kernel);
    }
}
