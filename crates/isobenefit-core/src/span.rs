use crate::cell::CellClass;
use crate::config::LandConfig;
use crate::grid::{Cell, Grid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RayDirection {
    /// Towards index 0 (left along a row, up along a column).
    Backward,
    Forward,
}

/// Count the unbroken Nature cells next to `start` along `line`, stopping at
/// the first non-Nature cell or the end of the slice.
pub fn cast_ray(line: &[CellClass], start: usize, direction: RayDirection) -> usize {
    let is_green = |c: &&CellClass| **c == CellClass::Nature;
    match direction {
        RayDirection::Forward => line
            .get(start + 1..)
            .map_or(0, |rest| rest.iter().take_while(is_green).count()),
        RayDirection::Backward => line[..start.min(line.len())]
            .iter()
            .rev()
            .take_while(is_green)
            .count(),
    }
}

/// Minimum green span widths expressed in cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpanRule {
    long_cells: f64,
    short_cells: f64,
}

impl SpanRule {
    pub fn new(cell_size_m: f64, min_long_span_m: f64, min_short_span_m: f64) -> Self {
        Self {
            long_cells: min_long_span_m / cell_size_m,
            short_cells: min_short_span_m / cell_size_m,
        }
    }

    pub fn from_config(config: &LandConfig) -> Self {
        Self::new(
            config.cell_size_m,
            config.min_long_green_span_m,
            config.min_short_green_span_m,
        )
    }

    /// Whether developing `cell` keeps the green spans through it wide enough.
    ///
    /// A side already closed off by development (a zero ray) may always be
    /// filled; otherwise the narrower side of each axis must reach the short
    /// span, the longest axis must reach the long span and the other axis the
    /// short span.
    pub fn validate_span(&self, classes: &Grid<CellClass>, cell: Cell) -> bool {
        let row = classes.row(cell.row);
        let column = classes.column(cell.col);
        let x_rays = sorted_pair(
            cast_ray(row, cell.col, RayDirection::Backward),
            cast_ray(row, cell.col, RayDirection::Forward),
        );
        let y_rays = sorted_pair(
            cast_ray(&column, cell.row, RayDirection::Backward),
            cast_ray(&column, cell.row, RayDirection::Forward),
        );
        self.accepts(x_rays, y_rays)
    }

    fn accepts(&self, x_rays: [usize; 2], y_rays: [usize; 2]) -> bool {
        for [narrow, _] in [x_rays, y_rays] {
            if narrow != 0 && (narrow as f64) < self.short_cells {
                return false;
            }
        }
        let [second, longest] = sorted_pair(x_rays[1], y_rays[1]);
        (longest as f64) >= self.long_cells && (second as f64) >= self.short_cells
    }
}

fn sorted_pair(a: usize, b: usize) -> [usize; 2] {
    [a.min(b), a.max(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> SpanRule {
        SpanRule::new(100.0, 500.0, 100.0)
    }

    #[test]
    fn rays_stop_at_development_and_edges() {
        use CellClass::*;
        let line = [Nature, Built, Nature, Nature, Nature, OutOfBounds, Nature];
        assert_eq!(cast_ray(&line, 3, RayDirection::Backward), 1);
        assert_eq!(cast_ray(&line, 3, RayDirection::Forward), 1);
        assert_eq!(cast_ray(&line, 2, RayDirection::Backward), 0);
        assert_eq!(cast_ray(&line, 6, RayDirection::Forward), 0);
        assert_eq!(cast_ray(&line, 0, RayDirection::Backward), 0);
        let open = [Nature; 5];
        assert_eq!(cast_ray(&open, 0, RayDirection::Forward), 4);
        assert_eq!(cast_ray(&open, 4, RayDirection::Backward), 4);
    }

    #[test]
    fn single_sided_closure_passes() {
        // Six green cells left and up, development directly right and below.
        let mut classes = Grid::filled(8, 8, CellClass::Nature);
        classes.set(Cell::new(6, 7), CellClass::Built);
        classes.set(Cell::new(7, 6), CellClass::Built);
        assert!(rule().validate_span(&classes, Cell::new(6, 6)));
    }

    #[test]
    fn short_green_in_every_direction_fails() {
        let mut classes = Grid::filled(5, 5, CellClass::Nature);
        for cell in [
            Cell::new(2, 0),
            Cell::new(2, 4),
            Cell::new(0, 2),
            Cell::new(4, 2),
        ] {
            classes.set(cell, CellClass::Built);
        }
        assert!(!rule().validate_span(&classes, Cell::new(2, 2)));
    }

    #[test]
    fn narrow_side_below_short_span_fails() {
        let rule = SpanRule::new(100.0, 500.0, 200.0);
        assert!(!rule.accepts([1, 8], [0, 8]));
        assert!(rule.accepts([2, 8], [0, 8]));
    }

    #[test]
    fn longest_axis_must_reach_long_span() {
        assert!(!rule().accepts([0, 4], [0, 4]));
        assert!(rule().accepts([0, 5], [0, 1]));
    }

    #[test]
    fn second_axis_must_reach_short_span() {
        // Enclosed on both sides of one axis: the other axis alone cannot pass.
        assert!(!rule().accepts([0, 9], [0, 0]));
    }

    #[test]
    fn rule_reads_spans_from_config() {
        let config = LandConfig {
            cell_size_m: 50.0,
            min_long_green_span_m: 500.0,
            min_short_green_span_m: 100.0,
            ..LandConfig::default()
        };
        assert_eq!(SpanRule::from_config(&config), SpanRule::new(50.0, 500.0, 100.0));
        let rule = SpanRule::from_config(&config);
        assert!(!rule.accepts([0, 9], [0, 2]));
        assert!(rule.accepts([0, 10], [0, 2]));
    }
}
