use crate::cell::CellClass;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Row/column index into a [`Grid`]. `row` is the y index, `col` the x index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset by a signed delta, or `None` if it would leave the `rows x cols` raster.
    pub fn offset(self, d_row: isize, d_col: isize, rows: usize, cols: usize) -> Option<Cell> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        (row < rows && col < cols).then_some(Cell { row, col })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    Empty,
    ShapeMismatch { expected: usize, actual: usize },
    UnknownClassCode { index: usize, code: i16 },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::Empty => write!(f, "grid must have at least one row and one column"),
            GridError::ShapeMismatch { expected, actual } => write!(
                f,
                "grid data length ({actual}) must equal rows * cols ({expected})"
            ),
            GridError::UnknownClassCode { index, code } => {
                write!(f, "unknown cell class code {code} at flat index {index}")
            }
        }
    }
}

impl Error for GridError {}

/// Dense row-major 2-D raster.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// A grid of the same shape as `self`, filled with `value`.
    pub fn same_shape<U: Clone>(&self, value: U) -> Grid<U> {
        Grid::filled(self.rows, self.cols, value)
    }
}

impl<T> Grid<T> {
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::Empty);
        }
        let expected = rows.checked_mul(cols).ok_or(GridError::ShapeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;
        if data.len() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    pub fn index_of(&self, cell: Cell) -> usize {
        debug_assert!(self.contains(cell), "{cell:?} outside {}x{}", self.rows, self.cols);
        cell.row * self.cols + cell.col
    }

    pub fn cell_at(&self, index: usize) -> Cell {
        Cell {
            row: index / self.cols,
            col: index % self.cols,
        }
    }

    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.contains(cell)
            .then(|| &self.data[cell.row * self.cols + cell.col])
    }

    pub fn set(&mut self, cell: Cell, value: T) {
        let idx = self.index_of(cell);
        self.data[idx] = value;
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Cell { row, col }))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (self.cell_at(i), v))
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Copy> Grid<T> {
    /// Copy of column `col`, top to bottom.
    pub fn column(&self, col: usize) -> Vec<T> {
        (0..self.rows)
            .map(|row| self.data[row * self.cols + col])
            .collect()
    }
}

impl<T> std::ops::Index<Cell> for Grid<T> {
    type Output = T;

    fn index(&self, cell: Cell) -> &T {
        &self.data[self.index_of(cell)]
    }
}

impl<T> std::ops::IndexMut<Cell> for Grid<T> {
    fn index_mut(&mut self, cell: Cell) -> &mut T {
        let idx = self.index_of(cell);
        &mut self.data[idx]
    }
}

impl Grid<CellClass> {
    /// Decode a raw class raster (`-1` out of bounds, `0` nature, `1` built, `2` centre).
    pub fn from_class_codes(rows: usize, cols: usize, codes: &[i16]) -> Result<Self, GridError> {
        let classes = codes
            .iter()
            .enumerate()
            .map(|(index, &code)| {
                CellClass::try_from(code).map_err(|code| GridError::UnknownClassCode { index, code })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_vec(rows, cols, classes)
    }

    /// `true` cells lie inside the study extents and start as Nature.
    pub fn from_inclusion_mask(rows: usize, cols: usize, mask: &[bool]) -> Result<Self, GridError> {
        let classes = mask
            .iter()
            .map(|&inside| {
                if inside {
                    CellClass::Nature
                } else {
                    CellClass::OutOfBounds
                }
            })
            .collect();
        Self::from_vec(rows, cols, classes)
    }

    pub fn count(&self, class: CellClass) -> usize {
        self.data.iter().filter(|&&c| c == class).count()
    }
}

/// Affine geotransform mapping array indices to real-world coordinates:
/// `x = a*col + b*row + c`, `y = d*col + e*row + f`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform with square cells and the top-left corner at `(west, north)`.
    pub fn north_up(west: f64, north: f64, cell_size: f64) -> Self {
        Self::new(cell_size, 0.0, west, 0.0, -cell_size, north)
    }

    pub fn from_coefficients(c: [f64; 6]) -> Self {
        Self::new(c[0], c[1], c[2], c[3], c[4], c[5])
    }

    pub fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det != 0.0
    }

    /// Real-world coordinates of the centre of `cell`.
    pub fn xy(&self, cell: Cell) -> (f64, f64) {
        let col = cell.col as f64 + 0.5;
        let row = cell.row as f64 + 0.5;
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Signed `(row, col)` containing the real-world point, flooring fractional
    /// indices. `None` when the transform is singular or the point (or its
    /// image) is not finite.
    pub fn rowcol(&self, x: f64, y: f64) -> Option<(isize, isize)> {
        if !self.is_invertible() || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let det = self.determinant();
        let dx = x - self.c;
        let dy = y - self.f;
        let col = (self.e * dx - self.b * dy) / det;
        let row = (-self.d * dx + self.a * dy) / det;
        if !row.is_finite() || !col.is_finite() {
            return None;
        }
        Some((row.floor() as isize, col.floor() as isize))
    }
}
