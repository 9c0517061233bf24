use std::fmt;

use serde::{Deserialize, Serialize};

use super::{color::ColorId, shape::PieceShape};

/// A single board cell.
///
/// A cell carries a color tag exactly when it is filled, which the
/// `Option` encodes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell(Option<ColorId>);

impl Cell {
    pub const EMPTY: Self = Self(None);

    #[must_use]
    pub const fn filled(color: ColorId) -> Self {
        Self(Some(color))
    }

    #[must_use]
    pub const fn is_filled(self) -> bool {
        self.0.is_some()
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0.is_none()
    }

    #[must_use]
    pub const fn color(self) -> Option<ColorId> {
        self.0
    }
}

/// Indices of the rows and columns that are completely filled.
///
/// Rows and columns are detected independently, so a cell may belong to both a
/// full row and a full column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullLines {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl FullLines {
    /// Total number of lines (rows plus columns).
    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.len() + self.cols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.cols.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BoardError {
    #[display("board size must be positive")]
    ZeroSize,
    #[display("expected {expected} cells for the board, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
}

/// Square occupancy grid.
///
/// Coordinates are `(x, y)` with `x` the column and `y` the row, both counted
/// from the top-left corner. Origins are signed so that callers can ask about
/// placements that hang off the top or left edge; those are simply invalid.
///
/// # Example
///
/// ```
/// use block_bloom_engine::{Board, ColorId, PieceShape};
///
/// let mut board = Board::new(10);
/// let square = PieceShape::parse(["##", "##"]).unwrap();
///
/// assert!(board.can_place(&square, 8, 8));
/// assert!(!board.can_place(&square, 9, 9));
///
/// board.place(&square, 8, 8, ColorId::new(0));
/// assert!(!board.can_place(&square, 7, 7));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Default side length.
    pub const DEFAULT_SIZE: usize = 10;
    /// Largest side length a configuration may ask for.
    pub const MAX_SIZE: usize = 256;

    /// Creates an empty board of `size`×`size` cells.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    #[must_use]
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "board size must be positive");
        Self {
            size,
            cells: vec![Cell::EMPTY; size * size],
        }
    }

    /// Rebuilds a board from its row-major cells.
    pub fn from_cells(size: usize, cells: Vec<Cell>) -> Result<Self, BoardError> {
        if size == 0 {
            return Err(BoardError::ZeroSize);
        }
        if cells.len() != size * size {
            return Err(BoardError::CellCountMismatch {
                expected: size * size,
                actual: cells.len(),
            });
        }
        Ok(Self { size, cells })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Row-major view of every cell.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.size)
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        (x < self.size && y < self.size).then(|| self.cells[y * self.size + x])
    }

    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_filled()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    fn index_of(&self, x: i64, y: i64) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.size && y < self.size).then_some(y * self.size + x)
    }

    /// Checks whether `shape` fits with its top-left corner at `(x, y)`.
    ///
    /// Every occupied cell of the shape must land inside the board on an
    /// unfilled cell. Out-of-bounds and collision failures are not
    /// distinguished.
    #[must_use]
    pub fn can_place(&self, shape: &PieceShape, x: i32, y: i32) -> bool {
        shape.cells().iter().all(|offset| {
            self.index_of(
                i64::from(x) + i64::from(offset.dx),
                i64::from(y) + i64::from(offset.dy),
            )
            .is_some_and(|i| self.cells[i].is_empty())
        })
    }

    /// Fills the cells of `shape` at `(x, y)` with `color`.
    ///
    /// # Panics
    ///
    /// The placement must have been validated with [`Self::can_place`]. Placing
    /// out of bounds panics; overlapping a filled cell trips a debug assertion.
    pub fn place(&mut self, shape: &PieceShape, x: i32, y: i32, color: ColorId) {
        debug_assert!(
            self.can_place(shape, x, y),
            "invalid placement at ({x}, {y}):\n{shape}\non board:\n{self}"
        );
        for offset in shape.cells() {
            let i = self
                .index_of(
                    i64::from(x) + i64::from(offset.dx),
                    i64::from(y) + i64::from(offset.dy),
                )
                .expect("placement must be validated with can_place");
            self.cells[i] = Cell::filled(color);
        }
    }

    fn is_row_full(&self, y: usize) -> bool {
        self.cells[y * self.size..][..self.size]
            .iter()
            .all(|c| c.is_filled())
    }

    fn is_col_full(&self, x: usize) -> bool {
        (0..self.size).all(|y| self.cells[y * self.size + x].is_filled())
    }

    /// Finds every completely filled row and column.
    #[must_use]
    pub fn detect_full_lines(&self) -> FullLines {
        FullLines {
            rows: (0..self.size).filter(|&y| self.is_row_full(y)).collect(),
            cols: (0..self.size).filter(|&x| self.is_col_full(x)).collect(),
        }
    }

    /// Empties every cell belonging to any listed row or column.
    ///
    /// Intersections are cleared once. Returns the number of cells that were
    /// filled before the call.
    pub fn clear_lines(&mut self, lines: &FullLines) -> usize {
        let size = self.size;
        let mut cleared = 0;
        for (i, cell) in self.cells.iter_mut().enumerate() {
            let (x, y) = (i % size, i / size);
            if (lines.rows.contains(&y) || lines.cols.contains(&x)) && cell.is_filled() {
                *cell = Cell::EMPTY;
                cleared += 1;
            }
        }
        cleared
    }

    /// Empties every in-bounds cell within Chebyshev distance `radius` of
    /// `(cx, cy)`. Returns the number of cells that were filled.
    pub fn clear_area(&mut self, cx: i32, cy: i32, radius: u32) -> usize {
        let r = i64::from(radius);
        let last = i64::try_from(self.size).unwrap_or(i64::MAX) - 1;
        let span = |c: i32| (i64::from(c) - r).max(0)..=(i64::from(c) + r).min(last);
        let mut cleared = 0;
        for y in span(cy) {
            for x in span(cx) {
                if let Some(i) = self.index_of(x, y)
                    && self.cells[i].is_filled()
                {
                    self.cells[i] = Cell::EMPTY;
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Iterates over every origin at which `shape` can be placed, in row-major
    /// order.
    pub fn placements<'a>(
        &'a self,
        shape: &'a PieceShape,
    ) -> impl Iterator<Item = (i32, i32)> + 'a {
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let n = self.size as i32;
        (0..n)
            .flat_map(move |y| (0..n).map(move |x| (x, y)))
            .filter(move |&(x, y)| self.can_place(shape, x, y))
    }

    /// Whether `shape` fits anywhere on the board.
    ///
    /// Exhaustive over all `N²` origins; stops at the first fit.
    #[must_use]
    pub fn has_any_placement(&self, shape: &PieceShape) -> bool {
        self.placements(shape).next().is_some()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (y, row) in self.rows().enumerate() {
            if y > 0 {
                writeln!(f)?;
            }
            for cell in row {
                f.write_str(if cell.is_filled() { "#" } else { "." })?;
            }
        }
        Ok(())
    }
}
