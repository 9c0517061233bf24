use std::{collections::HashSet, fmt};

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

/// Largest bounding box side a shape may have.
pub const MAX_SHAPE_SIDE: usize = 5;

const MAX_SHAPE_CELLS: usize = MAX_SHAPE_SIDE * MAX_SHAPE_SIDE;

/// Offset of an occupied cell relative to the top-left of a shape's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellOffset {
    pub dx: u8,
    pub dy: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ShapeError {
    #[display("shape has no rows")]
    NoRows,
    #[display("row {row} has length {len}, expected {expected}")]
    Ragged {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[display(
        "shape is {width}x{height}, larger than the {}x{} limit",
        MAX_SHAPE_SIDE,
        MAX_SHAPE_SIDE
    )]
    TooLarge { width: usize, height: usize },
    #[display("shape has no occupied cells")]
    NoCells,
    #[display("invalid shape character {_0:?} (use '#' or '1' for filled, '.' or '0' for empty)")]
    InvalidChar(#[error(not(source))] char),
}

/// Polyomino shape as a rectangular occupancy matrix.
///
/// Stored as the list of occupied offsets in row-major order, which is the
/// order every placement check and fill walks them in. Serializes as rows of
/// `#`/`.` characters, e.g. `["#.", "##"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PieceShape {
    width: u8,
    height: u8,
    cells: ArrayVec<CellOffset, MAX_SHAPE_CELLS>,
}

impl PieceShape {
    /// Parses a shape from its rows.
    ///
    /// # Example
    ///
    /// ```
    /// use block_bloom_engine::PieceShape;
    ///
    /// let l = PieceShape::parse(["#.", "##"]).unwrap();
    /// assert_eq!((l.width(), l.height()), (2, 2));
    /// assert_eq!(l.cell_count(), 3);
    /// ```
    pub fn parse<I, S>(rows: I) -> Result<Self, ShapeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut width = None;
        let mut height = 0;
        let mut cells = ArrayVec::new();

        for (dy, row) in rows.into_iter().enumerate() {
            let row = row.as_ref();
            let len = row.chars().count();
            let expected = *width.get_or_insert(len);
            if len != expected {
                return Err(ShapeError::Ragged { row: dy, len, expected });
            }
            if len > MAX_SHAPE_SIDE || dy >= MAX_SHAPE_SIDE {
                return Err(ShapeError::TooLarge {
                    width: len,
                    height: dy + 1,
                });
            }
            for (dx, c) in row.chars().enumerate() {
                match c {
                    '#' | '1' => {
                        #[expect(clippy::cast_possible_truncation)]
                        cells.push(CellOffset {
                            dx: dx as u8,
                            dy: dy as u8,
                        });
                    }
                    '.' | '0' => {}
                    c => return Err(ShapeError::InvalidChar(c)),
                }
            }
            height = dy + 1;
        }

        let Some(width) = width else {
            return Err(ShapeError::NoRows);
        };
        if cells.is_empty() {
            return Err(ShapeError::NoCells);
        }

        #[expect(clippy::cast_possible_truncation)]
        let (width, height) = (width as u8, height as u8);
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    #[must_use]
    pub fn height(&self) -> usize {
        usize::from(self.height)
    }

    /// Occupied offsets in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[CellOffset] {
        &self.cells
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_occupied(&self, dx: usize, dy: usize) -> bool {
        self.cells
            .iter()
            .any(|c| usize::from(c.dx) == dx && usize::from(c.dy) == dy)
    }

    /// Renders each row as `#`/`.` characters.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.height()).map(move |dy| {
            (0..self.width())
                .map(|dx| if self.is_occupied(dx, dy) { '#' } else { '.' })
                .collect()
        })
    }
}

impl TryFrom<Vec<String>> for PieceShape {
    type Error = ShapeError;

    fn try_from(rows: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(rows)
    }
}

impl From<PieceShape> for Vec<String> {
    fn from(shape: PieceShape) -> Self {
        shape.rows().collect()
    }
}

impl fmt::Display for PieceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(&row)?;
        }
        Ok(())
    }
}

/// A named shape with its relative spawn weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub shape: PieceShape,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CatalogError {
    #[display("catalog has no shapes")]
    Empty,
    #[display("shape name {_0:?} appears more than once")]
    DuplicateName(#[error(not(source))] String),
    #[display("shape {_0:?} has zero weight")]
    ZeroWeight(#[error(not(source))] String),
}

/// The fixed, ordered set of shapes pieces are drawn from.
///
/// Order matters: the weighted draw walks entries in catalog order, so the same
/// random value always selects the same shape for a given catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CatalogEntry>", into = "Vec<CatalogEntry>")]
pub struct PieceCatalog {
    entries: Vec<CatalogEntry>,
    total_weight: u64,
}

impl Default for PieceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Name, rows and weight of every shape in the standard catalog.
const STANDARD_SHAPES: [(&str, &[&str], u32); 28] = [
    ("dot", &["#"], 5),
    ("domino_h", &["##"], 8),
    ("domino_v", &["#", "#"], 8),
    ("tromino_i_h", &["###"], 10),
    ("tromino_i_v", &["#", "#", "#"], 10),
    ("tromino_l1", &["#.", "##"], 10),
    ("tromino_l2", &[".#", "##"], 10),
    ("tromino_l3", &["##", "#."], 10),
    ("tromino_l4", &["##", ".#"], 10),
    ("tetro_i_h", &["####"], 12),
    ("tetro_i_v", &["#", "#", "#", "#"], 12),
    ("tetro_o", &["##", "##"], 12),
    ("tetro_t1", &["###", ".#."], 12),
    ("tetro_t2", &[".#.", "###"], 12),
    ("tetro_t3", &["#.", "##", "#."], 12),
    ("tetro_t4", &[".#", "##", ".#"], 12),
    ("tetro_s1", &[".##", "##."], 12),
    ("tetro_s2", &["##.", ".##"], 12),
    ("tetro_l1", &["#..", "###"], 12),
    ("tetro_l2", &["..#", "###"], 12),
    ("tetro_l3", &["###", "#.."], 12),
    ("tetro_l4", &["###", "..#"], 12),
    ("pento_i_h", &["#####"], 6),
    ("pento_i_v", &["#", "#", "#", "#", "#"], 6),
    ("pento_plus", &[".#.", "###", ".#."], 6),
    ("pento_u", &["#.#", "###"], 6),
    ("big_l", &["#..", "#..", "###"], 3),
    ("big_square", &["###", "###", "###"], 2),
];

impl PieceCatalog {
    /// Builds a catalog, validating names and weights.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut names = HashSet::new();
        for entry in &entries {
            if !names.insert(entry.name.as_str()) {
                return Err(CatalogError::DuplicateName(entry.name.clone()));
            }
            if entry.weight == 0 {
                return Err(CatalogError::ZeroWeight(entry.name.clone()));
            }
        }
        let total_weight = entries.iter().map(|e| u64::from(e.weight)).sum();
        Ok(Self {
            entries,
            total_weight,
        })
    }

    /// The canonical shape set: dot through pentominoes plus the two large
    /// 3×3-bounded shapes.
    ///
    /// # Panics
    ///
    /// Never in practice; the built-in table is well-formed.
    #[must_use]
    pub fn standard() -> Self {
        let entries = STANDARD_SHAPES
            .iter()
            .map(|(name, rows, weight)| CatalogEntry {
                name: (*name).to_owned(),
                shape: PieceShape::parse(rows.iter()).expect("standard shapes are well-formed"),
                weight: *weight,
            })
            .collect();
        Self::new(entries).expect("standard catalog is well-formed")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> + '_ {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Cumulative-weight draw for a `unit` value in `[0, 1)`.
    ///
    /// Computes `r = unit * total_weight` and subtracts each entry's weight in
    /// catalog order until `r <= 0`. If floating-point rounding leaves `r`
    /// positive after the last entry, the first entry is returned.
    #[must_use]
    pub fn pick(&self, unit: f64) -> &CatalogEntry {
        #[expect(clippy::cast_precision_loss)]
        let mut remaining = unit * self.total_weight as f64;
        for entry in &self.entries {
            remaining -= f64::from(entry.weight);
            if remaining <= 0.0 {
                return entry;
            }
        }
        &self.entries[0]
    }
}

impl TryFrom<Vec<CatalogEntry>> for PieceCatalog {
    type Error = CatalogError;

    fn try_from(entries: Vec<CatalogEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<PieceCatalog> for Vec<CatalogEntry> {
    fn from(catalog: PieceCatalog) -> Self {
        catalog.entries
    }
}
