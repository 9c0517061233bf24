use serde::{Deserialize, Serialize};

use super::{
    color::ColorId,
    shape::{CatalogEntry, PieceShape},
};

/// A piece sitting in the tray, ready to be placed.
///
/// Pieces are immutable: the shape is copied out of the catalog when the piece
/// is generated, so later catalog changes never affect a piece already dealt.
///
/// # Example
///
/// ```
/// use block_bloom_engine::{ColorId, Piece, PieceCatalog};
///
/// let catalog = PieceCatalog::standard();
/// let piece = Piece::new(catalog.get("tetro_o").unwrap(), ColorId::new(2));
/// assert_eq!(piece.cell_count(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPiece")]
pub struct Piece {
    shape_id: String,
    shape: PieceShape,
    color: ColorId,
    cell_count: usize,
}

impl Piece {
    #[must_use]
    pub fn new(entry: &CatalogEntry, color: ColorId) -> Self {
        Self {
            shape_id: entry.name.clone(),
            shape: entry.shape.clone(),
            color,
            cell_count: entry.shape.cell_count(),
        }
    }

    /// Name of the catalog shape this piece was generated from.
    #[must_use]
    pub fn shape_id(&self) -> &str {
        &self.shape_id
    }

    #[must_use]
    pub fn shape(&self) -> &PieceShape {
        &self.shape
    }

    #[must_use]
    pub fn color(&self) -> ColorId {
        self.color
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }
}

#[derive(Debug, Deserialize)]
struct RawPiece {
    shape_id: String,
    shape: PieceShape,
    color: ColorId,
    cell_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("piece {shape_id:?} declares {declared} cells but its shape has {actual}")]
pub struct PieceCellCountError {
    shape_id: String,
    declared: usize,
    actual: usize,
}

impl TryFrom<RawPiece> for Piece {
    type Error = PieceCellCountError;

    fn try_from(raw: RawPiece) -> Result<Self, Self::Error> {
        let actual = raw.shape.cell_count();
        if raw.cell_count != actual {
            return Err(PieceCellCountError {
                shape_id: raw.shape_id,
                declared: raw.cell_count,
                actual,
            });
        }
        Ok(Self {
            shape_id: raw.shape_id,
            shape: raw.shape,
            color: raw.color,
            cell_count: raw.cell_count,
        })
    }
}
