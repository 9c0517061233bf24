use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque color tag carried by pieces and filled cells.
///
/// The engine never interprets the value; it is an index into whatever palette
/// the rendering layer maps to concrete colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorId(u8);

impl ColorId {
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ColorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block-{}", u16::from(self.0) + 1)
    }
}

/// The set of colors a freshly generated piece may receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    colors: Vec<ColorId>,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::with_len(Self::DEFAULT_LEN)
    }
}

impl ColorPalette {
    pub const DEFAULT_LEN: u8 = 7;

    /// Creates a palette of `len` consecutive color ids starting at zero.
    ///
    /// # Panics
    ///
    /// Panics if `len` is zero.
    #[must_use]
    pub fn with_len(len: u8) -> Self {
        assert!(len > 0, "palette must contain at least one color");
        Self {
            colors: (0..len).map(ColorId::new).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[must_use]
    pub fn contains(&self, color: ColorId) -> bool {
        self.colors.contains(&color)
    }

    /// Picks the color at `floor(unit * len)`, where `unit` lies in `[0, 1)`.
    #[must_use]
    pub fn pick(&self, unit: f64) -> ColorId {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let index = (unit * self.colors.len() as f64) as usize;
        self.colors[index.min(self.colors.len() - 1)]
    }

    pub fn iter(&self) -> impl Iterator<Item = ColorId> + '_ {
        self.colors.iter().copied()
    }
}
