use serde::{Deserialize, Serialize};

use crate::core::{color::ColorPalette, piece::Piece, shape::PieceCatalog};

use super::random::RandomSource;

/// Number of slots in the tray.
pub const TRAY_SIZE: usize = 3;

/// The pieces currently offered to the player.
///
/// Slots keep their index for the lifetime of a piece: placing from slot 1
/// leaves slots 0 and 2 untouched. A refill only generates pieces for empty
/// slots, walking them in index order.
///
/// # Example
///
/// ```
/// use block_bloom_engine::{ColorPalette, PieceCatalog, SeededRandom};
/// use block_bloom_engine::engine::PieceTray;
///
/// let catalog = PieceCatalog::standard();
/// let palette = ColorPalette::default();
/// let mut rng = SeededRandom::new(1);
///
/// let mut tray = PieceTray::new();
/// assert_eq!(tray.refill_empty_slots(&catalog, &mut rng, &palette), 3);
///
/// let piece = tray.consume(1).unwrap();
/// assert!(tray.get(1).is_none());
/// assert!(tray.consume(1).is_none());
/// # let _ = piece;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceTray {
    slots: [Option<Piece>; TRAY_SIZE],
}

impl PieceTray {
    /// Creates a tray with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_slots(slots: [Option<Piece>; TRAY_SIZE]) -> Self {
        Self { slots }
    }

    /// Generates a piece for every empty slot.
    ///
    /// For each slot, one value picks the shape by cumulative weight over the
    /// catalog and a second value picks the color. Returns how many slots were
    /// filled.
    pub fn refill_empty_slots<R>(
        &mut self,
        catalog: &PieceCatalog,
        rng: &mut R,
        palette: &ColorPalette,
    ) -> usize
    where
        R: RandomSource + ?Sized,
    {
        let mut filled = 0;
        for slot in self.slots.iter_mut().filter(|s| s.is_none()) {
            let entry = catalog.pick(rng.next_unit());
            let color = palette.pick(rng.next_unit());
            *slot = Some(Piece::new(entry, color));
            filled += 1;
        }
        filled
    }

    /// Takes the piece out of `slot`, leaving it empty.
    ///
    /// Returns `None` if the slot is already empty or out of range.
    pub fn consume(&mut self, slot: usize) -> Option<Piece> {
        self.slots.get_mut(slot)?.take()
    }

    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Piece> {
        self.slots.get(slot)?.as_ref()
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.slots = Default::default();
    }

    #[must_use]
    pub fn all_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Iterates over the slots in index order.
    pub fn slots(&self) -> impl Iterator<Item = Option<&Piece>> + '_ {
        self.slots.iter().map(Option::as_ref)
    }

    /// Iterates over the occupied slots with their indices.
    pub fn pieces(&self) -> impl Iterator<Item = (usize, &Piece)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|p| (i, p)))
    }
}
