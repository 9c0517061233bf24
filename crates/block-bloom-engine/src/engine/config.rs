use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{board::Board, color::ColorPalette, shape::PieceCatalog};

/// Rules that stay fixed for the lifetime of a session.
///
/// Every field has a default matching the standard game, so a configuration
/// file only needs to list what it changes:
///
/// ```
/// use block_bloom_engine::engine::GameConfig;
///
/// let config: GameConfig = serde_json::from_str(r#"{ "starting_bombs": 2 }"#).unwrap();
/// assert_eq!(config.starting_bombs, 2);
/// assert_eq!(config.grid_size, 10);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Side length of the square board.
    pub grid_size: usize,
    pub starting_undos: u32,
    pub starting_swaps: u32,
    pub starting_bombs: u32,
    /// Number of undo snapshots kept.
    pub history_capacity: usize,
    /// Wall-clock time per flow-meter point lost.
    pub flow_decay_interval_ms: u64,
    /// Chebyshev radius cleared by a bomb.
    pub bomb_radius: u32,
    pub palette_size: u8,
    pub catalog: PieceCatalog,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: Board::DEFAULT_SIZE,
            starting_undos: 3,
            starting_swaps: 1,
            starting_bombs: 0,
            history_capacity: 3,
            flow_decay_interval_ms: 500,
            bomb_radius: 1,
            palette_size: ColorPalette::DEFAULT_LEN,
            catalog: PieceCatalog::standard(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("grid size must be positive")]
    ZeroGridSize,
    #[display("grid size {grid_size} exceeds the maximum of {max}")]
    GridTooLarge { grid_size: usize, max: usize },
    #[display("palette must contain at least one color")]
    EmptyPalette,
    #[display("flow decay interval must be positive")]
    ZeroDecayInterval,
    #[display("shape {name:?} does not fit on a {grid_size}x{grid_size} board")]
    ShapeExceedsGrid { name: String, grid_size: usize },
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::ZeroGridSize);
        }
        if self.grid_size > Board::MAX_SIZE {
            return Err(ConfigError::GridTooLarge {
                grid_size: self.grid_size,
                max: Board::MAX_SIZE,
            });
        }
        if self.palette_size == 0 {
            return Err(ConfigError::EmptyPalette);
        }
        if self.flow_decay_interval_ms == 0 {
            return Err(ConfigError::ZeroDecayInterval);
        }
        if let Some(entry) = self
            .catalog
            .iter()
            .find(|e| e.shape.width() > self.grid_size || e.shape.height() > self.grid_size)
        {
            return Err(ConfigError::ShapeExceedsGrid {
                name: entry.name.clone(),
                grid_size: self.grid_size,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn flow_decay_interval(&self) -> Duration {
        Duration::from_millis(self.flow_decay_interval_ms)
    }

    /// # Panics
    ///
    /// Panics if `palette_size` is zero; [`Self::validate`] rejects that.
    #[must_use]
    pub fn palette(&self) -> ColorPalette {
        ColorPalette::with_len(self.palette_size)
    }
}
