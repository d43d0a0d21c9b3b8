//! Configuration loaded from TOML.
//!
//! ```toml
//! seed = 7
//! games = 100
//!
//! [grid]
//! height = 16
//! width = 16
//! hazards = 40
//!
//! [closure]
//! max_iterations = 10000
//! ```
//!
//! Every key is optional; missing keys take the defaults of an 8x8 grid with
//! 8 hazards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cell::Grid;
use crate::closure::ClosureConfig;
use crate::error::{ConfigError, SapperResult};

/// Grid size and hazard count for generated fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub height: usize,
    pub width: usize,
    pub hazards: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            height: 8,
            width: 8,
            hazards: 8,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SapperConfig {
    pub grid: GridConfig,
    pub closure: ClosureConfig,
    /// Seed for field generation and random move selection. `None` draws
    /// one from the OS.
    pub seed: Option<u64>,
    /// Number of games for batch runs.
    pub games: usize,
}

impl Default for SapperConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            closure: ClosureConfig::default(),
            seed: None,
            games: 100,
        }
    }
}

impl SapperConfig {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> SapperResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let GridConfig {
            height,
            width,
            hazards,
        } = self.grid;
        if height == 0 || width == 0 {
            return Err(ConfigError::Invalid {
                message: format!("grid {height}x{width} has no cells"),
            });
        }
        let Some(cells) = height.checked_mul(width) else {
            return Err(ConfigError::Invalid {
                message: format!("grid {height}x{width} is too large"),
            });
        };
        if hazards > cells {
            return Err(ConfigError::Invalid {
                message: format!("{hazards} hazards do not fit on a {height}x{width} grid"),
            });
        }
        if self.closure.max_iterations == Some(0) {
            return Err(ConfigError::Invalid {
                message: "closure.max_iterations must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn grid(&self) -> SapperResult<Grid> {
        Ok(Grid::new(self.grid.height, self.grid.width)?)
    }
}
