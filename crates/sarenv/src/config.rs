//! Generation configuration: climate and terrain labels, size tiers, and [`GeneratorConfig`].
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default raster resolution in meters per bin edge.
pub const DEFAULT_METER_PER_BIN: f64 = 30.0;

/// Upper bound on the number of cells a single grid may allocate.
pub const DEFAULT_MAX_CELLS: usize = 50_000_000;

/// Climate zone of the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Climate {
    Temperate,
    Dry,
}

impl Climate {
    pub const ALL: [Climate; 2] = [Climate::Temperate, Climate::Dry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Climate::Temperate => "temperate",
            Climate::Dry => "dry",
        }
    }
}

impl fmt::Display for Climate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Climate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperate" => Ok(Climate::Temperate),
            "dry" => Ok(Climate::Dry),
            _ => Err(Error::UnsupportedName(s.to_owned())),
        }
    }
}

/// Terrain type of the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EnvironmentType {
    Flat,
    Mountainous,
}

impl EnvironmentType {
    pub const ALL: [EnvironmentType; 2] = [EnvironmentType::Flat, EnvironmentType::Mountainous];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentType::Flat => "flat",
            EnvironmentType::Mountainous => "mountainous",
        }
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(EnvironmentType::Flat),
            "mountainous" => Ok(EnvironmentType::Mountainous),
            _ => Err(Error::UnsupportedName(s.to_owned())),
        }
    }
}

/// Named dataset size. Each tier maps to a lost-person distance quantile
/// (25%, 50%, 75% and 95% of historical find distances).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SizeTier {
    Small,
    Medium,
    Large,
    XLarge,
}

impl SizeTier {
    pub const ALL: [SizeTier; 4] = [
        SizeTier::Small,
        SizeTier::Medium,
        SizeTier::Large,
        SizeTier::XLarge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeTier::Small => "small",
            SizeTier::Medium => "medium",
            SizeTier::Large => "large",
            SizeTier::XLarge => "xlarge",
        }
    }

    /// Search radius in kilometers for this tier.
    pub fn radius_km(&self, climate: Climate, environment_type: EnvironmentType) -> f64 {
        let quantiles = match (climate, environment_type) {
            (Climate::Temperate, EnvironmentType::Flat) => [0.6, 1.8, 3.2, 9.9],
            (Climate::Temperate, EnvironmentType::Mountainous) => [1.1, 3.1, 5.8, 18.3],
            (Climate::Dry, EnvironmentType::Flat) => [1.0, 2.3, 4.1, 14.4],
            (Climate::Dry, EnvironmentType::Mountainous) => [1.6, 3.2, 6.5, 19.3],
        };
        quantiles[*self as usize]
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(SizeTier::Small),
            "medium" => Ok(SizeTier::Medium),
            "large" => Ok(SizeTier::Large),
            "xlarge" => Ok(SizeTier::XLarge),
            _ => Err(Error::UnsupportedName(s.to_owned())),
        }
    }
}

/// Configuration shared by environment generation and dataset export.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeneratorConfig {
    /// Climate zone used to select the feature category set.
    pub climate: Climate,
    /// Terrain type used to select the feature category set.
    pub environment_type: EnvironmentType,
    /// Raster resolution in meters per bin edge.
    pub meter_per_bin: f64,
    /// Largest grid (in cells) a generation call may allocate.
    pub max_cells: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            climate: Climate::Temperate,
            environment_type: EnvironmentType::Flat,
            meter_per_bin: DEFAULT_METER_PER_BIN,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl GeneratorConfig {
    /// Creates a new [`GeneratorConfig`] for the given climate and terrain.
    pub fn new(climate: Climate, environment_type: EnvironmentType) -> Self {
        Self {
            climate,
            environment_type,
            ..Default::default()
        }
    }

    /// Sets the raster resolution.
    pub fn with_meter_per_bin(mut self, meter_per_bin: f64) -> Self {
        self.meter_per_bin = meter_per_bin;
        self
    }

    /// Sets the cell budget.
    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.meter_per_bin.is_finite() || self.meter_per_bin <= 0.0 {
            return Err(Error::InvalidConfig(
                "meter_per_bin must be finite and > 0".into(),
            ));
        }
        if self.max_cells == 0 {
            return Err(Error::InvalidConfig("max_cells must be > 0".into()));
        }
        Ok(())
    }
}
