use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::prelude::ConfigError;

/// Frame rates offered to operators.
pub const FRAME_RATES_HZ: [f64; 7] = [5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0];

/// Named range/resolution pairs offered to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangePreset {
    #[serde(rename = "0.5m")]
    Precision0_5m,
    #[serde(rename = "1.6m")]
    Standard1_6m,
    #[serde(rename = "3m")]
    Room3m,
    #[serde(rename = "5m")]
    Range5m,
    #[default]
    #[serde(rename = "8m")]
    Range8m,
    #[serde(rename = "10m")]
    Range10m,
    #[serde(rename = "12m")]
    Range12m,
    #[serde(rename = "15m")]
    Maximum15m,
}

impl RangePreset {
    pub const ALL: [RangePreset; 8] = [
        RangePreset::Precision0_5m,
        RangePreset::Standard1_6m,
        RangePreset::Room3m,
        RangePreset::Range5m,
        RangePreset::Range8m,
        RangePreset::Range10m,
        RangePreset::Range12m,
        RangePreset::Maximum15m,
    ];

    /// `(max_range_m, range_resolution_m)`
    pub fn range(self) -> (f64, f64) {
        match self {
            RangePreset::Precision0_5m => (0.5, 0.02),
            RangePreset::Standard1_6m => (1.6, 0.05),
            RangePreset::Room3m => (3.0, 0.10),
            RangePreset::Range5m => (5.0, 0.15),
            RangePreset::Range8m => (8.0, 0.20),
            RangePreset::Range10m => (10.0, 0.25),
            RangePreset::Range12m => (12.0, 0.30),
            RangePreset::Maximum15m => (15.0, 0.40),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RangePreset::Precision0_5m => "0.5m",
            RangePreset::Standard1_6m => "1.6m",
            RangePreset::Room3m => "3m",
            RangePreset::Range5m => "5m",
            RangePreset::Range8m => "8m",
            RangePreset::Range10m => "10m",
            RangePreset::Range12m => "12m",
            RangePreset::Maximum15m => "15m",
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RangePreset {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        RangePreset::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownPreset(value.to_string()))
    }
}
