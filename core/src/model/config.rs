use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::presets::RangePreset;
use crate::model::sequence::{range_bins, MAX_CHIRPS_PER_FRAME, MAX_RANGE_BINS};
use crate::prelude::ConfigError;

/// Operator-facing acquisition settings. Every field changes together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    pub max_range_m: f64,
    pub range_resolution_m: f64,
    pub frame_rate_hz: f64,
    pub chirps_per_frame: u32,
    pub peak_threshold: f64,
}

pub const DEFAULT_FRAME_RATE_HZ: f64 = 20.0;
pub const DEFAULT_CHIRPS_PER_FRAME: u32 = 32;
pub const DEFAULT_PEAK_THRESHOLD: f64 = 0.2;

impl Default for AcquisitionConfig {
    fn default() -> Self {
        let (max_range_m, range_resolution_m) = RangePreset::default().range();
        Self {
            max_range_m,
            range_resolution_m,
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
            chirps_per_frame: DEFAULT_CHIRPS_PER_FRAME,
            peak_threshold: DEFAULT_PEAK_THRESHOLD,
        }
    }
}

impl AcquisitionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_range_m", self.max_range_m)?;
        positive("range_resolution_m", self.range_resolution_m)?;
        positive("frame_rate_hz", self.frame_rate_hz)?;
        if self.chirps_per_frame == 0 {
            return Err(ConfigError::NoChirps);
        }
        if self.chirps_per_frame > MAX_CHIRPS_PER_FRAME {
            return Err(ConfigError::TooManyChirps {
                requested: self.chirps_per_frame,
                max: MAX_CHIRPS_PER_FRAME,
            });
        }
        if self.peak_threshold.is_nan() || self.peak_threshold < 0.0 {
            return Err(ConfigError::Negative {
                field: "peak_threshold",
                value: self.peak_threshold,
            });
        }
        if self.range_resolution_m > self.max_range_m {
            return Err(ConfigError::ResolutionExceedsRange {
                resolution: self.range_resolution_m,
                max_range: self.max_range_m,
            });
        }
        let bins = range_bins(self.max_range_m, self.range_resolution_m);
        if bins > MAX_RANGE_BINS as f64 {
            return Err(ConfigError::TooManyRangeBins {
                bins,
                max: MAX_RANGE_BINS,
            });
        }
        Ok(())
    }

    pub fn max_range_cm(&self) -> f64 {
        self.max_range_m * 100.0
    }

    /// Time available for one frame, in seconds.
    pub fn frame_period_s(&self) -> f64 {
        1.0 / self.frame_rate_hz
    }

    pub fn with_preset(mut self, preset: RangePreset) -> Self {
        let (max_range_m, range_resolution_m) = preset.range();
        self.max_range_m = max_range_m;
        self.range_resolution_m = range_resolution_m;
        self
    }
}

impl fmt::Display for AcquisitionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}m/{:.2}m @ {} Hz, {} chirps, threshold {:.3}",
            self.max_range_m,
            self.range_resolution_m,
            self.frame_rate_hz,
            self.chirps_per_frame,
            self.peak_threshold
        )
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

/// Reconfiguration intent; unset fields keep their requested value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    pub range_preset: Option<RangePreset>,
    pub max_range_m: Option<f64>,
    pub range_resolution_m: Option<f64>,
    pub frame_rate_hz: Option<f64>,
    pub chirps_per_frame: Option<u32>,
    pub peak_threshold: Option<f64>,
}

impl PartialConfig {
    pub fn is_empty(&self) -> bool {
        *self == PartialConfig::default()
    }

    /// Applies the preset first, then any explicit field on top of it.
    pub fn apply_to(&self, base: &AcquisitionConfig) -> AcquisitionConfig {
        let mut merged = match self.range_preset {
            Some(preset) => base.clone().with_preset(preset),
            None => base.clone(),
        };
        if let Some(value) = self.max_range_m {
            merged.max_range_m = value;
        }
        if let Some(value) = self.range_resolution_m {
            merged.range_resolution_m = value;
        }
        if let Some(value) = self.frame_rate_hz {
            merged.frame_rate_hz = value;
        }
        if let Some(value) = self.chirps_per_frame {
            merged.chirps_per_frame = value;
        }
        if let Some(value) = self.peak_threshold {
            merged.peak_threshold = value;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AcquisitionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_range_m, 8.0);
        assert_eq!(config.chirps_per_frame, 32);
    }

    #[test]
    fn validation_rejects_bad_fields() {
        let zero_rate = AcquisitionConfig {
            frame_rate_hz: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            zero_rate.validate(),
            Err(ConfigError::NotPositive {
                field: "frame_rate_hz",
                ..
            })
        ));

        let nan_threshold = AcquisitionConfig {
            peak_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(nan_threshold.validate().is_err());

        let no_chirps = AcquisitionConfig {
            chirps_per_frame: 0,
            ..Default::default()
        };
        assert_eq!(no_chirps.validate(), Err(ConfigError::NoChirps));
    }

    #[test]
    fn validation_caps_frame_geometry() {
        let huge_range = AcquisitionConfig {
            max_range_m: 1e9,
            range_resolution_m: 1e-3,
            ..Default::default()
        };
        assert!(matches!(
            huge_range.validate(),
            Err(ConfigError::TooManyRangeBins { max: 512, .. })
        ));

        let unbounded = AcquisitionConfig {
            max_range_m: f64::INFINITY,
            ..Default::default()
        };
        assert!(unbounded.validate().is_err());

        let at_cap = AcquisitionConfig {
            max_range_m: 5.12,
            range_resolution_m: 0.01,
            ..Default::default()
        };
        assert!(at_cap.validate().is_ok());

        let too_many_chirps = AcquisitionConfig {
            chirps_per_frame: MAX_CHIRPS_PER_FRAME + 1,
            ..Default::default()
        };
        assert!(matches!(
            too_many_chirps.validate(),
            Err(ConfigError::TooManyChirps { .. })
        ));
    }

    #[test]
    fn partial_overrides_preset() {
        let partial = PartialConfig {
            range_preset: Some(RangePreset::Room3m),
            range_resolution_m: Some(0.05),
            frame_rate_hz: Some(60.0),
            ..Default::default()
        };
        let merged = partial.apply_to(&AcquisitionConfig::default());
        assert_eq!(merged.max_range_m, 3.0);
        assert_eq!(merged.range_resolution_m, 0.05);
        assert_eq!(merged.frame_rate_hz, 60.0);
        assert_eq!(merged.chirps_per_frame, DEFAULT_CHIRPS_PER_FRAME);
    }
}
