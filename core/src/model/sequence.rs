use serde::{Deserialize, Serialize};

use crate::model::config::AcquisitionConfig;
use crate::prelude::StageConfig;

pub const CENTER_FREQUENCY_HZ: f64 = 60_750_000_000.0;
pub const ADC_SAMPLE_RATE_HZ: f64 = 1_000_000.0;
pub const RX_MASK: u32 = 1;
pub const TX_MASK: u32 = 1;
pub const TX_POWER_LEVEL: u32 = 31;
pub const IF_GAIN_DB: u32 = 33;
pub const LP_CUTOFF_HZ: u32 = 500_000;
pub const HP_CUTOFF_HZ: u32 = 80_000;
pub const MAX_SPEED_M_S: f64 = 3.0;
pub const SPEED_RESOLUTION_M_S: f64 = 0.2;

/// Chirp duration assumed when the device cannot report one.
pub const DEFAULT_CHIRP_DURATION_S: f64 = 128e-6;

/// Share of the frame period the chirps may occupy.
pub const CHIRP_BUDGET_FRACTION: f64 = 0.9;

/// Largest range-bin count a configuration may ask for (1024 samples per chirp).
pub const MAX_RANGE_BINS: u32 = 512;

/// Largest chirp count a configuration may ask for.
pub const MAX_CHIRPS_PER_FRAME: u32 = 1024;

/// Device-level acquisition sequence derived from an [`AcquisitionConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDescriptor {
    pub center_frequency_hz: f64,
    pub sample_rate_hz: f64,
    pub rx_mask: u32,
    pub tx_mask: u32,
    pub tx_power_level: u32,
    pub if_gain_db: u32,
    pub lp_cutoff_hz: u32,
    pub hp_cutoff_hz: u32,
    pub frame_repetition_time_s: f64,
    pub chirps_per_frame: u32,
    pub samples_per_chirp: u32,
    pub max_range_m: f64,
    pub range_resolution_m: f64,
    pub max_speed_m_s: f64,
    pub speed_resolution_m_s: f64,
}

impl SequenceDescriptor {
    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self {
            center_frequency_hz: CENTER_FREQUENCY_HZ,
            sample_rate_hz: ADC_SAMPLE_RATE_HZ,
            rx_mask: RX_MASK,
            tx_mask: TX_MASK,
            tx_power_level: TX_POWER_LEVEL,
            if_gain_db: IF_GAIN_DB,
            lp_cutoff_hz: LP_CUTOFF_HZ,
            hp_cutoff_hz: HP_CUTOFF_HZ,
            frame_repetition_time_s: config.frame_period_s(),
            chirps_per_frame: config.chirps_per_frame,
            samples_per_chirp: samples_per_chirp(config.max_range_m, config.range_resolution_m),
            max_range_m: config.max_range_m,
            range_resolution_m: config.range_resolution_m,
            max_speed_m_s: MAX_SPEED_M_S,
            speed_resolution_m_s: SPEED_RESOLUTION_M_S,
        }
    }

    pub fn stage_config(&self) -> StageConfig {
        StageConfig {
            samples_per_chirp: self.samples_per_chirp as usize,
            chirps_per_frame: self.chirps_per_frame as usize,
            range_resolution_m: self.range_resolution_m,
            max_speed_m_s: self.max_speed_m_s,
        }
    }
}

/// Range bins needed to cover `max_range_m`, before any cap is applied.
pub fn range_bins(max_range_m: f64, range_resolution_m: f64) -> f64 {
    (max_range_m / range_resolution_m - 1e-9).ceil().max(1.0)
}

/// Even sample count whose first half of range bins covers `max_range_m`.
///
/// The bin count is capped at [`MAX_RANGE_BINS`]; [`AcquisitionConfig::validate`]
/// rejects geometries that would hit the cap.
pub fn samples_per_chirp(max_range_m: f64, range_resolution_m: f64) -> u32 {
    let bins = range_bins(max_range_m, range_resolution_m).min(MAX_RANGE_BINS as f64);
    bins as u32 * 2
}

/// Outcome of fitting the requested chirps into the frame period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChirpBudget {
    pub requested: u32,
    pub applied: u32,
    pub chirp_duration_s: f64,
    pub frame_rate_hz: f64,
}

impl ChirpBudget {
    /// Reduces `requested` until `chirps * duration <= 0.9 / frame_rate`. Never below one chirp.
    pub fn fit(requested: u32, chirp_duration_s: f64, frame_rate_hz: f64) -> Self {
        let available_s = CHIRP_BUDGET_FRACTION / frame_rate_hz;
        let mut applied = requested;
        if requested as f64 * chirp_duration_s > available_s {
            applied = ((available_s / chirp_duration_s).floor() as u32).min(requested);
            while applied > 1 && applied as f64 * chirp_duration_s > available_s {
                applied -= 1;
            }
            applied = applied.max(1);
        }
        Self {
            requested,
            applied,
            chirp_duration_s,
            frame_rate_hz,
        }
    }

    pub fn is_clamped(&self) -> bool {
        self.applied != self.requested
    }
}
