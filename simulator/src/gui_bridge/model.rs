use fmcwcore::model::{AcquisitionConfig, Direction, RangePreset, ReadingStats, FRAME_RATES_HZ};
use fmcwcore::store::{AppliedConfig, DeviceStatus, HistoryEntry, LatestReading};
use fmcwcore::telemetry::MetricsSnapshot;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClampWarningView {
    pub requested: u32,
    pub applied: u32,
    pub message: String,
}

/// Payload of `GET /latest`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LatestView {
    pub status: DeviceStatus,
    pub distance_cm: f64,
    pub speed_m_s: f64,
    pub direction: Direction,
    pub peak_magnitude: f64,
    pub stats: ReadingStats,
    pub applied: Option<AppliedConfig>,
    pub clamp_warning: Option<ClampWarningView>,
    pub sensor: Option<String>,
    pub sensor_uptime_s: Option<f64>,
    pub program_uptime_s: f64,
    pub last_fault: Option<String>,
    pub metrics: MetricsSnapshot,
}

impl From<LatestReading> for LatestView {
    fn from(latest: LatestReading) -> Self {
        let clamp_warning = latest.clamp_warning.map(|budget| ClampWarningView {
            requested: budget.requested,
            applied: budget.applied,
            message: format!(
                "{} chirps do not fit a {} Hz frame, {} applied",
                budget.requested, budget.frame_rate_hz, budget.applied
            ),
        });
        Self {
            status: latest.status,
            distance_cm: latest.reading.distance_cm,
            speed_m_s: latest.reading.speed_m_s,
            direction: latest.reading.direction,
            peak_magnitude: latest.reading.peak_magnitude,
            stats: latest.reading.stats,
            applied: latest.applied,
            clamp_warning,
            sensor: latest.sensor,
            sensor_uptime_s: latest.sensor_uptime.map(|uptime| uptime.as_secs_f64()),
            program_uptime_s: latest.program_uptime.as_secs_f64(),
            last_fault: latest.last_fault,
            metrics: latest.metrics,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryView {
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SectorsView {
    pub max_range_cm: Option<f64>,
    pub cells: Vec<Direction>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PresetView {
    pub name: RangePreset,
    pub max_range_m: f64,
    pub range_resolution_m: f64,
}

impl From<RangePreset> for PresetView {
    fn from(preset: RangePreset) -> Self {
        let (max_range_m, range_resolution_m) = preset.range();
        Self {
            name: preset,
            max_range_m,
            range_resolution_m,
        }
    }
}

/// Payload of `GET /config`, including the choices a client may offer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConfigView {
    pub requested: AcquisitionConfig,
    pub applied: Option<AppliedConfig>,
    pub range_presets: Vec<PresetView>,
    pub frame_rates_hz: Vec<f64>,
}

impl ConfigView {
    pub fn new(requested: AcquisitionConfig, applied: Option<AppliedConfig>) -> Self {
        Self {
            requested,
            applied,
            range_presets: RangePreset::ALL.into_iter().map(PresetView::from).collect(),
            frame_rates_hz: FRAME_RATES_HZ.to_vec(),
        }
    }
}
