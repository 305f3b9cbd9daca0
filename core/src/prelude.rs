use std::fmt;

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Complex sample matrix laid out as `[chirps, bins]`.
pub type CpxMatrix = Array2<Complex64>;

/// Geometry and axis parameters shared by each processing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub samples_per_chirp: usize,
    pub chirps_per_frame: usize,
    pub range_resolution_m: f64,
    pub max_speed_m_s: f64,
}

impl StageConfig {
    /// Number of range bins kept after the range FFT.
    pub fn range_bins(&self) -> usize {
        self.samples_per_chirp / 2
    }
}

/// Input payload for a processing stage.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub samples: CpxMatrix,
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub samples: CpxMatrix,
    pub metadata: StageMetadata,
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub magnitude_map: Option<Array2<f64>>,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("frame shape {actual:?} does not match configured {expected:?}")]
    FrameShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, ProcessingError>;

/// Trait describing the range, clutter and Doppler stages of the pipeline.
pub trait ProcessingStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()>;
    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput>;
    fn cleanup(&mut self);
}

/// Failure reported by a radar device or its driver.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("device unavailable: {0}")]
    Unavailable(String),
    #[error("device rejected sequence: {0}")]
    Rejected(String),
    #[error("frame acquisition failed: {0}")]
    Acquisition(String),
}

/// Rejected acquisition configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("chirps_per_frame must be at least 1")]
    NoChirps,
    #[error("range_resolution_m {resolution} exceeds max_range_m {max_range}")]
    ResolutionExceedsRange { resolution: f64, max_range: f64 },
    #[error("geometry needs {bins} range bins, at most {max} are supported")]
    TooManyRangeBins { bins: f64, max: u32 },
    #[error("chirps_per_frame {requested} exceeds the supported {max}")]
    TooManyChirps { requested: u32, max: u32 },
    #[error("smoothing factor must lie in (0, 1] (got {0})")]
    SmoothingFactor(f64),
    #[error("unknown range preset {0:?}")]
    UnknownPreset(String),
}

/// Device lifecycle step an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePhase {
    Open,
    Configure,
    Start,
    NextFrame,
    Stop,
}

impl fmt::Display for DevicePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DevicePhase::Open => "open",
            DevicePhase::Configure => "configure",
            DevicePhase::Start => "start",
            DevicePhase::NextFrame => "next_frame",
            DevicePhase::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// Any fault that moves the acquisition controller into recovery.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    #[error("device {phase} failed: {source}")]
    Device {
        phase: DevicePhase,
        #[source]
        source: DeviceError,
    },
    #[error("processing failed: {0}")]
    Processing(#[from] ProcessingError),
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),
}

impl AcquisitionError {
    pub fn device(phase: DevicePhase, source: DeviceError) -> Self {
        AcquisitionError::Device { phase, source }
    }
}
