use ndarray::{Array1, Array2};

use crate::math::{MatrixHelper, StatsHelper};
use crate::model::{ProcessedSample, RawFrame};
use crate::prelude::{ProcessingError, ProcessingStage, StageConfig, StageInput, StageResult};
use crate::processing::{ClutterStage, DopplerStage, RangeStage};
use crate::telemetry::LogManager;

/// Turns one raw antenna frame into the strongest reflector's distance, speed and magnitude.
///
/// Windows, FFT plans and axis tables are bound to the [`StageConfig`] the
/// processor was built with; a geometry change needs a new processor.
pub struct RangeDopplerProcessor {
    config: StageConfig,
    range: RangeStage,
    clutter: ClutterStage,
    doppler: DopplerStage,
    range_axis: Array1<f64>,
    speed_axis: Array1<f64>,
    index_faults: u64,
    logger: LogManager,
}

impl RangeDopplerProcessor {
    pub fn new(config: StageConfig) -> StageResult<Self> {
        if config.chirps_per_frame == 0 {
            return Err(ProcessingError::InvalidInput(
                "chirps_per_frame must be at least 1".into(),
            ));
        }

        let mut range = RangeStage::new();
        let mut clutter = ClutterStage::new();
        let mut doppler = DopplerStage::new();
        range.initialize(&config)?;
        clutter.initialize(&config)?;
        doppler.initialize(&config)?;

        let range_axis = Array1::from_iter(
            (0..config.range_bins()).map(|bin| bin as f64 * config.range_resolution_m),
        );
        let speed_axis = StatsHelper::linspace(
            -config.max_speed_m_s,
            config.max_speed_m_s,
            config.chirps_per_frame,
        );

        Ok(Self {
            config,
            range,
            clutter,
            doppler,
            range_axis,
            speed_axis,
            index_faults: 0,
            logger: LogManager::new("fmcwcore::processing"),
        })
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn range_axis(&self) -> &Array1<f64> {
        &self.range_axis
    }

    pub fn speed_axis(&self) -> &Array1<f64> {
        &self.speed_axis
    }

    /// Number of frames that fell back to a zeroed sample because of a bad bin lookup.
    pub fn index_faults(&self) -> u64 {
        self.index_faults
    }

    /// Magnitude map indexed by `[doppler_bin, range_bin]`, zero Doppler at row `chirps / 2`.
    pub fn magnitude_map(&mut self, frame: RawFrame) -> StageResult<Array2<f64>> {
        let range = self.range.execute(StageInput { samples: frame })?;
        let clutter = self.clutter.execute(StageInput {
            samples: range.samples,
        })?;
        let doppler = self.doppler.execute(StageInput {
            samples: clutter.samples,
        })?;
        doppler
            .metadata
            .magnitude_map
            .ok_or_else(|| ProcessingError::Internal("doppler stage produced no map".into()))
    }

    pub fn process(&mut self, frame: RawFrame) -> StageResult<ProcessedSample> {
        let map = self.magnitude_map(frame)?;
        let Some(((doppler_bin, range_bin), peak)) = MatrixHelper::argmax(&map) else {
            return Ok(self.index_fault(0, 0));
        };
        let sample = self.sample_at(doppler_bin, range_bin, peak);
        self.logger.detail(&format!(
            "peak doppler_bin={} range_bin={} distance={:.3}m speed={:+.3}m/s magnitude={:.4}",
            doppler_bin, range_bin, sample.distance_m, sample.speed_m_s, sample.peak_magnitude
        ));
        Ok(sample)
    }

    /// Maps a peak cell onto the physical axes; an index outside either axis yields a zeroed sample.
    pub fn sample_at(&mut self, doppler_bin: usize, range_bin: usize, peak: f64) -> ProcessedSample {
        match (
            self.range_axis.get(range_bin),
            self.speed_axis.get(doppler_bin),
        ) {
            (Some(&distance_m), Some(&speed_m_s)) => ProcessedSample {
                distance_m,
                speed_m_s,
                peak_magnitude: peak,
            },
            _ => self.index_fault(doppler_bin, range_bin),
        }
    }

    fn index_fault(&mut self, doppler_bin: usize, range_bin: usize) -> ProcessedSample {
        self.index_faults += 1;
        self.logger.detail(&format!(
            "peak cell ({}, {}) outside axes {}x{}, reporting empty sample",
            doppler_bin,
            range_bin,
            self.speed_axis.len(),
            self.range_axis.len()
        ));
        ProcessedSample::default()
    }
}

impl Drop for RangeDopplerProcessor {
    fn drop(&mut self) {
        self.range.cleanup();
        self.clutter.cleanup();
        self.doppler.cleanup();
    }
}
