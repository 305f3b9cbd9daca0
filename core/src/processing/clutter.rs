use ndarray::Axis;

use crate::math::stats::StatsHelper;
use crate::prelude::{
    ProcessingError, ProcessingStage, StageConfig, StageInput, StageMetadata, StageOutput,
    StageResult,
};

/// Moving target indication: removes the per-range-bin mean across chirps so
/// that returns which do not change from chirp to chirp (walls, furniture) cancel.
pub struct ClutterStage {
    config: Option<StageConfig>,
}

impl ClutterStage {
    pub fn new() -> Self {
        Self { config: None }
    }
}

impl Default for ClutterStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for ClutterStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ProcessingError::Internal("clutter stage not initialized".into()))?;

        let mut samples = input.samples;
        let expected = (config.chirps_per_frame, config.range_bins());
        if samples.dim() != expected {
            return Err(ProcessingError::FrameShape {
                expected,
                actual: samples.dim(),
            });
        }

        let mean = StatsHelper::column_mean(&samples);
        for mut chirp in samples.axis_iter_mut(Axis(0)) {
            chirp -= &mean;
        }

        Ok(StageOutput {
            samples,
            metadata: StageMetadata::default(),
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
