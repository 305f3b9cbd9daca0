use ndarray::{s, Array1, Axis};

use crate::math::{blackman_harris, FftHelper};
use crate::prelude::{
    ProcessingError, ProcessingStage, StageConfig, StageInput, StageMetadata, StageOutput,
    StageResult,
};

/// Windowed range FFT over each chirp, keeping the first half of the bins.
pub struct RangeStage {
    config: Option<StageConfig>,
    window: Array1<f64>,
    fft: Option<FftHelper>,
}

impl RangeStage {
    pub fn new() -> Self {
        Self {
            config: None,
            window: Array1::zeros(0),
            fft: None,
        }
    }
}

impl Default for RangeStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for RangeStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        if config.samples_per_chirp < 2 {
            return Err(ProcessingError::InvalidInput(format!(
                "need at least two samples per chirp, got {}",
                config.samples_per_chirp
            )));
        }
        self.window = blackman_harris(config.samples_per_chirp);
        self.fft = Some(FftHelper::new(config.samples_per_chirp));
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ProcessingError::Internal("range stage not initialized".into()))?;
        let fft = self
            .fft
            .as_mut()
            .ok_or_else(|| ProcessingError::Internal("range FFT not configured".into()))?;

        let expected = (config.chirps_per_frame, config.samples_per_chirp);
        let mut samples = input.samples;
        if samples.dim() != expected {
            return Err(ProcessingError::FrameShape {
                expected,
                actual: samples.dim(),
            });
        }

        for mut chirp in samples.axis_iter_mut(Axis(0)) {
            chirp.zip_mut_with(&self.window, |value, &weight| *value *= weight);
        }
        fft.forward_rows(&mut samples);

        let half = samples.slice(s![.., ..config.range_bins()]).to_owned();
        Ok(StageOutput {
            samples: half,
            metadata: StageMetadata::default(),
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
        self.fft = None;
        self.window = Array1::zeros(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToneTarget;

    fn config() -> StageConfig {
        StageConfig {
            samples_per_chirp: 16,
            chirps_per_frame: 4,
            range_resolution_m: 0.1,
            max_speed_m_s: 3.0,
        }
    }

    #[test]
    fn range_stage_keeps_half_the_bins() {
        let mut stage = RangeStage::new();
        stage.initialize(&config()).unwrap();
        let frame = ToneTarget {
            range_bin: 5.0,
            doppler_bin: 0.0,
            amplitude: 1.0,
        }
        .render(4, 16);

        let output = stage.execute(StageInput { samples: frame }).unwrap();
        assert_eq!(output.samples.dim(), (4, 8));
        let row: Vec<f64> = output.samples.row(0).iter().map(|c| c.norm()).collect();
        let peak = row
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_eq!(peak.0, 5);
        stage.cleanup();
    }

    #[test]
    fn range_stage_rejects_mismatched_frames() {
        let mut stage = RangeStage::new();
        stage.initialize(&config()).unwrap();
        let frame = ndarray::Array2::zeros((3, 16));
        let err = stage.execute(StageInput { samples: frame }).unwrap_err();
        assert_eq!(
            err,
            ProcessingError::FrameShape {
                expected: (4, 16),
                actual: (3, 16)
            }
        );
    }
}
