use ndarray::{Array1, Axis};

use crate::math::{blackman_harris, FftHelper, MatrixHelper};
use crate::prelude::{
    ProcessingError, ProcessingStage, StageConfig, StageInput, StageMetadata, StageOutput,
    StageResult,
};

/// Windowed Doppler FFT across chirps, centred on zero Doppler, plus the magnitude map.
pub struct DopplerStage {
    config: Option<StageConfig>,
    window: Array1<f64>,
    fft: Option<FftHelper>,
}

impl DopplerStage {
    pub fn new() -> Self {
        Self {
            config: None,
            window: Array1::zeros(0),
            fft: None,
        }
    }
}

impl Default for DopplerStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for DopplerStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        if config.chirps_per_frame == 0 {
            return Err(ProcessingError::InvalidInput(
                "need at least one chirp per frame".into(),
            ));
        }
        self.window = blackman_harris(config.chirps_per_frame);
        self.fft = Some(FftHelper::new(config.chirps_per_frame));
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ProcessingError::Internal("doppler stage not initialized".into()))?;
        let fft = self
            .fft
            .as_mut()
            .ok_or_else(|| ProcessingError::Internal("doppler FFT not configured".into()))?;

        let mut samples = input.samples;
        let expected = (config.chirps_per_frame, config.range_bins());
        if samples.dim() != expected {
            return Err(ProcessingError::FrameShape {
                expected,
                actual: samples.dim(),
            });
        }

        for (mut chirp, &weight) in samples.axis_iter_mut(Axis(0)).zip(self.window.iter()) {
            chirp.mapv_inplace(|value| value * weight);
        }
        fft.forward_columns(&mut samples);
        MatrixHelper::fftshift_rows(&mut samples);

        let magnitude = samples.mapv(|value| value.norm());
        Ok(StageOutput {
            samples,
            metadata: StageMetadata {
                magnitude_map: Some(magnitude),
                ..Default::default()
            },
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
    use ndarray::Array2;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    #[test]
    fn doppler_stage_centres_zero_doppler() {
        let chirps = 8;
        let mut stage = DopplerStage::new();
        let config = StageConfig {
            samples_per_chirp: 4,
            chirps_per_frame: chirps,
            range_resolution_m: 0.1,
            max_speed_m_s: 3.0,
        };
        stage.initialize(&config).unwrap();

        // range bin 1 rotates by two Doppler bins per frame
        let samples = Array2::from_shape_fn((chirps, 2), |(m, bin)| {
            if bin == 1 {
                Complex64::from_polar(1.0, 2.0 * PI * 2.0 * m as f64 / chirps as f64)
            } else {
                Complex64::new(0.0, 0.0)
            }
        });

        let output = stage.execute(StageInput { samples }).unwrap();
        let map = output.metadata.magnitude_map.unwrap();
        assert_eq!(map.dim(), (chirps, 2));
        let ((row, col), _) = MatrixHelper::argmax(&map).unwrap();
        assert_eq!((row, col), (chirps / 2 + 2, 1));
        stage.cleanup();
    }
}
