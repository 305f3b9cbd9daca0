use std::f64::consts::PI;

use ndarray::Array2;
use num_complex::Complex64;

use crate::prelude::CpxMatrix;

/// One antenna's samples for a frame, shaped `[chirps_per_frame, samples_per_chirp]`.
pub type RawFrame = CpxMatrix;

/// Single reflector rendered as a complex beat tone.
///
/// `range_bin` is the beat frequency in range-FFT bins; `doppler_bin` is the
/// phase progression across chirps in Doppler-FFT bins (negative = closing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneTarget {
    pub range_bin: f64,
    pub doppler_bin: f64,
    pub amplitude: f64,
}

impl ToneTarget {
    pub fn render(&self, chirps: usize, samples: usize) -> RawFrame {
        let mut frame = Array2::zeros((chirps, samples));
        self.add_to(&mut frame);
        frame
    }

    pub fn add_to(&self, frame: &mut RawFrame) {
        let (chirps, samples) = frame.dim();
        if chirps == 0 || samples == 0 {
            return;
        }
        for ((chirp, sample), value) in frame.indexed_iter_mut() {
            let phase = 2.0 * PI
                * (self.range_bin * sample as f64 / samples as f64
                    + self.doppler_bin * chirp as f64 / chirps as f64);
            *value += Complex64::from_polar(self.amplitude, phase);
        }
    }
}
