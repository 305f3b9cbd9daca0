use fmcwcore::model::{RawFrame, SequenceDescriptor, ToneTarget};
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Synthetic scene: one reflector walking back and forth between two distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub start_distance_m: f64,
    pub near_m: f64,
    pub far_m: f64,
    /// Radial speed; negative closes on the sensor.
    pub speed_m_s: f64,
    pub amplitude: f64,
    /// Peak amplitude of the uniform complex noise added to every sample.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            start_distance_m: 2.5,
            near_m: 0.8,
            far_m: 4.0,
            speed_m_s: -0.6,
            amplitude: 1.0,
            noise: 0.05,
            seed: 7,
        }
    }
}

/// Moving state of the scene reflector, advanced once per rendered frame.
#[derive(Debug, Clone)]
pub struct Scene {
    config: SceneConfig,
    distance_m: f64,
    speed_m_s: f64,
    rng: StdRng,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        let near = config.near_m.min(config.far_m);
        let far = config.near_m.max(config.far_m);
        Self {
            distance_m: config.start_distance_m.clamp(near, far),
            speed_m_s: config.speed_m_s,
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn speed_m_s(&self) -> f64 {
        self.speed_m_s
    }

    /// Target as seen by `sequence`: beat tone at the range bin, phase ramp at the Doppler bin.
    pub fn target(&self, sequence: &SequenceDescriptor) -> ToneTarget {
        let chirps = sequence.chirps_per_frame.max(1) as f64;
        let doppler_bin = if sequence.max_speed_m_s > 0.0 {
            self.speed_m_s * (chirps - 1.0).max(1.0) / (2.0 * sequence.max_speed_m_s)
        } else {
            0.0
        };
        ToneTarget {
            range_bin: self.distance_m / sequence.range_resolution_m,
            doppler_bin,
            amplitude: self.config.amplitude,
        }
    }

    pub fn render(&mut self, sequence: &SequenceDescriptor) -> RawFrame {
        let mut frame = self.target(sequence).render(
            sequence.chirps_per_frame as usize,
            sequence.samples_per_chirp as usize,
        );
        if self.config.noise > 0.0 {
            let noise = self.config.noise;
            frame.mapv_inplace(|value| {
                value
                    + Complex64::new(
                        self.rng.gen_range(-noise..noise),
                        self.rng.gen_range(-noise..noise),
                    )
            });
        }
        self.advance(sequence.frame_repetition_time_s);
        frame
    }

    fn advance(&mut self, dt_s: f64) {
        let near = self.config.near_m.min(self.config.far_m);
        let far = self.config.near_m.max(self.config.far_m);
        self.distance_m += self.speed_m_s * dt_s;
        if self.distance_m <= near {
            self.distance_m = near;
            self.speed_m_s = self.speed_m_s.abs();
        } else if self.distance_m >= far {
            self.distance_m = far;
            self.speed_m_s = -self.speed_m_s.abs();
        }
    }
}
