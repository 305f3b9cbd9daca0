use crate::model::{Direction, ProcessedSample, ReadingStats, SmoothedReading};
use crate::prelude::ConfigError;

/// Smoothing factor applied to each new valid sample.
pub const DEFAULT_ALPHA: f64 = 0.4;

/// Exponential smoothing, direction classification and running statistics.
///
/// Owned by the acquisition loop; reset whenever the device reconnects or the
/// configuration changes.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    alpha: f64,
    distance_cm: Option<f64>,
    speed_m_s: Option<f64>,
    stats: ReadingStats,
}

impl TemporalSmoother {
    pub fn new() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            distance_cm: None,
            speed_m_s: None,
            stats: ReadingStats::default(),
        }
    }

    pub fn with_alpha(alpha: f64) -> Result<Self, ConfigError> {
        if alpha.is_nan() || alpha <= 0.0 || alpha > 1.0 {
            return Err(ConfigError::SmoothingFactor(alpha));
        }
        Ok(Self {
            alpha,
            ..Self::new()
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn stats(&self) -> &ReadingStats {
        &self.stats
    }

    pub fn update(
        &mut self,
        sample: ProcessedSample,
        peak_threshold: f64,
        speed_resolution_m_s: f64,
    ) -> SmoothedReading {
        if sample.peak_magnitude < peak_threshold {
            return SmoothedReading {
                stats: self.stats,
                ..SmoothedReading::default()
            };
        }

        let distance_cm = self.blend_distance(sample.distance_m * 100.0);
        let speed_m_s = self.blend_speed(sample.speed_m_s);
        let direction = Direction::classify(speed_m_s, speed_resolution_m_s);

        self.stats.distance_cm.observe(distance_cm);
        self.stats.speed_m_s.observe(speed_m_s);
        self.stats.peak_magnitude.observe(sample.peak_magnitude);

        SmoothedReading {
            distance_cm,
            speed_m_s,
            direction,
            peak_magnitude: sample.peak_magnitude,
            stats: self.stats,
        }
    }

    pub fn reset(&mut self) {
        self.distance_cm = None;
        self.speed_m_s = None;
        self.stats = ReadingStats::default();
    }

    fn blend_distance(&mut self, value: f64) -> f64 {
        let blended = ema(self.alpha, self.distance_cm, value);
        self.distance_cm = Some(blended);
        blended
    }

    fn blend_speed(&mut self, value: f64) -> f64 {
        let blended = ema(self.alpha, self.speed_m_s, value);
        self.speed_m_s = Some(blended);
        blended
    }
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new()
    }
}

fn ema(alpha: f64, previous: Option<f64>, value: f64) -> f64 {
    match previous {
        Some(previous) => alpha * value + (1.0 - alpha) * previous,
        None => value,
    }
}
