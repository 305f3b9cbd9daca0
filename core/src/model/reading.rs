use serde::{Deserialize, Serialize};

/// Output of the range-Doppler processor for a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSample {
    pub distance_m: f64,
    pub speed_m_s: f64,
    pub peak_magnitude: f64,
}

/// Radial motion class of the tracked reflector.
///
/// Sign convention: negative radial speed means the target is closing on the
/// sensor (`Approaching`), positive means it is moving away (`Receding`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Static,
    Approaching,
    Receding,
    #[default]
    None,
}

impl Direction {
    pub fn classify(speed_m_s: f64, speed_resolution_m_s: f64) -> Self {
        if speed_m_s.abs() < speed_resolution_m_s {
            Direction::Static
        } else if speed_m_s < 0.0 {
            Direction::Approaching
        } else {
            Direction::Receding
        }
    }

    pub fn is_target(self) -> bool {
        self != Direction::None
    }
}

/// Running minimum and maximum of one scalar; both unset until first observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Extent {
    pub fn observe(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingStats {
    pub distance_cm: Extent,
    pub speed_m_s: Extent,
    pub peak_magnitude: Extent,
}

/// Smoothed, classified estimate published once per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SmoothedReading {
    pub distance_cm: f64,
    pub speed_m_s: f64,
    pub direction: Direction,
    pub peak_magnitude: f64,
    pub stats: ReadingStats,
}
