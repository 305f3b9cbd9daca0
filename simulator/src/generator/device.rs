use std::thread;
use std::time::{Duration, Instant};

use fmcwcore::acquisition::{FrameSource, RadarDevice};
use fmcwcore::model::sequence::DEFAULT_CHIRP_DURATION_S;
use fmcwcore::model::{RawFrame, SequenceDescriptor};
use fmcwcore::prelude::DeviceError;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::generator::profile::{Scene, SceneConfig};

/// Behaviour of the simulated radar, including injected faults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub sensor_name: String,
    pub chirp_duration_us: f64,
    /// Sleep out each frame period, like a real device would.
    pub pace_frames: bool,
    /// Number of initial `open` calls that fail.
    pub open_failures: usize,
    /// Every n-th frame fails with an acquisition error.
    pub fault_every_frames: Option<usize>,
    /// After this many frames `next_frame` blocks forever.
    pub stall_after_frames: Option<usize>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sensor_name: String::from("simulated 60 GHz radar"),
            chirp_duration_us: DEFAULT_CHIRP_DURATION_S * 1e6,
            pace_frames: true,
            open_failures: 0,
            fault_every_frames: None,
            stall_after_frames: None,
        }
    }
}

pub struct SyntheticSource {
    device: DeviceConfig,
    scene: SceneConfig,
    opens: usize,
}

impl SyntheticSource {
    pub fn new(device: DeviceConfig, scene: SceneConfig) -> Self {
        Self {
            device,
            scene,
            opens: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    type Device = SyntheticRadar;

    fn open(&mut self) -> Result<SyntheticRadar, DeviceError> {
        self.opens += 1;
        if self.opens <= self.device.open_failures {
            return Err(DeviceError::Unavailable(format!(
                "no radar enumerated (attempt {})",
                self.opens
            )));
        }
        Ok(SyntheticRadar {
            config: self.device.clone(),
            scene: Scene::new(self.scene.clone()),
            sequence: None,
            running: false,
            frames: 0,
            next_frame_at: None,
        })
    }
}

pub struct SyntheticRadar {
    config: DeviceConfig,
    scene: Scene,
    sequence: Option<SequenceDescriptor>,
    running: bool,
    frames: usize,
    next_frame_at: Option<Instant>,
}

impl SyntheticRadar {
    fn pace(&mut self, period: Duration) {
        let now = Instant::now();
        let due = self.next_frame_at.unwrap_or(now);
        if due > now {
            thread::sleep(due - now);
        }
        self.next_frame_at = Some(due.max(now) + period);
    }
}

impl RadarDevice for SyntheticRadar {
    fn configure(&mut self, sequence: &SequenceDescriptor) -> Result<(), DeviceError> {
        if sequence.chirps_per_frame == 0 || sequence.samples_per_chirp == 0 {
            return Err(DeviceError::Rejected(format!(
                "{} chirps x {} samples",
                sequence.chirps_per_frame, sequence.samples_per_chirp
            )));
        }
        self.sequence = Some(sequence.clone());
        Ok(())
    }

    fn start(&mut self) -> Result<(), DeviceError> {
        if self.sequence.is_none() {
            return Err(DeviceError::Rejected("start before configure".into()));
        }
        self.running = true;
        self.next_frame_at = None;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<RawFrame, DeviceError> {
        let sequence = match (&self.sequence, self.running) {
            (Some(sequence), true) => sequence.clone(),
            _ => return Err(DeviceError::Acquisition("stream not started".into())),
        };

        if self.config.stall_after_frames == Some(self.frames) {
            loop {
                thread::sleep(Duration::from_secs(3600));
            }
        }
        if self.config.pace_frames {
            self.pace(Duration::from_secs_f64(sequence.frame_repetition_time_s));
        }

        self.frames += 1;
        if let Some(every) = self.config.fault_every_frames.filter(|&n| n > 0) {
            if self.frames % every == 0 {
                return Err(DeviceError::Acquisition(format!(
                    "frame {} dropped by injected fault",
                    self.frames
                )));
            }
        }
        debug!(
            target: "simulator::device",
            "frame {} reflector at {:.3} m, {:+.3} m/s",
            self.frames,
            self.scene.distance_m(),
            self.scene.speed_m_s()
        );
        Ok(self.scene.render(&sequence))
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        if !self.running {
            return Err(DeviceError::Acquisition("stream not running".into()));
        }
        self.running = false;
        Ok(())
    }

    fn chirp_duration_s(&self, _sequence: &SequenceDescriptor) -> Option<f64> {
        Some(self.config.chirp_duration_us * 1e-6).filter(|d| *d > 0.0)
    }

    fn sensor_name(&self) -> String {
        self.config.sensor_name.clone()
    }
}
