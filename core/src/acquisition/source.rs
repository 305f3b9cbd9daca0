use crate::model::{RawFrame, SequenceDescriptor};
use crate::prelude::DeviceError;

/// Handle to an opened radar. Every call may block; none of them are cancellable.
pub trait RadarDevice: Send {
    fn configure(&mut self, sequence: &SequenceDescriptor) -> Result<(), DeviceError>;
    fn start(&mut self) -> Result<(), DeviceError>;

    /// Blocks for up to one frame period.
    fn next_frame(&mut self) -> Result<RawFrame, DeviceError>;

    /// Best-effort; callers log failures and carry on.
    fn stop(&mut self) -> Result<(), DeviceError>;

    /// Duration of one chirp for `sequence`, when the device can tell.
    fn chirp_duration_s(&self, _sequence: &SequenceDescriptor) -> Option<f64> {
        None
    }

    fn sensor_name(&self) -> String {
        String::from("fmcw radar")
    }
}

/// Something that can hand out a [`RadarDevice`], such as a USB enumerator or a simulator.
pub trait FrameSource: Send {
    type Device: RadarDevice;

    fn open(&mut self) -> Result<Self::Device, DeviceError>;
}
