pub mod cancel;
pub mod controller;
pub mod source;

pub use cancel::CancelToken;
pub use controller::{AcquisitionController, AcquisitionState, ControllerOptions};
pub use source::{FrameSource, RadarDevice};
