//! Signal processing and acquisition control for a single-target FMCW presence radar.
//!
//! Raw antenna frames flow through the range-Doppler pipeline in [`processing`],
//! get smoothed and classified, and are published into a [`store::SharedStateStore`]
//! by the [`acquisition::AcquisitionController`]. A [`watchdog::Watchdog`] restarts
//! the process when the acquisition loop stops making progress.

pub mod acquisition;
pub mod math;
pub mod model;
pub mod prelude;
pub mod processing;
pub mod store;
pub mod telemetry;
pub mod watchdog;

pub use prelude::{AcquisitionError, ConfigError, DeviceError, ProcessingStage, StageInput, StageOutput};
