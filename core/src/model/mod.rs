pub mod config;
pub mod frame;
pub mod presets;
pub mod reading;
pub mod sequence;

pub use config::{AcquisitionConfig, PartialConfig};
pub use frame::{RawFrame, ToneTarget};
pub use presets::{RangePreset, FRAME_RATES_HZ};
pub use reading::{Direction, Extent, ProcessedSample, ReadingStats, SmoothedReading};
pub use sequence::{ChirpBudget, SequenceDescriptor};
