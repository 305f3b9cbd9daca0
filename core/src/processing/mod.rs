pub mod clutter;
pub mod doppler;
pub mod processor;
pub mod range;
pub mod smoother;

pub use clutter::ClutterStage;
pub use doppler::DopplerStage;
pub use processor::RangeDopplerProcessor;
pub use range::RangeStage;
pub use smoother::TemporalSmoother;
