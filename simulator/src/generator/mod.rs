pub mod device;
pub mod profile;
