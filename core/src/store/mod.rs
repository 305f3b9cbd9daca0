pub mod history;
pub mod sectors;
pub mod shared;

pub use history::{HistoryEntry, HistoryRing, DEFAULT_HISTORY_CAPACITY};
pub use sectors::{SectorOccupancy, DEFAULT_SECTOR_COUNT};
pub use shared::{AppliedConfig, DeviceStatus, LatestReading, SharedStateStore, StoreOptions};
