use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::model::{AcquisitionConfig, ChirpBudget, Direction, PartialConfig, SmoothedReading};
use crate::prelude::ConfigError;
use crate::store::history::{HistoryEntry, HistoryRing, DEFAULT_HISTORY_CAPACITY};
use crate::store::sectors::{SectorOccupancy, DEFAULT_SECTOR_COUNT};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};

/// Device state as shown to observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    #[default]
    Connecting,
    Connected,
    Reconfiguring,
    WaitingForDevice,
}

/// Configuration the device is actually running with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedConfig {
    pub config: AcquisitionConfig,
    pub samples_per_chirp: u32,
    pub budget: ChirpBudget,
}

/// Everything an observer needs to render the current state.
#[derive(Debug, Clone, Serialize)]
pub struct LatestReading {
    pub status: DeviceStatus,
    pub reading: SmoothedReading,
    pub applied: Option<AppliedConfig>,
    /// Present when the last configuration had to reduce the chirp count.
    pub clamp_warning: Option<ChirpBudget>,
    pub sensor: Option<String>,
    pub sensor_uptime: Option<Duration>,
    pub program_uptime: Duration,
    pub last_fault: Option<String>,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    pub history_capacity: usize,
    pub sector_count: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            sector_count: DEFAULT_SECTOR_COUNT,
        }
    }
}

#[derive(Debug, Default)]
struct Published {
    status: DeviceStatus,
    reading: SmoothedReading,
    applied: Option<AppliedConfig>,
    clamp_warning: Option<ChirpBudget>,
    sensor: Option<String>,
    connected_at: Option<Instant>,
    last_fault: Option<String>,
}

/// State shared between the acquisition loop (sole writer) and observers.
///
/// The requested configuration lives in a single-slot watch channel: observers
/// merge partial requests into it, the controller picks up the latest value at
/// its next checkpoint.
pub struct SharedStateStore {
    requested: watch::Sender<AcquisitionConfig>,
    published: RwLock<Published>,
    history: Mutex<HistoryRing>,
    sectors: Mutex<SectorOccupancy>,
    metrics: MetricsRecorder,
    started_at: Instant,
    logger: LogManager,
}

impl SharedStateStore {
    pub fn new(initial: AcquisitionConfig, options: StoreOptions) -> Result<Self, ConfigError> {
        initial.validate()?;
        let (requested, _) = watch::channel(initial);
        Ok(Self {
            requested,
            published: RwLock::new(Published::default()),
            history: Mutex::new(HistoryRing::with_capacity(options.history_capacity)),
            sectors: Mutex::new(SectorOccupancy::new(options.sector_count)),
            metrics: MetricsRecorder::new(),
            started_at: Instant::now(),
            logger: LogManager::new("fmcwcore::store"),
        })
    }

    /// Receiver for the requested configuration; the current value counts as seen.
    pub fn subscribe(&self) -> watch::Receiver<AcquisitionConfig> {
        self.requested.subscribe()
    }

    pub fn requested_config(&self) -> AcquisitionConfig {
        self.requested.borrow().clone()
    }

    /// Merges `partial` into the pending request. Invalid results leave the slot untouched.
    pub fn submit_reconfiguration(
        &self,
        partial: PartialConfig,
    ) -> Result<AcquisitionConfig, ConfigError> {
        let mut outcome = Err(ConfigError::NoChirps);
        self.requested.send_if_modified(|current| {
            let merged = partial.apply_to(current);
            if let Err(err) = merged.validate() {
                outcome = Err(err);
                return false;
            }
            outcome = Ok(merged.clone());
            if *current == merged {
                return false;
            }
            *current = merged;
            true
        });
        match &outcome {
            Ok(config) => self
                .logger
                .record(&format!("reconfiguration requested: {}", config)),
            Err(err) => self
                .logger
                .warn(&format!("reconfiguration rejected: {}", err)),
        }
        outcome
    }

    pub fn read_latest(&self) -> LatestReading {
        let published = self.read_published();
        LatestReading {
            status: published.status,
            reading: published.reading,
            applied: published.applied.clone(),
            clamp_warning: published.clamp_warning,
            sensor: published.sensor.clone(),
            sensor_uptime: published.connected_at.map(|at| at.elapsed()),
            program_uptime: self.started_at.elapsed(),
            last_fault: published.last_fault.clone(),
            metrics: self.metrics.snapshot(),
        }
    }

    pub fn read_history(&self) -> Vec<HistoryEntry> {
        lock(&self.history).to_vec()
    }

    pub fn read_sectors(&self) -> Vec<Direction> {
        lock(&self.sectors).cells().to_vec()
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub(crate) fn publish_status(&self, status: DeviceStatus) {
        self.write_published().status = status;
    }

    pub(crate) fn device_connected(&self, sensor: String) {
        let mut published = self.write_published();
        published.status = DeviceStatus::Connecting;
        published.sensor = Some(sensor);
        published.connected_at = Some(Instant::now());
    }

    pub(crate) fn device_lost(&self, fault: String) {
        {
            let mut published = self.write_published();
            published.status = DeviceStatus::WaitingForDevice;
            published.reading = SmoothedReading::default();
            published.sensor = None;
            published.connected_at = None;
            published.last_fault = Some(fault);
        }
        lock(&self.sectors).reset();
    }

    pub(crate) fn apply_config(&self, applied: AppliedConfig) {
        {
            let mut published = self.write_published();
            published.clamp_warning = applied.budget.is_clamped().then_some(applied.budget);
            published.applied = Some(applied);
            published.reading = SmoothedReading::default();
            published.status = DeviceStatus::Connected;
        }
        lock(&self.sectors).reset();
    }

    /// Publishes one cycle's reading; history and sectors are optional outputs.
    pub(crate) fn publish_cycle(
        &self,
        reading: &SmoothedReading,
        max_range_cm: f64,
        record_history: bool,
        record_sectors: bool,
    ) {
        self.write_published().reading = *reading;
        if record_history {
            lock(&self.history).push(HistoryEntry {
                distance_cm: reading.distance_cm,
                direction: reading.direction,
            });
        }
        if record_sectors && reading.direction.is_target() {
            lock(&self.sectors).record(reading.distance_cm, max_range_cm, reading.direction);
        }
    }

    fn read_published(&self) -> RwLockReadGuard<'_, Published> {
        self.published.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_published(&self) -> RwLockWriteGuard<'_, Published> {
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
