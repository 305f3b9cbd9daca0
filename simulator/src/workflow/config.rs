use anyhow::Context;
use fmcwcore::acquisition::ControllerOptions;
use fmcwcore::model::{AcquisitionConfig, PartialConfig};
use fmcwcore::processing::smoother::DEFAULT_ALPHA;
use fmcwcore::store::{StoreOptions, DEFAULT_HISTORY_CAPACITY, DEFAULT_SECTOR_COUNT};
use fmcwcore::watchdog::DEFAULT_WATCHDOG_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::generator::device::DeviceConfig;
use crate::generator::profile::SceneConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSection {
    pub backoff_ms: u64,
    pub record_history: bool,
    pub record_sectors: bool,
    pub alpha: f64,
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            backoff_ms: 3_000,
            record_history: true,
            record_sectors: true,
            alpha: DEFAULT_ALPHA,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogSection {
    pub enabled: bool,
    pub timeout_ms: u64,
}

impl Default for WatchdogSection {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: DEFAULT_WATCHDOG_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub history_capacity: usize,
    pub sector_count: usize,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            sector_count: DEFAULT_SECTOR_COUNT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    pub bind: SocketAddr,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
        }
    }
}

/// Everything the service needs, loadable from YAML; every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Applied on top of the built-in defaults.
    pub acquisition: PartialConfig,
    pub controller: ControllerSection,
    pub watchdog: WatchdogSection,
    pub store: StoreSection,
    pub bridge: BridgeSection,
    pub device: DeviceConfig,
    pub scene: SceneConfig,
}

impl ServiceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading service config {}", path_ref.display()))?;
        let config: ServiceConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing service config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Command-line values win over whatever the file set.
    pub fn override_acquisition(&mut self, overrides: PartialConfig) {
        let base = &mut self.acquisition;
        if overrides.range_preset.is_some() {
            base.range_preset = overrides.range_preset;
            base.max_range_m = None;
            base.range_resolution_m = None;
        }
        base.max_range_m = overrides.max_range_m.or(base.max_range_m);
        base.range_resolution_m = overrides.range_resolution_m.or(base.range_resolution_m);
        base.frame_rate_hz = overrides.frame_rate_hz.or(base.frame_rate_hz);
        base.chirps_per_frame = overrides.chirps_per_frame.or(base.chirps_per_frame);
        base.peak_threshold = overrides.peak_threshold.or(base.peak_threshold);
    }

    pub fn acquisition_config(&self) -> anyhow::Result<AcquisitionConfig> {
        let config = self.acquisition.apply_to(&AcquisitionConfig::default());
        config
            .validate()
            .with_context(|| format!("invalid acquisition settings {}", config))?;
        Ok(config)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            backoff: Duration::from_millis(self.controller.backoff_ms),
            record_history: self.controller.record_history,
            record_sectors: self.controller.record_sectors,
            alpha: self.controller.alpha,
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            history_capacity: self.store.history_capacity,
            sector_count: self.store.sector_count,
        }
    }

    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_millis(self.watchdog.timeout_ms)
    }
}
