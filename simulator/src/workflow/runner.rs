use crate::generator::device::SyntheticSource;
use crate::gui_bridge::bridge::GuiBridge;
use crate::workflow::config::ServiceConfig;
use anyhow::{bail, Context};
use fmcwcore::acquisition::{AcquisitionController, CancelToken};
use fmcwcore::store::{LatestReading, SharedStateStore};
use fmcwcore::telemetry::LogManager;
use fmcwcore::watchdog::{LivenessMarker, ProcessRestart, Watchdog, WatchdogOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::sync::watch;

/// Grace period for the acquisition thread once shutdown is requested.
const JOIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub struct OfflineSummary {
    pub latest: LatestReading,
    pub history_len: usize,
    pub steps: usize,
}

#[derive(Clone)]
pub struct Runner {
    config: ServiceConfig,
    logger: LogManager,
}

impl Runner {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            logger: LogManager::new("simulator::runner"),
        }
    }

    fn build_store(&self) -> anyhow::Result<Arc<SharedStateStore>> {
        let initial = self.config.acquisition_config()?;
        let store = SharedStateStore::new(initial, self.config.store_options())
            .context("creating shared state store")?;
        Ok(Arc::new(store))
    }

    fn build_source(&self) -> SyntheticSource {
        SyntheticSource::new(self.config.device.clone(), self.config.scene.clone())
    }

    /// Drives the controller synchronously until `frames` cycles have been published.
    pub fn execute(&self, frames: usize) -> anyhow::Result<OfflineSummary> {
        let store = self.build_store()?;
        let mut options = self.config.controller_options();
        options.backoff = Duration::ZERO;
        let mut controller = AcquisitionController::new(
            self.build_source(),
            Arc::clone(&store),
            Arc::new(LivenessMarker::new()),
            options,
        )
        .context("creating acquisition controller")?;

        let step_limit = frames.saturating_mul(4).saturating_add(16);
        let mut steps = 0;
        while store.metrics().snapshot().frames < frames as u64 {
            if steps >= step_limit {
                let latest = store.read_latest();
                bail!(
                    "only {} of {} frames acquired after {} steps (last fault: {})",
                    latest.metrics.frames,
                    frames,
                    steps,
                    latest.last_fault.unwrap_or_else(|| "none".into())
                );
            }
            controller.step();
            steps += 1;
        }
        controller.shutdown();

        Ok(OfflineSummary {
            latest: store.read_latest(),
            history_len: store.read_history().len(),
            steps,
        })
    }

    /// Runs controller, watchdog and HTTP bridge until Ctrl+C.
    pub fn serve(&self) -> anyhow::Result<()> {
        let store = self.build_store()?;
        let liveness = Arc::new(LivenessMarker::new());
        let mut controller = AcquisitionController::new(
            self.build_source(),
            Arc::clone(&store),
            Arc::clone(&liveness),
            self.config.controller_options(),
        )
        .context("creating acquisition controller")?;

        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating service runtime")?;

        let outcome = runtime.block_on(async {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let cancel = CancelToken::new();

            let (_, server) = GuiBridge::new(Arc::clone(&store))
                .bind(self.config.bridge.bind, shutdown_rx.clone())?;
            let server = tokio::spawn(server);

            let remote = cancel.clone();
            let acquisition = tokio::task::spawn_blocking(move || controller.run(&remote));

            let watchdog = if self.config.watchdog.enabled {
                let watchdog = Watchdog::new(
                    self.config.watchdog_timeout(),
                    Arc::clone(&liveness),
                    Arc::new(ProcessRestart),
                );
                Some(tokio::spawn(watchdog.run(shutdown_rx)))
            } else {
                None
            };

            self.logger
                .record("service running (Ctrl+C to stop)");
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            self.logger.record("shutdown requested");

            cancel.cancel();
            // A send error only means every receiver already finished.
            let _ = shutdown_tx.send(true);

            if let Some(watchdog) = watchdog {
                if let WatchdogOutcome::Restarted(stale) =
                    watchdog.await.context("joining watchdog")?
                {
                    self.logger
                        .warn(&format!("watchdog fired during shutdown after {:?}", stale));
                }
            }
            server.await.context("joining HTTP bridge")?;
            match tokio::time::timeout(JOIN_GRACE, acquisition).await {
                Ok(joined) => joined.context("joining acquisition loop")?,
                Err(_) => self
                    .logger
                    .warn("acquisition loop still blocked in the device, leaving it behind"),
            }
            Ok::<(), anyhow::Error>(())
        });

        // Drop the runtime without waiting on a device call that never returns.
        runtime.shutdown_background();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::device::DeviceConfig;
    use crate::generator::profile::SceneConfig;
    use fmcwcore::model::{PartialConfig, RangePreset};

    fn offline_config(scene: SceneConfig) -> ServiceConfig {
        ServiceConfig {
            acquisition: PartialConfig {
                range_preset: Some(RangePreset::Standard1_6m),
                ..Default::default()
            },
            device: DeviceConfig {
                pace_frames: false,
                ..Default::default()
            },
            scene,
            ..Default::default()
        }
    }

    #[test]
    fn offline_run_tracks_an_oscillating_target() {
        let scene = SceneConfig {
            start_distance_m: 1.0,
            near_m: 0.95,
            far_m: 1.05,
            speed_m_s: -0.2,
            noise: 0.01,
            ..Default::default()
        };
        let summary = Runner::new(offline_config(scene)).execute(50).unwrap();
        assert_eq!(summary.latest.metrics.frames, 50);
        assert_eq!(summary.history_len, 50);
        assert!(summary.latest.reading.direction.is_target());
        assert!((summary.latest.reading.distance_cm - 100.0).abs() <= 10.0);
        assert_eq!(summary.latest.metrics.no_target_frames, 0);
    }

    #[test]
    fn offline_run_survives_injected_faults() {
        let mut config = offline_config(SceneConfig::default());
        config.device.fault_every_frames = Some(10);
        config.device.open_failures = 1;
        let summary = Runner::new(config).execute(30).unwrap();
        assert_eq!(summary.latest.metrics.frames, 30);
        assert!(summary.latest.metrics.faults >= 3);
        assert!(summary.latest.metrics.reconnects >= 2);
    }

    #[test]
    fn offline_run_gives_up_when_device_never_opens() {
        let mut config = offline_config(SceneConfig::default());
        config.device.open_failures = usize::MAX;
        let err = Runner::new(config).execute(5).unwrap_err();
        assert!(err.to_string().contains("0 of 5 frames"));
    }

    #[test]
    fn serve_fails_fast_when_the_bridge_port_is_taken() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = offline_config(SceneConfig::default());
        config.bridge.bind = taken.local_addr().unwrap();
        let err = Runner::new(config).serve().unwrap_err();
        assert!(format!("{:#}", err).contains("binding HTTP bridge"));
    }
}
