use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::acquisition::{CancelToken, FrameSource, RadarDevice};
use crate::model::sequence::DEFAULT_CHIRP_DURATION_S;
use crate::model::{AcquisitionConfig, ChirpBudget, SequenceDescriptor};
use crate::prelude::{AcquisitionError, ConfigError, DeviceError, DevicePhase, ProcessingError};
use crate::processing::smoother::DEFAULT_ALPHA;
use crate::processing::{RangeDopplerProcessor, TemporalSmoother};
use crate::store::{AppliedConfig, DeviceStatus, SharedStateStore};
use crate::telemetry::LogManager;
use crate::watchdog::LivenessMarker;

pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionState {
    Disconnected,
    Configuring,
    Acquiring,
    FaultRecovery,
}

/// Behaviour switches for one controller instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerOptions {
    /// Wait between a failed open (or a fault) and the next open attempt.
    pub backoff: Duration,
    pub record_history: bool,
    pub record_sectors: bool,
    /// Smoothing factor handed to the [`TemporalSmoother`].
    pub alpha: f64,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF,
            record_history: true,
            record_sectors: true,
            alpha: DEFAULT_ALPHA,
        }
    }
}

struct ActiveSequence {
    config: AcquisitionConfig,
    sequence: SequenceDescriptor,
}

/// Drives one radar through connect, configure and acquire, recovering from faults forever.
///
/// The controller is the only writer of the published reading, the sector map
/// and the liveness marker. Reconfiguration requests arrive through the
/// store's watch slot and are honoured between frames.
pub struct AcquisitionController<S: FrameSource> {
    source: S,
    store: Arc<SharedStateStore>,
    liveness: Arc<LivenessMarker>,
    options: ControllerOptions,
    requests: watch::Receiver<AcquisitionConfig>,
    state: AcquisitionState,
    device: Option<S::Device>,
    processor: Option<RangeDopplerProcessor>,
    active: Option<ActiveSequence>,
    smoother: TemporalSmoother,
    retry_at: Option<Instant>,
    last_fault: Option<AcquisitionError>,
    reported_index_faults: u64,
    has_connected: bool,
    logger: LogManager,
}

impl<S: FrameSource> AcquisitionController<S> {
    pub fn new(
        source: S,
        store: Arc<SharedStateStore>,
        liveness: Arc<LivenessMarker>,
        options: ControllerOptions,
    ) -> Result<Self, ConfigError> {
        let smoother = TemporalSmoother::with_alpha(options.alpha)?;
        let requests = store.subscribe();
        Ok(Self {
            source,
            store,
            liveness,
            options,
            requests,
            state: AcquisitionState::Disconnected,
            device: None,
            processor: None,
            active: None,
            smoother,
            retry_at: None,
            last_fault: None,
            reported_index_faults: 0,
            has_connected: false,
            logger: LogManager::new("fmcwcore::acquisition"),
        })
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Time of the next open attempt, if one is being held back.
    pub fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Performs a single transition and returns the new state. Never sleeps;
    /// while a backoff is pending it stays `Disconnected` without touching the source.
    pub fn step(&mut self) -> AcquisitionState {
        let next = match self.state {
            AcquisitionState::Disconnected => self.connect(),
            AcquisitionState::Configuring => match self.configure() {
                Ok(()) => AcquisitionState::Acquiring,
                Err(err) => self.fault(err),
            },
            AcquisitionState::Acquiring => match self.acquire() {
                Ok(next) => next,
                Err(err) => self.fault(err),
            },
            AcquisitionState::FaultRecovery => self.recover(),
        };
        if next != self.state {
            self.logger
                .detail(&format!("state {:?} -> {:?}", self.state, next));
        }
        self.state = next;
        next
    }

    /// Steps until `cancel` fires, sleeping out backoffs, then stops the device.
    pub fn run(&mut self, cancel: &CancelToken) {
        self.logger.record("acquisition loop started");
        while !cancel.is_cancelled() {
            if let Some(deadline) = self.retry_at {
                if !cancel.sleep_until(deadline) {
                    break;
                }
            }
            self.step();
        }
        self.shutdown();
        self.logger.record("acquisition loop stopped");
    }

    /// Stops and releases the device, leaving the controller `Disconnected`.
    pub fn shutdown(&mut self) {
        self.stop_device();
        self.device = None;
        self.processor = None;
        self.active = None;
        self.state = AcquisitionState::Disconnected;
    }

    fn connect(&mut self) -> AcquisitionState {
        if let Some(deadline) = self.retry_at {
            if Instant::now() < deadline {
                return AcquisitionState::Disconnected;
            }
        }
        self.retry_at = None;
        self.store.publish_status(DeviceStatus::Connecting);

        match self.source.open() {
            Ok(device) => {
                let sensor = device.sensor_name();
                self.logger.record(&format!("opened {}", sensor));
                if self.has_connected {
                    self.store.metrics().record_reconnect();
                }
                self.has_connected = true;
                self.store.device_connected(sensor);
                self.device = Some(device);
                AcquisitionState::Configuring
            }
            Err(source) => {
                let err = AcquisitionError::device(DevicePhase::Open, source);
                self.logger.warn(&format!(
                    "{}; retrying in {:?}",
                    err, self.options.backoff
                ));
                self.store.metrics().record_fault();
                self.store.device_lost(err.to_string());
                self.retry_at = Some(Instant::now() + self.options.backoff);
                AcquisitionState::Disconnected
            }
        }
    }

    fn configure(&mut self) -> Result<(), AcquisitionError> {
        let config = self.requests.borrow_and_update().clone();
        config.validate()?;
        let mut sequence = SequenceDescriptor::from_config(&config);

        let device = self.device.as_mut().ok_or_else(|| {
            AcquisitionError::device(
                DevicePhase::Configure,
                DeviceError::Unavailable("no open device".into()),
            )
        })?;

        let chirp_duration_s = device
            .chirp_duration_s(&sequence)
            .filter(|duration| duration.is_finite() && *duration > 0.0)
            .unwrap_or(DEFAULT_CHIRP_DURATION_S);
        let budget = ChirpBudget::fit(
            sequence.chirps_per_frame,
            chirp_duration_s,
            config.frame_rate_hz,
        );
        if budget.is_clamped() {
            self.logger.warn(&format!(
                "{} chirps of {:.1} us overrun the {} Hz frame budget; using {}",
                budget.requested,
                chirp_duration_s * 1e6,
                config.frame_rate_hz,
                budget.applied
            ));
            self.store.metrics().record_clamp();
            sequence.chirps_per_frame = budget.applied;
        }

        device
            .configure(&sequence)
            .map_err(|err| AcquisitionError::device(DevicePhase::Configure, err))?;
        device
            .start()
            .map_err(|err| AcquisitionError::device(DevicePhase::Start, err))?;

        self.processor = Some(RangeDopplerProcessor::new(sequence.stage_config())?);
        self.reported_index_faults = 0;
        self.smoother.reset();
        self.store.apply_config(AppliedConfig {
            config: config.clone(),
            samples_per_chirp: sequence.samples_per_chirp,
            budget,
        });
        self.logger.record(&format!(
            "acquiring: {} ({} samples x {} chirps)",
            config, sequence.samples_per_chirp, sequence.chirps_per_frame
        ));
        self.active = Some(ActiveSequence { config, sequence });
        Ok(())
    }

    fn acquire(&mut self) -> Result<AcquisitionState, AcquisitionError> {
        let (Some(device), Some(processor), Some(active)) = (
            self.device.as_mut(),
            self.processor.as_mut(),
            self.active.as_ref(),
        ) else {
            return Err(ProcessingError::Internal(
                "acquiring without a configured device".into(),
            )
            .into());
        };

        let frame = device
            .next_frame()
            .map_err(|err| AcquisitionError::device(DevicePhase::NextFrame, err))?;
        let sample = processor.process(frame)?;
        let index_faults = processor.index_faults();

        let reading = self.smoother.update(
            sample,
            active.config.peak_threshold,
            active.sequence.speed_resolution_m_s,
        );
        self.store.publish_cycle(
            &reading,
            active.config.max_range_cm(),
            self.options.record_history,
            self.options.record_sectors,
        );

        let metrics = self.store.metrics();
        metrics.record_frame(reading.direction.is_target());
        metrics.record_index_faults(index_faults.saturating_sub(self.reported_index_faults));
        self.reported_index_faults = index_faults;
        self.liveness.touch();

        if self.requests.has_changed().unwrap_or(false) {
            self.logger
                .record("reconfiguration pending, restarting acquisition");
            self.stop_device();
            self.store.publish_status(DeviceStatus::Reconfiguring);
            return Ok(AcquisitionState::Configuring);
        }
        Ok(AcquisitionState::Acquiring)
    }

    fn fault(&mut self, err: AcquisitionError) -> AcquisitionState {
        match &self.active {
            Some(active) => self
                .logger
                .warn(&format!("{} (config: {})", err, active.config)),
            None => self.logger.warn(&format!(
                "{} (requested: {})",
                err,
                self.store.requested_config()
            )),
        }
        self.store.metrics().record_fault();
        self.last_fault = Some(err);
        AcquisitionState::FaultRecovery
    }

    fn recover(&mut self) -> AcquisitionState {
        self.stop_device();
        self.device = None;
        self.processor = None;
        self.active = None;
        self.smoother.reset();

        let fault = self
            .last_fault
            .take()
            .map(|err| err.to_string())
            .unwrap_or_else(|| String::from("unknown fault"));
        self.store.device_lost(fault);
        self.retry_at = Some(Instant::now() + self.options.backoff);
        self.logger.record(&format!(
            "device released, reconnecting in {:?}",
            self.options.backoff
        ));
        AcquisitionState::Disconnected
    }

    fn stop_device(&mut self) {
        if let Some(device) = self.device.as_mut() {
            if let Err(err) = device.stop() {
                self.logger
                    .warn(&AcquisitionError::device(DevicePhase::Stop, err).to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Direction, PartialConfig, RangePreset, RawFrame, ToneTarget};
    use crate::store::StoreOptions;
    use std::sync::Mutex;
    use std::thread;

    #[derive(Debug, Default)]
    struct DeviceLog {
        opens: usize,
        sequences: Vec<SequenceDescriptor>,
        starts: usize,
        stops: usize,
        frames: usize,
        drops: usize,
    }

    #[derive(Debug, Clone)]
    struct Script {
        open_failures: usize,
        fail_at_frame: Option<usize>,
        /// The first n `configure` calls are rejected.
        fail_configure: usize,
        /// The first n `start` calls fail.
        fail_start: usize,
        /// Frames carry two extra samples per chirp.
        wrong_shape: bool,
        chirp_duration_s: Option<f64>,
        target: ToneTarget,
    }

    impl Default for Script {
        fn default() -> Self {
            Self {
                open_failures: 0,
                fail_at_frame: None,
                fail_configure: 0,
                fail_start: 0,
                wrong_shape: false,
                chirp_duration_s: Some(128e-6),
                target: ToneTarget {
                    range_bin: 20.0,
                    doppler_bin: -1.0,
                    amplitude: 1.0,
                },
            }
        }
    }

    struct ScriptedSource {
        script: Script,
        log: Arc<Mutex<DeviceLog>>,
    }

    struct ScriptedDevice {
        script: Script,
        log: Arc<Mutex<DeviceLog>>,
        shape: (usize, usize),
    }

    impl FrameSource for ScriptedSource {
        type Device = ScriptedDevice;

        fn open(&mut self) -> Result<ScriptedDevice, DeviceError> {
            let mut log = self.log.lock().unwrap();
            log.opens += 1;
            if log.opens <= self.script.open_failures {
                return Err(DeviceError::Unavailable("no radar attached".into()));
            }
            Ok(ScriptedDevice {
                script: self.script.clone(),
                log: Arc::clone(&self.log),
                shape: (0, 0),
            })
        }
    }

    impl RadarDevice for ScriptedDevice {
        fn configure(&mut self, sequence: &SequenceDescriptor) -> Result<(), DeviceError> {
            self.shape = (
                sequence.chirps_per_frame as usize,
                sequence.samples_per_chirp as usize,
            );
            let mut log = self.log.lock().unwrap();
            log.sequences.push(sequence.clone());
            if log.sequences.len() <= self.script.fail_configure {
                return Err(DeviceError::Rejected("sequence not supported".into()));
            }
            Ok(())
        }

        fn start(&mut self) -> Result<(), DeviceError> {
            let mut log = self.log.lock().unwrap();
            log.starts += 1;
            if log.starts <= self.script.fail_start {
                return Err(DeviceError::Unavailable("radar unplugged".into()));
            }
            Ok(())
        }

        fn next_frame(&mut self) -> Result<RawFrame, DeviceError> {
            let mut log = self.log.lock().unwrap();
            log.frames += 1;
            if self.script.fail_at_frame == Some(log.frames) {
                return Err(DeviceError::Acquisition("usb transfer timed out".into()));
            }
            let samples = if self.script.wrong_shape {
                self.shape.1 + 2
            } else {
                self.shape.1
            };
            Ok(self.script.target.render(self.shape.0, samples))
        }

        fn stop(&mut self) -> Result<(), DeviceError> {
            self.log.lock().unwrap().stops += 1;
            Err(DeviceError::Acquisition("already stopped".into()))
        }

        fn chirp_duration_s(&self, _sequence: &SequenceDescriptor) -> Option<f64> {
            self.script.chirp_duration_s
        }

        fn sensor_name(&self) -> String {
            "scripted radar".into()
        }
    }

    impl Drop for ScriptedDevice {
        fn drop(&mut self) {
            if let Ok(mut log) = self.log.lock() {
                log.drops += 1;
            }
        }
    }

    fn config() -> AcquisitionConfig {
        AcquisitionConfig::default().with_preset(RangePreset::Standard1_6m)
    }

    fn controller(
        script: Script,
        options: ControllerOptions,
    ) -> (
        AcquisitionController<ScriptedSource>,
        Arc<SharedStateStore>,
        Arc<Mutex<DeviceLog>>,
    ) {
        let store = Arc::new(SharedStateStore::new(config(), StoreOptions::default()).unwrap());
        let log = Arc::new(Mutex::new(DeviceLog::default()));
        let source = ScriptedSource {
            script,
            log: Arc::clone(&log),
        };
        let controller = AcquisitionController::new(
            source,
            Arc::clone(&store),
            Arc::new(LivenessMarker::new()),
            options,
        )
        .unwrap();
        (controller, store, log)
    }

    fn immediate() -> ControllerOptions {
        ControllerOptions {
            backoff: Duration::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn static_target_settles_at_its_distance() {
        let (mut controller, store, _) = controller(Script::default(), immediate());
        assert_eq!(controller.step(), AcquisitionState::Configuring);
        assert_eq!(controller.step(), AcquisitionState::Acquiring);
        for _ in 0..50 {
            assert_eq!(controller.step(), AcquisitionState::Acquiring);
        }

        let latest = store.read_latest();
        assert_eq!(latest.status, DeviceStatus::Connected);
        assert_eq!(latest.reading.direction, Direction::Static);
        assert!((latest.reading.distance_cm - 100.0).abs() < 1e-6);
        let stats = latest.reading.stats.distance_cm;
        assert!((stats.min.unwrap() - 100.0).abs() < 1e-6);
        assert!((stats.max.unwrap() - 100.0).abs() < 1e-6);
        assert_eq!(latest.metrics.frames, 50);
        assert_eq!(latest.sensor.as_deref(), Some("scripted radar"));
        assert!(latest.clamp_warning.is_none());

        assert_eq!(store.read_history().len(), 50);
        let sectors = store.read_sectors();
        assert_eq!(sectors[40], Direction::Static);
    }

    #[test]
    fn applied_sequence_follows_requested_geometry() {
        let (mut controller, store, log) = controller(Script::default(), immediate());
        controller.step();
        controller.step();

        let log = log.lock().unwrap();
        let sequence = &log.sequences[0];
        assert_eq!(sequence.samples_per_chirp, 64);
        assert_eq!(sequence.chirps_per_frame, 32);
        assert!((sequence.frame_repetition_time_s - 0.05).abs() < 1e-12);
        assert_eq!(log.starts, 1);

        let applied = store.read_latest().applied.unwrap();
        assert_eq!(applied.samples_per_chirp, 64);
        assert_eq!(applied.config, config());
    }

    #[test]
    fn reconfiguration_is_applied_between_frames_and_clamped() {
        let (mut controller, store, log) = controller(Script::default(), immediate());
        controller.step();
        controller.step();
        controller.step();

        store
            .submit_reconfiguration(PartialConfig {
                frame_rate_hz: Some(60.0),
                chirps_per_frame: Some(200),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(controller.step(), AcquisitionState::Configuring);
        assert_eq!(store.read_latest().status, DeviceStatus::Reconfiguring);
        assert_eq!(controller.step(), AcquisitionState::Acquiring);

        let latest = store.read_latest();
        assert_eq!(latest.status, DeviceStatus::Connected);
        let warning = latest.clamp_warning.unwrap();
        assert_eq!(warning.requested, 200);
        assert_eq!(warning.applied, 117);
        assert_eq!(latest.metrics.chirp_clamps, 1);
        assert_eq!(latest.reading.stats.distance_cm.min, None);

        {
            let log = log.lock().unwrap();
            assert_eq!(log.sequences.last().unwrap().chirps_per_frame, 117);
            assert_eq!(log.stops, 1);
        }
        assert_eq!(controller.step(), AcquisitionState::Acquiring);
        assert_eq!(store.read_latest().metrics.faults, 0);
    }

    #[test]
    fn fitting_request_is_not_clamped() {
        let (mut controller, store, log) = controller(Script::default(), immediate());
        controller.step();
        controller.step();
        store
            .submit_reconfiguration(PartialConfig {
                frame_rate_hz: Some(60.0),
                chirps_per_frame: Some(64),
                ..Default::default()
            })
            .unwrap();
        controller.step();
        controller.step();
        assert!(store.read_latest().clamp_warning.is_none());
        assert_eq!(log.lock().unwrap().sequences[1].chirps_per_frame, 64);
    }

    #[test]
    fn frame_failure_triggers_full_reconnect() {
        let script = Script {
            fail_at_frame: Some(3),
            ..Default::default()
        };
        let (mut controller, store, log) = controller(script, immediate());
        controller.step();
        controller.step();
        controller.step();
        controller.step();
        assert!(store.read_sectors().iter().any(|d| d.is_target()));

        assert_eq!(controller.step(), AcquisitionState::FaultRecovery);
        assert_eq!(controller.step(), AcquisitionState::Disconnected);
        let latest = store.read_latest();
        assert_eq!(latest.status, DeviceStatus::WaitingForDevice);
        assert_eq!(latest.reading.direction, Direction::None);
        assert!(latest.last_fault.unwrap().contains("next_frame"));
        assert!(store.read_sectors().iter().all(|d| !d.is_target()));

        assert_eq!(controller.step(), AcquisitionState::Configuring);
        assert_eq!(controller.step(), AcquisitionState::Acquiring);
        assert_eq!(controller.step(), AcquisitionState::Acquiring);

        let latest = store.read_latest();
        assert_eq!(latest.metrics.faults, 1);
        assert_eq!(latest.metrics.reconnects, 1);
        let stats = latest.reading.stats.distance_cm;
        assert_eq!(stats.max, stats.min);
        assert_eq!(log.lock().unwrap().opens, 2);
    }

    fn assert_recovers_from_setup_fault(script: Script, phase: &str) {
        let (mut controller, store, log) = controller(script, immediate());
        assert_eq!(controller.step(), AcquisitionState::Configuring);
        assert_eq!(controller.step(), AcquisitionState::FaultRecovery);
        assert_eq!(controller.step(), AcquisitionState::Disconnected);

        let latest = store.read_latest();
        assert_eq!(latest.status, DeviceStatus::WaitingForDevice);
        assert!(latest.applied.is_none());
        assert!(latest.last_fault.unwrap().contains(phase));
        assert_eq!(latest.metrics.faults, 1);
        {
            let log = log.lock().unwrap();
            assert_eq!(log.stops, 1);
            assert_eq!(log.drops, 1);
        }

        assert_eq!(controller.step(), AcquisitionState::Configuring);
        assert_eq!(controller.step(), AcquisitionState::Acquiring);
        assert_eq!(controller.step(), AcquisitionState::Acquiring);
        let latest = store.read_latest();
        assert_eq!(latest.status, DeviceStatus::Connected);
        assert_eq!(latest.metrics.reconnects, 1);
        assert_eq!(log.lock().unwrap().opens, 2);
    }

    #[test]
    fn rejected_sequence_recovers_through_reconnect() {
        let script = Script {
            fail_configure: 1,
            ..Default::default()
        };
        assert_recovers_from_setup_fault(script, "configure");
    }

    #[test]
    fn failed_start_recovers_through_reconnect() {
        let script = Script {
            fail_start: 1,
            ..Default::default()
        };
        assert_recovers_from_setup_fault(script, "start");
    }

    #[test]
    fn misshaped_frame_is_a_processing_fault() {
        let script = Script {
            wrong_shape: true,
            ..Default::default()
        };
        let (mut controller, store, log) = controller(script, immediate());
        controller.step();
        assert_eq!(controller.step(), AcquisitionState::Acquiring);
        assert_eq!(controller.step(), AcquisitionState::FaultRecovery);
        assert_eq!(controller.step(), AcquisitionState::Disconnected);

        let latest = store.read_latest();
        assert_eq!(latest.status, DeviceStatus::WaitingForDevice);
        assert!(latest.last_fault.unwrap().contains("frame shape"));
        assert_eq!(latest.metrics.frames, 0);
        assert!(store.read_history().is_empty());
        let log = log.lock().unwrap();
        assert_eq!(log.stops, 1);
        assert_eq!(log.drops, 1);
    }

    #[test]
    fn open_failures_wait_for_device() {
        let script = Script {
            open_failures: 2,
            ..Default::default()
        };
        let (mut controller, store, log) = controller(script, immediate());
        assert_eq!(controller.step(), AcquisitionState::Disconnected);
        assert_eq!(store.read_latest().status, DeviceStatus::WaitingForDevice);
        assert_eq!(controller.step(), AcquisitionState::Disconnected);
        assert_eq!(controller.step(), AcquisitionState::Configuring);
        assert_eq!(log.lock().unwrap().opens, 3);
        assert_eq!(store.read_latest().metrics.faults, 2);
    }

    #[test]
    fn backoff_holds_off_the_next_open() {
        let script = Script {
            open_failures: 1,
            ..Default::default()
        };
        let options = ControllerOptions {
            backoff: Duration::from_secs(3600),
            ..Default::default()
        };
        let (mut controller, _, log) = controller(script, options);
        controller.step();
        assert!(controller.retry_at().is_some());
        for _ in 0..5 {
            assert_eq!(controller.step(), AcquisitionState::Disconnected);
        }
        assert_eq!(log.lock().unwrap().opens, 1);
    }

    #[test]
    fn unknown_chirp_duration_uses_reference_value() {
        let script = Script {
            chirp_duration_s: None,
            ..Default::default()
        };
        let (mut controller, store, _) = controller(script, immediate());
        store
            .submit_reconfiguration(PartialConfig {
                frame_rate_hz: Some(60.0),
                chirps_per_frame: Some(200),
                ..Default::default()
            })
            .unwrap();
        controller.step();
        controller.step();
        let budget = store.read_latest().applied.unwrap().budget;
        assert_eq!(budget.chirp_duration_s, DEFAULT_CHIRP_DURATION_S);
        assert_eq!(budget.applied, 117);
    }

    #[test]
    fn disabled_outputs_are_left_empty() {
        let options = ControllerOptions {
            record_history: false,
            record_sectors: false,
            ..immediate()
        };
        let (mut controller, store, _) = controller(Script::default(), options);
        for _ in 0..6 {
            controller.step();
        }
        assert!(store.read_history().is_empty());
        assert!(store.read_sectors().iter().all(|d| !d.is_target()));
        assert_eq!(store.read_latest().reading.direction, Direction::Static);
    }

    #[test]
    fn invalid_alpha_is_rejected() {
        let store = Arc::new(SharedStateStore::new(config(), StoreOptions::default()).unwrap());
        let source = ScriptedSource {
            script: Script::default(),
            log: Arc::new(Mutex::new(DeviceLog::default())),
        };
        let options = ControllerOptions {
            alpha: 0.0,
            ..Default::default()
        };
        let liveness = Arc::new(LivenessMarker::new());
        assert!(AcquisitionController::new(source, store, liveness, options).is_err());
    }

    #[test]
    fn run_stops_the_device_when_cancelled() {
        let (mut controller, store, log) = controller(Script::default(), immediate());
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let handle = thread::spawn(move || {
            controller.run(&remote);
            controller.state()
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while store.read_latest().metrics.frames < 10 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        cancel.cancel();
        assert_eq!(handle.join().unwrap(), AcquisitionState::Disconnected);
        assert!(store.read_latest().metrics.frames >= 10);
        assert_eq!(log.lock().unwrap().stops, 1);
    }
}
