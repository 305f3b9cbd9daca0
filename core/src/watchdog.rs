//! Liveness supervision for the acquisition loop.
//!
//! The controller touches a [`LivenessMarker`] after every successful cycle. The
//! [`Watchdog`] polls it at half its timeout and, once the marker is older than
//! the timeout, fires its [`RestartAction`] a single time and returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::telemetry::LogManager;

pub const DEFAULT_WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Timestamp of the last successful acquisition cycle.
#[derive(Debug)]
pub struct LivenessMarker {
    origin: Instant,
    last_nanos: AtomicU64,
}

impl LivenessMarker {
    /// A fresh marker counts as touched now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_nanos: AtomicU64::new(0),
        }
    }

    pub fn touch(&self) {
        let nanos = u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.last_nanos.store(nanos, Ordering::Release);
    }

    pub fn last_touch(&self) -> Instant {
        self.origin + Duration::from_nanos(self.last_nanos.load(Ordering::Acquire))
    }

    /// Age of the marker as seen at `now`.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_touch())
    }
}

impl Default for LivenessMarker {
    fn default() -> Self {
        Self::new()
    }
}

/// What to do once the acquisition loop is considered hung.
pub trait RestartAction: Send + Sync {
    fn restart(&self, stale_for: Duration);
}

/// Replaces the current process with a fresh copy of itself.
///
/// If the binary cannot be re-executed the process exits with status 70 so an
/// outer supervisor can bring it back.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRestart;

pub const RESTART_FAILURE_EXIT_CODE: i32 = 70;

impl RestartAction for ProcessRestart {
    fn restart(&self, stale_for: Duration) {
        let logger = LogManager::new("fmcwcore::watchdog");
        logger.fatal(&format!(
            "no successful acquisition cycle for {:?}, restarting process",
            stale_for
        ));
        match std::env::current_exe() {
            Ok(binary) => {
                let err = reexec(binary);
                logger.fatal(&format!("re-exec failed: {}", err));
            }
            Err(err) => logger.fatal(&format!("cannot locate current executable: {}", err)),
        }
        std::process::exit(RESTART_FAILURE_EXIT_CODE);
    }
}

#[cfg(unix)]
fn reexec(binary: std::path::PathBuf) -> std::io::Error {
    use std::os::unix::process::CommandExt;

    std::process::Command::new(binary)
        .args(std::env::args_os().skip(1))
        .exec()
}

#[cfg(not(unix))]
fn reexec(binary: std::path::PathBuf) -> std::io::Error {
    match std::process::Command::new(binary)
        .args(std::env::args_os().skip(1))
        .spawn()
    {
        Ok(_) => std::process::exit(0),
        Err(err) => err,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// The restart action fired after the marker went stale for this long.
    Restarted(Duration),
    Stopped,
}

pub struct Watchdog {
    timeout: Duration,
    liveness: Arc<LivenessMarker>,
    action: Arc<dyn RestartAction>,
    logger: LogManager,
}

impl Watchdog {
    pub fn new(
        timeout: Duration,
        liveness: Arc<LivenessMarker>,
        action: Arc<dyn RestartAction>,
    ) -> Self {
        Self {
            timeout,
            liveness,
            action,
            logger: LogManager::new("fmcwcore::watchdog"),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn period(&self) -> Duration {
        (self.timeout / 2).max(Duration::from_millis(1))
    }

    /// Staleness at `now` when it exceeds the timeout.
    pub fn check(&self, now: Instant) -> Option<Duration> {
        let age = self.liveness.age_at(now);
        (age > self.timeout).then_some(age)
    }

    /// Ticks until the marker goes stale or `shutdown` turns true (or its sender drops).
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> WatchdogOutcome {
        let mut ticker = time::interval(self.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.logger.record(&format!(
            "watching acquisition liveness, timeout {:?}",
            self.timeout
        ));

        loop {
            if *shutdown.borrow() {
                return WatchdogOutcome::Stopped;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(stale_for) = self.check(Instant::now()) {
                        self.logger.fatal(&format!(
                            "acquisition stalled for {:?} (timeout {:?})",
                            stale_for, self.timeout
                        ));
                        self.action.restart(stale_for);
                        return WatchdogOutcome::Restarted(stale_for);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return WatchdogOutcome::Stopped;
                    }
                }
            }
        }
    }
}
