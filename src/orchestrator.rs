//! Refresh loop: once a second, and right after every settings change,
//! compute progress for the current configuration and hand a frame to the
//! display.
//!
//! The configuration lives in a `watch` channel. Updates replace the whole
//! snapshot, so a tick never sees half of an update.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::clock::Clock;
use crate::display::{DisplaySink, Frame};
use crate::settings::Config;
use crate::stats;

pub const TICK: Duration = Duration::from_secs(1);

/// Radius of the circular progress indicator.
pub const RING_RADIUS: f64 = 95.0;
pub const CIRCUMFERENCE: f64 = 2.0 * std::f64::consts::PI * RING_RADIUS;

/// Dash offset that leaves the remaining share of the ring visible.
pub fn stroke_offset(progress_ratio: f64) -> f64 {
    CIRCUMFERENCE * (1.0 - progress_ratio)
}

/// Progress for `config` at `now`, ready for display. The birth date is
/// placed in `now`'s time zone.
pub fn compose_frame<Tz: TimeZone>(config: &Config, now: &DateTime<Tz>) -> Option<Frame> {
    let birth = config.birth_in(&now.timezone())?;
    let progress = stats::progress(&birth, config.target_age(), now)?;
    trace!(
        now = %now.naive_local(),
        total_ms = progress.total_ms,
        remaining_ms = progress.remaining_ms,
        ratio = progress.progress_ratio,
        "Progress computed"
    );
    Some(Frame::from_progress(
        &progress,
        stroke_offset(progress.progress_ratio),
    ))
}

/// The single entry point for replacing the configuration.
pub struct ConfigHandle {
    tx: watch::Sender<Option<Config>>,
}

impl ConfigHandle {
    pub fn replace(&self, config: Config) {
        self.tx.send_replace(Some(config));
    }

    pub fn current(&self) -> Option<Config> {
        *self.tx.borrow()
    }
}

pub struct Orchestrator<S, C> {
    sink: S,
    clock: C,
    config: watch::Receiver<Option<Config>>,
    prompted: bool,
}

impl<S: DisplaySink, C: Clock> Orchestrator<S, C> {
    pub fn new(sink: S, clock: C, initial: Option<Config>) -> (Self, ConfigHandle) {
        let (tx, rx) = watch::channel(initial);
        let orchestrator = Self {
            sink,
            clock,
            config: rx,
            prompted: false,
        };
        (orchestrator, ConfigHandle { tx })
    }

    /// One refresh. Never fails; display errors are logged and the next tick
    /// starts fresh.
    pub fn tick(&mut self) {
        let snapshot = *self.config.borrow_and_update();

        let Some(config) = snapshot else {
            // first run: ask once, then wait for settings
            if !self.prompted {
                self.prompted = true;
                if let Err(e) = self.sink.request_configuration() {
                    warn!("Failed to prompt for settings: {e}");
                }
            }
            return;
        };
        self.prompted = false;

        let Some(frame) = compose_frame(&config, &self.clock.now()) else {
            warn!(birth = %config.birth(), "Target date out of range, skipping tick");
            return;
        };

        if let Err(e) = self.sink.render(&frame) {
            warn!("Display failed: {e}");
        }
    }

    /// Ticks every second until `shutdown` resolves.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        let mut interval = tokio::time::interval(TICK);
        // a stalled terminal must not cause a burst of catch-up ticks
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut watching = true;
        info!("Refresh loop started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Refresh loop stopped");
                    break;
                }
                _ = interval.tick() => self.tick(),
                changed = self.config.changed(), if watching => match changed {
                    Ok(()) => {
                        debug!("Configuration replaced");
                        self.tick();
                    }
                    // every handle dropped: keep ticking with the last snapshot
                    Err(_) => watching = false,
                },
            }
        }
    }
}
