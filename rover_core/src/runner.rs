//! Paced control loop around `TickOrchestrator::tick`.
//!
//! The runner owns time: it derives `now_ms` from the injected [`Clock`],
//! sleeps out the remainder of each period and stops on a shutdown flag or
//! tick budget. Actuator faults inside a tick are counted, not fatal. Motors
//! are stopped and disabled on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rover_traits::clock::Clock;
use rover_traits::{Actuator, Feedback, InputHub};

use crate::config::LoopCfg;
use crate::error::Result;
use crate::orchestrator::TickOrchestrator;

/// Parameters for a single `run` invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunParams {
    pub loop_cfg: LoopCfg,
    /// Stop after this many ticks; `None` runs until shutdown.
    pub max_ticks: Option<u64>,
}

/// Loop latency statistics, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopStats {
    pub ticks: u64,
    pub period_us: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub total_us: u64,
    pub missed_deadlines: u64,
    /// Drive commands the actuator rejected; the loop keeps running through them.
    pub actuator_faults: u64,
}

impl LoopStats {
    fn new(period_us: u64) -> Self {
        Self {
            period_us,
            min_us: u64::MAX,
            ..Self::default()
        }
    }

    #[inline]
    fn record(&mut self, latency_us: u64) {
        self.ticks = self.ticks.saturating_add(1);
        self.min_us = self.min_us.min(latency_us);
        self.max_us = self.max_us.max(latency_us);
        self.total_us = self.total_us.saturating_add(latency_us);
        if latency_us > self.period_us {
            self.missed_deadlines = self.missed_deadlines.saturating_add(1);
        }
    }

    pub fn avg_us(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.total_us as f64 / self.ticks as f64
        }
    }

    /// `min_us` reads as 0 until the first tick is recorded.
    pub fn min_or_zero(&self) -> u64 {
        if self.ticks == 0 { 0 } else { self.min_us }
    }
}

/// Run the control loop until `shutdown` is raised or the tick budget is spent.
pub fn run<H, A, F>(
    rover: &mut TickOrchestrator<H, A, F>,
    clock: &dyn Clock,
    params: RunParams,
    shutdown: &AtomicBool,
) -> Result<LoopStats>
where
    H: InputHub,
    A: Actuator,
    F: Feedback,
{
    let period_us = crate::util::period_us(params.loop_cfg.tick_hz);
    let period = Duration::from_micros(period_us);
    let mut stats = LoopStats::new(period_us);

    let epoch = clock.now();
    rover.begin(0)?;
    tracing::info!(
        tick_hz = params.loop_cfg.tick_hz,
        max_ticks = ?params.max_ticks,
        "control loop start"
    );

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if params.max_ticks.is_some_and(|max| stats.ticks >= max) {
            break;
        }

        let t_start = clock.now();
        let now_ms = clock.ms_since(epoch);
        let report = match rover.tick(now_ms) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "control tick failed");
                if let Err(stop_err) = rover.shutdown() {
                    tracing::warn!(error = %stop_err, "shutdown after tick failure failed");
                }
                return Err(e);
            }
        };
        stats.actuator_faults = stats.actuator_faults.saturating_add(report.actuator_faults);
        let elapsed = clock.now().saturating_duration_since(t_start);
        stats.record(elapsed.as_micros() as u64);

        if let Some(rest) = period.checked_sub(elapsed) {
            clock.sleep(rest);
        }
    }

    rover.shutdown()?;
    tracing::info!(
        ticks = stats.ticks,
        missed = stats.missed_deadlines,
        actuator_faults = stats.actuator_faults,
        "control loop stopped"
    );
    Ok(stats)
}
