//! Timer state structure and management

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::{sync::oneshot, time::Instant};

use super::ClockFace;

/// Interval lengths offered by the control surface, in minutes
pub const INTERVAL_PRESETS_MINUTES: [u64; 8] = [5, 15, 30, 45, 60, 75, 90, 105];

/// Pomodoro phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Rest,
}

impl Phase {
    /// Label shown on the clock face while this phase is selected
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "FOCUS",
            Phase::Rest => "REST",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Phase::Work => Phase::Rest,
            Phase::Rest => Phase::Work,
        }
    }
}

/// What happens once a running phase reaches its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseEndPolicy {
    /// Flip to the next phase and wait for an explicit start.
    #[default]
    AwaitStart,
    /// Flip to the next phase and keep counting down.
    AutoCycle,
}

/// Startup intervals and phase-end behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub work: Duration,
    pub rest: Duration,
    pub policy: PhaseEndPolicy,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work: Duration::from_secs(60 * 60),
            rest: Duration::from_secs(15 * 60),
            policy: PhaseEndPolicy::AwaitStart,
        }
    }
}

/// Cancellation side of a running tick loop
#[derive(Debug)]
pub struct TickerHandle {
    pub generation: u64,
    cancel: oneshot::Sender<()>,
}

impl TickerHandle {
    pub fn new(generation: u64, cancel: oneshot::Sender<()>) -> Self {
        Self { generation, cancel }
    }

    /// Signal the loop to exit before its next tick
    pub fn cancel(self) {
        // The loop may already be gone; nothing to signal then.
        let _ = self.cancel.send(());
    }
}

/// Mutable countdown state, guarded by the single lock in `AppState`
#[derive(Debug)]
pub struct TimerState {
    pub phase: Phase,
    pub work_interval: Duration,
    pub rest_interval: Duration,
    pub deadline: Instant,
    pub ticker: Option<TickerHandle>,
    /// Identity of the live tick loop; ticks from any other generation are ignored
    pub generation: u64,
    /// What the display currently shows
    pub face: ClockFace,
}

impl TimerState {
    /// Create the startup state: work phase, idle, showing the work interval
    pub fn new(settings: &TimerSettings) -> Self {
        Self {
            phase: Phase::Work,
            work_interval: settings.work,
            rest_interval: settings.rest,
            deadline: Instant::now() + settings.work,
            ticker: None,
            generation: 0,
            face: ClockFace::idle(settings.work),
        }
    }

    pub fn interval(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Work => self.work_interval,
            Phase::Rest => self.rest_interval,
        }
    }

    /// Set the interval of the currently selected phase
    pub fn set_current_interval(&mut self, interval: Duration) {
        match self.phase {
            Phase::Work => self.work_interval = interval,
            Phase::Rest => self.rest_interval = interval,
        }
    }

    /// Check if a tick loop is running
    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Remaining time of the active countdown, `None` when idle
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.ticker
            .as_ref()
            .map(|_| self.deadline.saturating_duration_since(now))
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|ticker| ticker.generation == generation)
    }

    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Cancel the running tick loop, returning whether one was running
    pub fn cancel_ticker(&mut self) -> bool {
        self.next_generation();
        match self.ticker.take() {
            Some(ticker) => {
                ticker.cancel();
                true
            }
            None => false,
        }
    }

    /// Select a phase: label, displayed time and deadline all follow its interval
    pub fn enter_phase(&mut self, phase: Phase, now: Instant) {
        let interval = self.interval(phase);
        self.phase = phase;
        self.deadline = now + interval;
        self.face.label = phase.label().to_string();
        self.face.set_time_left(interval);
    }
}
