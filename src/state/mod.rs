//! State management module
//!
//! This module contains the countdown state machine and what it shows.

pub mod app_state;
pub mod clock_face;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, TickOutcome, TimerSnapshot};
pub use clock_face::{ClockFace, Weight};
pub use timer_state::{
    Phase, PhaseEndPolicy, TickerHandle, TimerSettings, TimerState, INTERVAL_PRESETS_MINUTES,
};
