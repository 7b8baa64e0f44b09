//! Pomo Clock - a Pomodoro work/rest countdown clock
//!
//! This library provides the countdown state machine, the alarm sound
//! collaborator, and the HTTP control surface around them.

pub mod alarm;
pub mod api;
pub mod config;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use alarm::{Alarm, AlarmConfig, AudioAlarm};
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, ClockFace, Phase, PhaseEndPolicy, TimerSettings};
pub use utils::signals::shutdown_signal;
