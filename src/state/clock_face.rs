//! What the display shows

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Added to the remaining time before it is split into minutes and seconds,
/// so a countdown at 0.05s still reads "00" and not the previous second.
pub const ROUNDING_BIAS: Duration = Duration::from_millis(200);

/// Visual weight of the `:` between minutes and seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weight {
    Bright,
    Dim,
}

impl Weight {
    pub fn flip(self) -> Self {
        match self {
            Weight::Bright => Weight::Dim,
            Weight::Dim => Weight::Bright,
        }
    }
}

/// Snapshot of the display surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockFace {
    /// "FOCUS", "REST", or empty when idle
    pub label: String,
    pub minutes: String,
    pub seconds: String,
    pub delimiter: Weight,
}

impl ClockFace {
    /// Face with no label showing the given time
    pub fn idle(time_left: Duration) -> Self {
        let (minutes, seconds) = format_time_left(time_left);
        Self {
            label: String::new(),
            minutes,
            seconds,
            delimiter: Weight::Bright,
        }
    }

    pub fn set_time_left(&mut self, time_left: Duration) {
        let (minutes, seconds) = format_time_left(time_left);
        self.minutes = minutes;
        self.seconds = seconds;
    }

    /// Single-line rendering for a terminal
    pub fn render(&self) -> String {
        let delimiter = match self.delimiter {
            Weight::Bright => ':',
            Weight::Dim => ' ',
        };
        format!("{:>5}  {}{}{}", self.label, self.minutes, delimiter, self.seconds)
    }
}

/// Split a remaining duration into the minutes and seconds texts
pub fn format_time_left(time_left: Duration) -> (String, String) {
    let biased = (time_left + ROUNDING_BIAS).as_secs();
    let minutes = biased / 60;
    let seconds = biased % 60;
    (format!("{:2}", minutes), format!("{:02}", seconds))
}
