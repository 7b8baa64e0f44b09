//! Configuration and CLI argument handling

use std::time::Duration;

use anyhow::bail;
use clap::Parser;

use crate::{
    alarm::{AlarmConfig, PLAYBACK_SUPPORTED},
    state::{PhaseEndPolicy, TimerSettings},
};

/// Longest interval accepted on the command line (one day)
pub const MAX_INTERVAL_MINUTES: u64 = 24 * 60;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "pomo-clock")]
#[command(about = "A Pomodoro work/rest countdown clock with an HTTP control surface")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the control server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Work interval selected at startup, in minutes
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_MINUTES))]
    pub work: u64,

    /// Rest interval selected at startup, in minutes
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_MINUTES))]
    pub rest: u64,

    /// Play the alarm sound when a phase ends
    #[arg(long)]
    pub alarm: bool,

    /// Start the next phase automatically when one ends
    #[arg(long)]
    pub auto_cycle: bool,

    /// Do not draw the clock on the terminal
    #[arg(long)]
    pub headless: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            work: Duration::from_secs(self.work * 60),
            rest: Duration::from_secs(self.rest * 60),
            policy: if self.auto_cycle {
                PhaseEndPolicy::AutoCycle
            } else {
                PhaseEndPolicy::AwaitStart
            },
        }
    }

    /// Reject combinations this build cannot honour
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.alarm && !PLAYBACK_SUPPORTED {
            bail!("--alarm needs audio playback support; rebuild with the `playback` feature");
        }
        Ok(())
    }

    pub fn alarm_config(&self) -> AlarmConfig {
        AlarmConfig {
            enabled: self.alarm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_startup_state() {
        let config = Config::try_parse_from(["pomo-clock"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.timer_settings(), TimerSettings::default());
        assert!(!config.alarm_config().enabled);
    }

    #[test]
    fn flags_select_policy_and_alarm() {
        let config = Config::try_parse_from([
            "pomo-clock",
            "--work",
            "25",
            "--rest",
            "5",
            "--alarm",
            "--auto-cycle",
            "-v",
        ])
        .unwrap();
        let settings = config.timer_settings();
        assert_eq!(settings.work, Duration::from_secs(25 * 60));
        assert_eq!(settings.rest, Duration::from_secs(5 * 60));
        assert_eq!(settings.policy, PhaseEndPolicy::AutoCycle);
        assert!(config.alarm_config().enabled);
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn alarm_flag_requires_playback_support() {
        let config = Config::try_parse_from(["pomo-clock", "--alarm"]).unwrap();
        assert_eq!(config.validate().is_ok(), PLAYBACK_SUPPORTED);

        let quiet = Config::try_parse_from(["pomo-clock"]).unwrap();
        assert!(quiet.validate().is_ok());
    }

    #[test]
    fn huge_interval_is_rejected_instead_of_overflowing() {
        assert!(Config::try_parse_from(["pomo-clock", "--work", "18446744073709551615"]).is_err());
        assert!(Config::try_parse_from(["pomo-clock", "--rest", "1441"]).is_err());

        let config = Config::try_parse_from(["pomo-clock", "--work", "1440"]).unwrap();
        assert_eq!(config.timer_settings().work, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn zero_minute_interval_is_rejected() {
        assert!(Config::try_parse_from(["pomo-clock", "--work", "0"]).is_err());
    }
}
