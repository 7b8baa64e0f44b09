//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{ClockFace, TimerSnapshot};

/// API response structure for timer actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub clock: ClockFace,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, clock: ClockFace) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            clock,
        }
    }

    /// Response for an action that leaves a countdown running
    pub fn running(message: String, clock: ClockFace) -> Self {
        Self::new("running".to_string(), message, clock)
    }

    /// Response for an action that leaves the timer idle
    pub fn idle(message: String, clock: ClockFace) -> Self {
        Self::new("idle".to_string(), message, clock)
    }

    /// Pick `running` or `idle` from the timer's current state
    pub fn from_snapshot(message: String, snapshot: TimerSnapshot) -> Self {
        if snapshot.running {
            Self::running(message, snapshot.clock)
        } else {
            Self::idle(message, snapshot.clock)
        }
    }
}

/// Error body for rejected requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        Self {
            error,
            timestamp: Utc::now(),
        }
    }
}

/// Status response with timer information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
