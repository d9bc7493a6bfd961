//! Shared types used across lightwatch crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a monitored Lightsail instance.
pub type ResourceId = String;

/// Status label Lightsail reports once an instance has fully stopped.
pub const STOPPED: &str = "stopped";

/// State of a single health alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    /// The alarm threshold has been breached.
    Alarm,
    /// The metric is within its threshold.
    Ok,
    /// Not enough data to evaluate, or a state we don't recognise.
    InsufficientData,
}

impl AlarmState {
    /// Map a Lightsail state string. Unknown values are non-alarming.
    pub fn from_wire(state: &str) -> Self {
        match state {
            "ALARM" => AlarmState::Alarm,
            "OK" => AlarmState::Ok,
            _ => AlarmState::InsufficientData,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmState::Alarm => "ALARM",
            AlarmState::Ok => "OK",
            AlarmState::InsufficientData => "INSUFFICIENT_DATA",
        }
    }

    pub fn is_alarming(&self) -> bool {
        matches!(self, AlarmState::Alarm)
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A health alarm attached to a monitored resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRecord {
    /// Alarm name as configured in Lightsail.
    pub name: String,
    /// Metric the alarm watches, e.g. `StatusCheckFailed_Instance`.
    pub metric_name: String,
    pub state: AlarmState,
    /// Resource the alarm belongs to.
    pub resource: ResourceId,
}

impl AlarmRecord {
    pub fn new(metric_name: &str, state: AlarmState, resource: &str) -> Self {
        Self {
            name: format!("{resource}-{metric_name}"),
            metric_name: metric_name.to_string(),
            state,
            resource: resource.to_string(),
        }
    }
}

/// Point-in-time status of an instance ("running", "stopping", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    pub resource: ResourceId,
    pub status: String,
}

impl InstanceState {
    pub fn new(resource: &str, status: &str) -> Self {
        Self {
            resource: resource.to_string(),
            status: status.to_string(),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.status == STOPPED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_state_from_wire() {
        assert_eq!(AlarmState::from_wire("ALARM"), AlarmState::Alarm);
        assert_eq!(AlarmState::from_wire("OK"), AlarmState::Ok);
        assert_eq!(
            AlarmState::from_wire("INSUFFICIENT_DATA"),
            AlarmState::InsufficientData
        );
        // Anything else is treated as non-alarming.
        assert_eq!(AlarmState::from_wire("alarm"), AlarmState::InsufficientData);
        assert!(!AlarmState::from_wire("").is_alarming());
    }

    #[test]
    fn instance_state_stopped() {
        assert!(InstanceState::new("web-1", "stopped").is_stopped());
        assert!(!InstanceState::new("web-1", "stopping").is_stopped());
        assert!(!InstanceState::new("web-1", "Stopped").is_stopped());
    }
}
