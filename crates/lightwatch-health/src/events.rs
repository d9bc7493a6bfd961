//! Structured progress events.
//!
//! The state machine never logs directly. It hands each step to an
//! [`EventSink`]; [`TracingSink`] is the production sink.

use tracing::{debug, info, warn};

use crate::restart::RestartPhase;
use crate::result::MonitorResult;

/// Top-level operation an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Check,
    Restart,
    RestartIfFailing,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Check => "check",
            Operation::Restart => "restart",
            Operation::RestartIfFailing => "restart_if_failing",
        }
    }
}

/// A step taken by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Alarm query returned `count` records.
    AlarmsFetched { instance: String, count: usize },
    /// The status-check alarm is firing.
    DisqualifyingAlarm {
        instance: String,
        alarm: String,
        metric: String,
    },
    /// The restart state machine entered `phase`.
    Transition { instance: String, phase: RestartPhase },
    /// One state query while waiting for the instance to stop.
    Polled {
        instance: String,
        attempt: u32,
        max_polls: u32,
        status: String,
    },
    /// An operation produced its result. `error` holds the cause when
    /// the outcome is a failure.
    Finished {
        instance: String,
        operation: Operation,
        outcome: &'static str,
        error: Option<String>,
    },
}

impl MonitorEvent {
    pub fn finished(instance: &str, operation: Operation, result: &MonitorResult) -> Self {
        MonitorEvent::Finished {
            instance: instance.to_string(),
            operation,
            outcome: result.label(),
            error: result.error().map(|e| e.to_string()),
        }
    }
}

/// Receives monitor events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &MonitorEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &MonitorEvent) {
        match event {
            MonitorEvent::AlarmsFetched { instance, count } => {
                debug!(%instance, count, "fetched instance alarms");
            }
            MonitorEvent::DisqualifyingAlarm {
                instance,
                alarm,
                metric,
            } => {
                warn!(%instance, %alarm, %metric, "status check alarm firing");
            }
            MonitorEvent::Transition { instance, phase } => {
                info!(%instance, phase = phase.as_str(), "restart phase");
            }
            MonitorEvent::Polled {
                instance,
                attempt,
                max_polls,
                status,
            } => {
                debug!(%instance, attempt, max_polls, %status, "polled instance state");
            }
            MonitorEvent::Finished {
                instance,
                operation,
                outcome,
                error: Some(error),
            } => {
                warn!(
                    %instance,
                    operation = operation.as_str(),
                    %outcome,
                    %error,
                    "monitor operation failed"
                );
            }
            MonitorEvent::Finished {
                instance,
                operation,
                outcome,
                error: None,
            } => {
                info!(%instance, operation = operation.as_str(), %outcome, "monitor finished");
            }
        }
    }
}
