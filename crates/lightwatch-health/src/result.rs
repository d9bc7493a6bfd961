//! Monitor outcomes.

use std::fmt;

use thiserror::Error;

use lightwatch_core::ClientError;

/// Why a restart did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestartError {
    /// stop, get-state or start failed at the client.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The instance never reported "stopped" within the poll budget.
    #[error("timed out waiting for instance to stop after {attempts} polls")]
    TimedOut { attempts: u32 },

    /// Shutdown was requested before the instance was stopped or while
    /// waiting for it to stop.
    #[error("restart cancelled by shutdown request")]
    Cancelled,
}

impl RestartError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RestartError::TimedOut { .. })
    }
}

/// Outcome of a check, a restart, or a check-then-restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorResult {
    /// The alarm query itself failed.
    CheckFailed { error: ClientError },
    /// No disqualifying alarm is active.
    StatusOk,
    /// The instance status-check alarm is firing.
    StatusCheckFailed,
    /// The restart sequence did not complete.
    RestartFailed { error: RestartError },
    /// stop → wait → start completed.
    RestartSuccess,
}

impl MonitorResult {
    /// Stable snake_case label, used in logs and JSON output.
    pub fn label(&self) -> &'static str {
        match self {
            MonitorResult::CheckFailed { .. } => "check_failed",
            MonitorResult::StatusOk => "status_ok",
            MonitorResult::StatusCheckFailed => "status_check_failed",
            MonitorResult::RestartFailed { .. } => "restart_failed",
            MonitorResult::RestartSuccess => "restart_success",
        }
    }

    /// Whether an operation could not be carried out.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            MonitorResult::CheckFailed { .. } | MonitorResult::RestartFailed { .. }
        )
    }

    /// The cause carried by an error variant.
    pub fn error(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorResult::CheckFailed { error } => Some(error),
            MonitorResult::RestartFailed { error } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for MonitorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorResult::CheckFailed { error } => write!(f, "health check failed: {error}"),
            MonitorResult::StatusOk => f.write_str("instance status ok"),
            MonitorResult::StatusCheckFailed => f.write_str("instance status check failed"),
            MonitorResult::RestartFailed { error } => write!(f, "restart failed: {error}"),
            MonitorResult::RestartSuccess => f.write_str("instance restarted"),
        }
    }
}
