//! Result presentation and exit codes.

use std::process::ExitCode;

use clap::ValueEnum;
use serde::Serialize;

use lightwatch_health::MonitorResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// What a single run reports to stdout.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub instance: &'a str,
    pub command: &'static str,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub code: u8,
}

impl<'a> Report<'a> {
    pub fn new(instance: &'a str, command: &'static str, result: &MonitorResult) -> Self {
        Self {
            instance,
            command,
            outcome: result.label(),
            error: result.error().map(|e| e.to_string()),
            code: exit_code(result),
        }
    }

    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        Ok(match format {
            OutputFormat::Json => serde_json::to_string(self)?,
            OutputFormat::Text => match &self.error {
                Some(error) => format!("{}: {} ({error})", self.instance, self.outcome),
                None => format!("{}: {}", self.instance, self.outcome),
            },
        })
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code)
    }
}

/// 0 when the instance ends up healthy, 1 when a check found it failing,
/// 2 when an operation could not be carried out.
pub fn exit_code(result: &MonitorResult) -> u8 {
    match result {
        MonitorResult::StatusOk | MonitorResult::RestartSuccess => 0,
        MonitorResult::StatusCheckFailed => 1,
        MonitorResult::CheckFailed { .. } | MonitorResult::RestartFailed { .. } => 2,
    }
}
