//! Resource-control client backed by the `aws` CLI.
//!
//! Each call runs `aws lightsail <operation> ... --output json` and parses
//! stdout. Credentials, region and profile resolution are left to the
//! AWS CLI itself.

use std::process::Output;

use tokio::process::Command;
use tracing::debug;

use lightwatch_core::config::AwsConfig;
use lightwatch_core::wire::{parse_alarms, parse_instance_state};
use lightwatch_core::{AlarmRecord, ClientError, ClientResult, InstanceState};
use lightwatch_health::ResourceControl;

/// Default executable name, looked up on `$PATH`.
pub const DEFAULT_AWS_BINARY: &str = "aws";

#[derive(Debug, Clone)]
pub struct AwsCliClient {
    binary: String,
    region: Option<String>,
    profile: Option<String>,
}

impl Default for AwsCliClient {
    fn default() -> Self {
        Self::new(DEFAULT_AWS_BINARY)
    }
}

impl AwsCliClient {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            region: None,
            profile: None,
        }
    }

    pub fn from_config(config: &AwsConfig) -> Self {
        let mut client = Self::new(config.binary.as_deref().unwrap_or(DEFAULT_AWS_BINARY));
        client.region = config.region.clone();
        client.profile = config.profile.clone();
        client
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Arguments for `aws lightsail <operation> <name_flag> <instance>`.
    pub fn args(&self, operation: &str, name_flag: &str, instance: &str) -> Vec<String> {
        let mut args = vec![
            "lightsail".to_string(),
            operation.to_string(),
            name_flag.to_string(),
            instance.to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }

    async fn invoke(&self, operation: &str, name_flag: &str, instance: &str) -> ClientResult<String> {
        debug!(%instance, operation, binary = %self.binary, "invoking aws cli");

        let output = Command::new(&self.binary)
            .args(self.args(operation, name_flag, instance))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ClientError::transport(format!("failed to execute '{}': {e}", self.binary))
            })?;

        check_output(operation, output)
    }
}

fn check_output(operation: &str, output: Output) -> ClientResult<String> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(
            operation,
            exit_code = output.status.code().unwrap_or(-1),
            stderr = %stderr.trim(),
            "aws cli failed"
        );
        return Err(ClientError::from_cli_stderr(&stderr));
    }

    String::from_utf8(output.stdout)
        .map_err(|_| ClientError::malformed(format!("{operation}: output is not valid UTF-8")))
}

impl ResourceControl for AwsCliClient {
    async fn get_alarms(&self, resource: &str) -> ClientResult<Vec<AlarmRecord>> {
        let body = self
            .invoke("get-alarms", "--monitored-resource-name", resource)
            .await?;
        parse_alarms(&body, resource)
    }

    async fn get_instance_state(&self, resource: &str) -> ClientResult<InstanceState> {
        let body = self
            .invoke("get-instance", "--instance-name", resource)
            .await?;
        parse_instance_state(&body, resource)
    }

    async fn stop_instance(&self, resource: &str) -> ClientResult<()> {
        self.invoke("stop-instance", "--instance-name", resource)
            .await
            .map(|_| ())
    }

    async fn start_instance(&self, resource: &str) -> ClientResult<()> {
        self.invoke("start-instance", "--instance-name", resource)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_lightsail_args() {
        let client = AwsCliClient::default();
        assert_eq!(
            client.args("get-alarms", "--monitored-resource-name", "web-1"),
            vec![
                "lightsail",
                "get-alarms",
                "--monitored-resource-name",
                "web-1",
                "--output",
                "json",
            ]
        );
    }

    #[test]
    fn region_and_profile_are_passed_through() {
        let client = AwsCliClient::default()
            .with_region("eu-west-2")
            .with_profile("ops");
        let args = client.args("stop-instance", "--instance-name", "web-1");
        assert_eq!(
            &args[6..],
            &["--region", "eu-west-2", "--profile", "ops"]
        );
    }

    #[test]
    fn from_config_uses_defaults() {
        let client = AwsCliClient::from_config(&AwsConfig::default());
        assert_eq!(client.binary, "aws");
        assert!(client.region.is_none());

        let client = AwsCliClient::from_config(&AwsConfig {
            region: Some("us-west-2".to_string()),
            profile: None,
            binary: Some("/opt/aws/bin/aws".to_string()),
        });
        assert_eq!(client.binary, "/opt/aws/bin/aws");
        assert_eq!(client.region.as_deref(), Some("us-west-2"));
    }

    #[tokio::test]
    async fn missing_binary_is_transport_error() {
        let client = AwsCliClient::new("/nonexistent/lightwatch-test/aws");
        let err = client.get_alarms("web-1").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }), "{err:?}");
    }

    /// Runs a stand-in `aws` script so the full invoke → parse path is
    /// exercised. Kept in one test so only one script is written at a time.
    #[cfg(unix)]
    #[tokio::test]
    async fn parses_output_of_stand_in_cli() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("aws");
        std::fs::write(
            &script,
            r#"#!/bin/sh
case "$2" in
  get-alarms)
    echo '{"alarms":[{"name":"sc","metricName":"StatusCheckFailed_Instance","state":"ALARM","monitoredResourceInfo":{"name":"'"$4"'"}}]}'
    ;;
  get-instance)
    echo '{"instance":{"name":"'"$4"'","state":{"code":80,"name":"stopped"}}}'
    ;;
  stop-instance)
    echo '{"operations":[]}'
    ;;
  *)
    echo "An error occurred (InvalidInputException) when calling the StartInstance operation: nope" >&2
    exit 254
    ;;
esac
"#,
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let client = AwsCliClient::new(script.to_string_lossy());

        let alarms = client.get_alarms("web-1").await.unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].resource, "web-1");
        assert!(alarms[0].state.is_alarming());

        let state = client.get_instance_state("web-1").await.unwrap();
        assert!(state.is_stopped());

        client.stop_instance("web-1").await.unwrap();

        let err = client.start_instance("web-1").await.unwrap_err();
        assert_eq!(err, ClientError::service("InvalidInputException", "nope"));
    }
}
