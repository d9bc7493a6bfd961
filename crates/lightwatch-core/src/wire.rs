//! Lightsail API response shapes.
//!
//! Only the fields lightwatch reads are modelled; everything else in the
//! payload is ignored.

use serde::Deserialize;

use crate::error::{ClientError, ClientResult};
use crate::types::{AlarmRecord, AlarmState, InstanceState};

/// Body of a `GetAlarms` response.
#[derive(Debug, Deserialize)]
pub struct GetAlarmsResponse {
    #[serde(default)]
    pub alarms: Vec<WireAlarm>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAlarm {
    #[serde(default)]
    pub name: String,
    pub metric_name: String,
    pub state: String,
    #[serde(default)]
    pub monitored_resource_info: Option<WireResourceInfo>,
}

#[derive(Debug, Deserialize)]
pub struct WireResourceInfo {
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of a `GetInstance` response.
#[derive(Debug, Deserialize)]
pub struct GetInstanceResponse {
    pub instance: WireInstance,
}

#[derive(Debug, Deserialize)]
pub struct WireInstance {
    #[serde(default)]
    pub name: Option<String>,
    pub state: WireInstanceState,
}

#[derive(Debug, Deserialize)]
pub struct WireInstanceState {
    #[serde(default)]
    pub code: Option<i64>,
    pub name: String,
}

impl WireAlarm {
    /// Convert to a domain record. Alarms without resource info are
    /// attributed to the resource that was queried.
    pub fn into_record(self, queried: &str) -> AlarmRecord {
        let resource = self
            .monitored_resource_info
            .and_then(|info| info.name)
            .unwrap_or_else(|| queried.to_string());
        AlarmRecord {
            name: self.name,
            metric_name: self.metric_name,
            state: AlarmState::from_wire(&self.state),
            resource,
        }
    }
}

/// Parse a `GetAlarms` JSON body into alarm records, preserving order.
pub fn parse_alarms(json: &str, resource: &str) -> ClientResult<Vec<AlarmRecord>> {
    let response: GetAlarmsResponse = serde_json::from_str(json)
        .map_err(|e| ClientError::malformed(format!("GetAlarms: {e}")))?;
    Ok(response
        .alarms
        .into_iter()
        .map(|alarm| alarm.into_record(resource))
        .collect())
}

/// Parse a `GetInstance` JSON body into the instance's current state.
pub fn parse_instance_state(json: &str, resource: &str) -> ClientResult<InstanceState> {
    let response: GetInstanceResponse = serde_json::from_str(json)
        .map_err(|e| ClientError::malformed(format!("GetInstance: {e}")))?;
    let instance = response.instance;
    Ok(InstanceState {
        resource: instance.name.unwrap_or_else(|| resource.to_string()),
        status: instance.state.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_without_resource_info_uses_queried_name() {
        let json = r#"{"alarms":[{"name":"a","metricName":"CPUUtilization","state":"OK"}]}"#;
        let alarms = parse_alarms(json, "web-1").unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].resource, "web-1");
        assert_eq!(alarms[0].state, AlarmState::Ok);
    }

    #[test]
    fn missing_alarms_key_is_empty() {
        let alarms = parse_alarms("{}", "web-1").unwrap();
        assert!(alarms.is_empty());
    }

    #[test]
    fn garbage_is_malformed() {
        let err = parse_alarms("not json", "web-1").unwrap_err();
        assert!(matches!(err, ClientError::Malformed { .. }));

        let err = parse_instance_state(r#"{"instance":{}}"#, "web-1").unwrap_err();
        assert!(matches!(err, ClientError::Malformed { .. }));
    }

    #[test]
    fn instance_state_name() {
        let json = r#"{"instance":{"name":"web-1","state":{"code":64,"name":"stopping"}}}"#;
        let state = parse_instance_state(json, "web-1").unwrap();
        assert_eq!(state, InstanceState::new("web-1", "stopping"));
    }
}
