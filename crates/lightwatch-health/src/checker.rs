//! Health check classification.
//!
//! An instance is failing when its `StatusCheckFailed_Instance` alarm is
//! in the `ALARM` state. Alarms on other metrics never trigger a restart.

use std::sync::Arc;

use lightwatch_core::{AlarmRecord, AlarmState};

use crate::client::ResourceControl;
use crate::events::{EventSink, MonitorEvent, Operation, TracingSink};
use crate::result::MonitorResult;

/// Metric whose alarm marks an instance as needing a restart.
pub const STATUS_CHECK_FAILED_METRIC: &str = "StatusCheckFailed_Instance";

/// First alarm that disqualifies the instance, if any.
pub fn find_disqualifying(alarms: &[AlarmRecord]) -> Option<&AlarmRecord> {
    alarms
        .iter()
        .find(|a| a.state == AlarmState::Alarm && a.metric_name == STATUS_CHECK_FAILED_METRIC)
}

/// Queries an instance's alarms and classifies its health.
pub struct HealthChecker<C> {
    client: Arc<C>,
    events: Arc<dyn EventSink>,
}

impl<C: ResourceControl> HealthChecker<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            events: Arc::new(TracingSink),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Classify the instance as `StatusOk`, `StatusCheckFailed`, or
    /// `CheckFailed` when the alarms can't be read.
    ///
    /// Issues exactly one read and never retries.
    pub async fn check_instance(&self, instance: &str) -> MonitorResult {
        let result = self.classify(instance).await;
        self.events
            .emit(&MonitorEvent::finished(instance, Operation::Check, &result));
        result
    }

    async fn classify(&self, instance: &str) -> MonitorResult {
        let alarms = match self.client.get_alarms(instance).await {
            Ok(alarms) => alarms,
            Err(error) => return MonitorResult::CheckFailed { error },
        };

        self.events.emit(&MonitorEvent::AlarmsFetched {
            instance: instance.to_string(),
            count: alarms.len(),
        });

        match find_disqualifying(&alarms) {
            Some(alarm) => {
                self.events.emit(&MonitorEvent::DisqualifyingAlarm {
                    instance: instance.to_string(),
                    alarm: alarm.name.clone(),
                    metric: alarm.metric_name.clone(),
                });
                MonitorResult::StatusCheckFailed
            }
            None => MonitorResult::StatusOk,
        }
    }
}
