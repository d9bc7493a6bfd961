//! Lightsail monitor: check the instance, restart it if it is failing.

use std::sync::Arc;

use tokio::sync::watch;

use crate::checker::HealthChecker;
use crate::client::ResourceControl;
use crate::events::{EventSink, MonitorEvent, Operation, TracingSink};
use crate::restart::{RestartCoordinator, RetryBudget};
use crate::result::MonitorResult;
use crate::sleep::Sleeper;

/// Composes a [`HealthChecker`] and a [`RestartCoordinator`] over one
/// shared client.
pub struct LightsailMonitor<C> {
    checker: HealthChecker<C>,
    restarter: RestartCoordinator<C>,
    events: Arc<dyn EventSink>,
}

impl<C: ResourceControl> LightsailMonitor<C> {
    /// Create a monitor with the default poll budget (100 polls, 3s apart).
    pub fn new(client: C) -> Self {
        Self::from_shared(Arc::new(client))
    }

    pub fn from_shared(client: Arc<C>) -> Self {
        Self {
            checker: HealthChecker::new(client.clone()),
            restarter: RestartCoordinator::new(client),
            events: Arc::new(TracingSink),
        }
    }

    pub fn with_budget(mut self, budget: RetryBudget) -> Self {
        self.restarter = self.restarter.with_budget(budget);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.restarter = self.restarter.with_sleeper(sleeper);
        self
    }

    /// Route events from the checker, the coordinator and the monitor
    /// itself to `events`.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.checker = self.checker.with_events(events.clone());
        self.restarter = self.restarter.with_events(events.clone());
        self.events = events;
        self
    }

    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.restarter = self.restarter.with_shutdown(shutdown);
        self
    }

    pub fn budget(&self) -> RetryBudget {
        self.restarter.budget()
    }

    pub async fn check_instance(&self, instance: &str) -> MonitorResult {
        self.checker.check_instance(instance).await
    }

    pub async fn restart_instance(&self, instance: &str) -> MonitorResult {
        self.restarter.restart_instance(instance).await
    }

    /// Check the instance and restart it only when its status check is
    /// failing. A failed check is returned as-is without restarting.
    pub async fn restart_if_failing(&self, instance: &str) -> MonitorResult {
        let result = match self.checker.check_instance(instance).await {
            MonitorResult::StatusCheckFailed => self.restarter.restart_instance(instance).await,
            MonitorResult::StatusOk => MonitorResult::StatusOk,
            failed @ MonitorResult::CheckFailed { .. } => failed,
            // The checker never produces restart outcomes.
            other @ (MonitorResult::RestartFailed { .. } | MonitorResult::RestartSuccess) => other,
        };

        self.events.emit(&MonitorEvent::finished(
            instance,
            Operation::RestartIfFailing,
            &result,
        ));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::STATUS_CHECK_FAILED_METRIC;
    use crate::fake::{Call, FakeLightsail, RecordingSink, RecordingSleeper};
    use crate::result::RestartError;
    use lightwatch_core::{AlarmRecord, AlarmState, ClientError};
    use std::time::Duration;

    fn failing_alarm() -> AlarmRecord {
        AlarmRecord::new(STATUS_CHECK_FAILED_METRIC, AlarmState::Alarm, "web-1")
    }

    fn monitor(fake: &Arc<FakeLightsail>) -> LightsailMonitor<FakeLightsail> {
        LightsailMonitor::from_shared(fake.clone())
            .with_sleeper(Arc::new(RecordingSleeper::default()))
    }

    #[test]
    fn default_budget_applies() {
        let monitor = LightsailMonitor::new(FakeLightsail::new());
        assert_eq!(monitor.budget(), RetryBudget::default());

        let monitor = monitor.with_budget(RetryBudget::new(7, Duration::from_millis(10)));
        assert_eq!(monitor.budget().max_polls, 7);
    }

    #[tokio::test]
    async fn healthy_instance_is_left_alone() {
        let fake = Arc::new(FakeLightsail::new());
        let result = monitor(&fake).restart_if_failing("web-1").await;

        assert_eq!(result, MonitorResult::StatusOk);
        assert_eq!(fake.calls(), vec![Call::GetAlarms("web-1".to_string())]);
    }

    #[tokio::test]
    async fn check_failure_propagates_without_restart() {
        let error = ClientError::transport("A failure occurred getting the instance alarms");
        let fake = Arc::new(FakeLightsail::new().failing_alarms(error.clone()));

        let result = monitor(&fake).restart_if_failing("web-1").await;

        assert_eq!(result, MonitorResult::CheckFailed { error });
        assert_eq!(fake.stops(), 0);
        assert_eq!(fake.state_queries(), 0);
        assert_eq!(fake.starts(), 0);
    }

    #[tokio::test]
    async fn failing_instance_is_restarted() {
        let fake = Arc::new(
            FakeLightsail::new()
                .with_alarms(vec![failing_alarm()])
                .with_states(&["stopped"]),
        );

        let result = monitor(&fake).restart_if_failing("web-1").await;

        assert_eq!(result, MonitorResult::RestartSuccess);
        assert_eq!(
            fake.calls(),
            vec![
                Call::GetAlarms("web-1".to_string()),
                Call::StopInstance("web-1".to_string()),
                Call::GetInstanceState("web-1".to_string()),
                Call::StartInstance("web-1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn restart_failure_returned_verbatim() {
        let error = ClientError::transport("A failure occurred starting the instance");
        let fake = Arc::new(
            FakeLightsail::new()
                .with_alarms(vec![failing_alarm()])
                .with_states(&["stopped"])
                .failing_start(error.clone()),
        );

        let result = monitor(&fake).restart_if_failing("web-1").await;

        assert_eq!(
            result,
            MonitorResult::RestartFailed {
                error: RestartError::Client(error),
            }
        );
    }

    #[tokio::test]
    async fn shutdown_before_restart_leaves_instance_running() {
        let fake = Arc::new(FakeLightsail::new().with_alarms(vec![failing_alarm()]));
        let (tx, rx) = watch::channel(false);
        let monitor = monitor(&fake).with_shutdown(rx);

        tx.send(true).unwrap();
        let result = monitor.restart_if_failing("web-1").await;

        assert_eq!(
            result,
            MonitorResult::RestartFailed {
                error: RestartError::Cancelled,
            }
        );
        assert_eq!(fake.calls(), vec![Call::GetAlarms("web-1".to_string())]);
    }

    #[tokio::test]
    async fn finished_events_for_each_layer() {
        let fake = Arc::new(
            FakeLightsail::new()
                .with_alarms(vec![failing_alarm()])
                .with_states(&["stopped"]),
        );
        let sink = Arc::new(RecordingSink::default());
        let monitor = monitor(&fake).with_events(sink.clone());

        monitor.restart_if_failing("web-1").await;

        let finished: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                MonitorEvent::Finished {
                    operation, outcome, ..
                } => Some((operation, outcome)),
                _ => None,
            })
            .collect();
        assert_eq!(
            finished,
            vec![
                (Operation::Check, "status_check_failed"),
                (Operation::Restart, "restart_success"),
                (Operation::RestartIfFailing, "restart_success"),
            ]
        );
    }
}
