//! In-memory doubles for driving the monitor without a cloud account.
//!
//! [`FakeLightsail`] scripts client responses and records every call;
//! [`RecordingSleeper`] returns immediately and remembers the requested
//! delays; [`RecordingSink`] collects emitted events.

use std::sync::Mutex;
use std::time::Duration;

use lightwatch_core::{AlarmRecord, ClientError, ClientResult, InstanceState};

use crate::client::ResourceControl;
use crate::events::{EventSink, MonitorEvent};
use crate::sleep::{BoxFuture, Sleeper};

/// A client call observed by [`FakeLightsail`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetAlarms(String),
    GetInstanceState(String),
    StopInstance(String),
    StartInstance(String),
}

/// Scripted resource-control client.
///
/// State queries walk through the scripted statuses and then keep
/// returning the last one. With no script every query reports "running".
#[derive(Debug)]
pub struct FakeLightsail {
    alarms: ClientResult<Vec<AlarmRecord>>,
    states: Vec<String>,
    state_error: Option<ClientError>,
    stop_error: Option<ClientError>,
    start_error: Option<ClientError>,
    calls: Mutex<Vec<Call>>,
}

impl Default for FakeLightsail {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLightsail {
    /// A healthy instance with no alarms that never reaches "stopped".
    pub fn new() -> Self {
        Self {
            alarms: Ok(Vec::new()),
            states: Vec::new(),
            state_error: None,
            stop_error: None,
            start_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_alarms(mut self, alarms: Vec<AlarmRecord>) -> Self {
        self.alarms = Ok(alarms);
        self
    }

    pub fn failing_alarms(mut self, error: ClientError) -> Self {
        self.alarms = Err(error);
        self
    }

    pub fn with_states(mut self, statuses: &[&str]) -> Self {
        self.states = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn failing_state(mut self, error: ClientError) -> Self {
        self.state_error = Some(error);
        self
    }

    pub fn failing_stop(mut self, error: ClientError) -> Self {
        self.stop_error = Some(error);
        self
    }

    pub fn failing_start(mut self, error: ClientError) -> Self {
        self.start_error = Some(error);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn alarm_queries(&self) -> usize {
        self.count(|c| matches!(c, Call::GetAlarms(_)))
    }

    pub fn state_queries(&self) -> usize {
        self.count(|c| matches!(c, Call::GetInstanceState(_)))
    }

    pub fn stops(&self) -> usize {
        self.count(|c| matches!(c, Call::StopInstance(_)))
    }

    pub fn starts(&self) -> usize {
        self.count(|c| matches!(c, Call::StartInstance(_)))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    /// Record a call and return how many calls of the same kind came before.
    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        let prior = calls
            .iter()
            .filter(|c| std::mem::discriminant(*c) == std::mem::discriminant(&call))
            .count();
        calls.push(call);
        prior
    }
}

fn outcome(error: &Option<ClientError>) -> ClientResult<()> {
    match error {
        Some(e) => Err(e.clone()),
        None => Ok(()),
    }
}

impl ResourceControl for FakeLightsail {
    async fn get_alarms(&self, resource: &str) -> ClientResult<Vec<AlarmRecord>> {
        self.record(Call::GetAlarms(resource.to_string()));
        self.alarms.clone()
    }

    async fn get_instance_state(&self, resource: &str) -> ClientResult<InstanceState> {
        let index = self.record(Call::GetInstanceState(resource.to_string()));
        if let Some(error) = &self.state_error {
            return Err(error.clone());
        }
        let status = self
            .states
            .get(index)
            .or_else(|| self.states.last())
            .map(String::as_str)
            .unwrap_or("running");
        Ok(InstanceState::new(resource, status))
    }

    async fn stop_instance(&self, resource: &str) -> ClientResult<()> {
        self.record(Call::StopInstance(resource.to_string()));
        outcome(&self.stop_error)
    }

    async fn start_instance(&self, resource: &str) -> ClientResult<()> {
        self.record(Call::StartInstance(resource.to_string()));
        outcome(&self.start_error)
    }
}

/// Sleeper that never waits and records each requested delay.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        Box::pin(std::future::ready(()))
    }
}

/// Event sink that keeps everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MonitorEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &MonitorEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_states_repeat_last() {
        let fake = FakeLightsail::new().with_states(&["stopping", "stopped"]);
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(fake.get_instance_state("web-1").await.unwrap().status);
        }
        assert_eq!(seen, vec!["stopping", "stopped", "stopped", "stopped"]);
        assert_eq!(fake.state_queries(), 4);
    }

    #[tokio::test]
    async fn unscripted_instance_keeps_running() {
        let fake = FakeLightsail::new();
        let state = fake.get_instance_state("web-1").await.unwrap();
        assert_eq!(state.status, "running");
    }

    #[tokio::test]
    async fn calls_are_recorded_in_order() {
        let fake = FakeLightsail::new();
        fake.stop_instance("web-1").await.unwrap();
        fake.get_alarms("web-1").await.unwrap();
        fake.start_instance("web-1").await.unwrap();
        assert_eq!(
            fake.calls(),
            vec![
                Call::StopInstance("web-1".to_string()),
                Call::GetAlarms("web-1".to_string()),
                Call::StartInstance("web-1".to_string()),
            ]
        );
    }
}
