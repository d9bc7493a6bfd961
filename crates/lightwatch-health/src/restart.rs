//! Restart coordinator: drives stop → wait-for-stopped → start.
//!
//! The wait is bounded by a [`RetryBudget`]: at most `max_polls` state
//! queries, each followed by a `poll_interval` pause while the instance
//! is not yet stopped. Start is only issued after "stopped" has been
//! observed, so an exhausted budget or a failed query leaves the instance
//! stopped rather than half-restarted. A shutdown request is honoured
//! before the stop and at every pause; client calls already in flight
//! always complete.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use lightwatch_core::config::{DEFAULT_MAX_POLLS, DEFAULT_POLL_INTERVAL};

use crate::client::ResourceControl;
use crate::events::{EventSink, MonitorEvent, Operation, TracingSink};
use crate::result::{MonitorResult, RestartError};
use crate::sleep::{Sleeper, TokioSleeper};

/// Bound on the wait-for-stopped loop.
///
/// `max_polls` counts attempts, not time; the worst-case wait is
/// `max_polls × poll_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub max_polls: u32,
    pub poll_interval: Duration,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_polls: DEFAULT_MAX_POLLS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl RetryBudget {
    pub fn new(max_polls: u32, poll_interval: Duration) -> Self {
        Self {
            max_polls,
            poll_interval,
        }
    }

    /// Budget that waits roughly `total` before giving up.
    ///
    /// Rounds up, so a deadline that isn't a multiple of the interval
    /// gets one extra poll. A zero interval polls once (or never, for a
    /// zero deadline).
    pub fn from_deadline(total: Duration, poll_interval: Duration) -> Self {
        let max_polls = if poll_interval.is_zero() {
            u32::from(!total.is_zero())
        } else {
            let polls = total.as_nanos().div_ceil(poll_interval.as_nanos());
            u32::try_from(polls).unwrap_or(u32::MAX)
        };
        Self::new(max_polls, poll_interval)
    }

    /// Longest the coordinator will spend pausing between polls.
    pub fn worst_case_wait(&self) -> Duration {
        self.poll_interval.saturating_mul(self.max_polls)
    }
}

/// States of the restart sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPhase {
    Stopping,
    WaitingForStop,
    Starting,
    Done,
}

impl RestartPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartPhase::Stopping => "stopping",
            RestartPhase::WaitingForStop => "waiting_for_stop",
            RestartPhase::Starting => "starting",
            RestartPhase::Done => "done",
        }
    }
}

/// Restarts an instance with a bounded wait for it to stop.
pub struct RestartCoordinator<C> {
    client: Arc<C>,
    budget: RetryBudget,
    sleeper: Arc<dyn Sleeper>,
    events: Arc<dyn EventSink>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<C: ResourceControl> RestartCoordinator<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            budget: RetryBudget::default(),
            sleeper: Arc::new(TokioSleeper),
            events: Arc::new(TracingSink),
            shutdown: None,
        }
    }

    pub fn with_budget(mut self, budget: RetryBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Abort the wait (without starting) once `shutdown` turns true.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn budget(&self) -> RetryBudget {
        self.budget
    }

    /// Stop the instance, wait for it to report "stopped", then start it.
    ///
    /// A shutdown already requested when this is called cancels the
    /// restart before anything is stopped.
    pub async fn restart_instance(&self, instance: &str) -> MonitorResult {
        let result = match self.run(instance).await {
            Ok(()) => MonitorResult::RestartSuccess,
            Err(error) => MonitorResult::RestartFailed { error },
        };
        self.events
            .emit(&MonitorEvent::finished(instance, Operation::Restart, &result));
        result
    }

    async fn run(&self, instance: &str) -> Result<(), RestartError> {
        if self.shutdown_requested() {
            return Err(RestartError::Cancelled);
        }

        self.enter(instance, RestartPhase::Stopping);
        self.client.stop_instance(instance).await?;

        self.enter(instance, RestartPhase::WaitingForStop);
        self.wait_for_stop(instance).await?;

        self.enter(instance, RestartPhase::Starting);
        self.client.start_instance(instance).await?;

        self.enter(instance, RestartPhase::Done);
        Ok(())
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    async fn wait_for_stop(&self, instance: &str) -> Result<(), RestartError> {
        let max_polls = self.budget.max_polls;
        let mut shutdown = self.shutdown.clone();
        let mut attempt = 0;

        while attempt < max_polls {
            let state = self.client.get_instance_state(instance).await?;
            attempt += 1;

            self.events.emit(&MonitorEvent::Polled {
                instance: instance.to_string(),
                attempt,
                max_polls,
                status: state.status.clone(),
            });

            if state.is_stopped() {
                return Ok(());
            }

            if !self.pause(shutdown.as_mut()).await {
                return Err(RestartError::Cancelled);
            }
        }

        Err(RestartError::TimedOut {
            attempts: max_polls,
        })
    }

    /// Sleep for one poll interval. Returns false if shutdown was
    /// requested before or during the pause.
    async fn pause(&self, shutdown: Option<&mut watch::Receiver<bool>>) -> bool {
        let interval = self.budget.poll_interval;

        let Some(shutdown) = shutdown else {
            self.sleeper.sleep(interval).await;
            return true;
        };

        if *shutdown.borrow_and_update() {
            return false;
        }

        let mut sleep = self.sleeper.sleep(interval);
        tokio::select! {
            biased;
            changed = shutdown.changed() => match changed {
                Ok(()) if *shutdown.borrow() => false,
                // Sender gone or flag reset: finish the pause.
                _ => {
                    sleep.await;
                    true
                }
            },
            _ = &mut sleep => true,
        }
    }

    fn enter(&self, instance: &str, phase: RestartPhase) {
        self.events.emit(&MonitorEvent::Transition {
            instance: instance.to_string(),
            phase,
        });
    }
}
