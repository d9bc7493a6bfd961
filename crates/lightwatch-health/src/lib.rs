//! lightwatch-health: health checking and self-healing for a Lightsail
//! instance.
//!
//! Reads the instance's health alarms, decides whether the instance is
//! failing its status check, and if so restarts it with a bounded
//! stop → poll → start sequence.
//!
//! # Architecture
//!
//! ```text
//! LightsailMonitor::restart_if_failing
//!   ├── HealthChecker::check_instance
//!   │   └── ResourceControl::get_alarms → StatusOk | StatusCheckFailed | CheckFailed
//!   └── RestartCoordinator::restart_instance   (only on StatusCheckFailed)
//!       ├── Stopping:        ResourceControl::stop_instance
//!       ├── WaitingForStop:  get_instance_state × max_polls, Sleeper between polls
//!       └── Starting:        ResourceControl::start_instance
//! ```
//!
//! Every operation returns a [`MonitorResult`]; nothing panics or bubbles
//! an `Err` to the caller. Progress is reported as [`MonitorEvent`]s to an
//! [`EventSink`] (by default forwarded to `tracing`).
//!
//! The client, the sleeper and the event sink are injected, so the state
//! machine can be driven in tests with the `fake` doubles (feature
//! `test-util`) and no real delay.

pub mod checker;
pub mod client;
pub mod events;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod monitor;
pub mod restart;
pub mod result;
pub mod sleep;

pub use checker::{HealthChecker, STATUS_CHECK_FAILED_METRIC};
pub use client::ResourceControl;
pub use events::{EventSink, MonitorEvent, Operation, TracingSink};
pub use monitor::LightsailMonitor;
pub use restart::{RestartCoordinator, RestartPhase, RetryBudget};
pub use result::{MonitorResult, RestartError};
pub use sleep::{Sleeper, TokioSleeper};
