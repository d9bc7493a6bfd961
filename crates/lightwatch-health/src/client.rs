//! Resource-control client capability.

use std::future::Future;

use lightwatch_core::{AlarmRecord, ClientResult, InstanceState};

/// The cloud operations the monitor needs.
///
/// Implementations must not retry `stop_instance` or `start_instance`
/// on their own: those have real side effects and the coordinator
/// issues each at most once per restart.
pub trait ResourceControl: Send + Sync {
    /// Health alarms attached to `resource`, in the order the service
    /// returned them.
    fn get_alarms(
        &self,
        resource: &str,
    ) -> impl Future<Output = ClientResult<Vec<AlarmRecord>>> + Send;

    fn get_instance_state(
        &self,
        resource: &str,
    ) -> impl Future<Output = ClientResult<InstanceState>> + Send;

    fn stop_instance(&self, resource: &str) -> impl Future<Output = ClientResult<()>> + Send;

    fn start_instance(&self, resource: &str) -> impl Future<Output = ClientResult<()>> + Send;
}
