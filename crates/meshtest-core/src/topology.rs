use meshtest_api::XdsAddress;
use serde::Serialize;

use crate::BoxError;

/// The ordered steps that stand up a run's shared fixture: the five-resource
/// traffic-management chain, the server workload, and backend registration.
///
/// Order matters. Each traffic resource references the one created before it
/// (the backend service names the health check, the URL map names the
/// backend service, and so on), and backends can't be registered until the
/// server exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStep {
    CreateHealthCheck,
    CreateBackendService,
    CreateUrlMap,
    CreateTargetProxy,
    CreateForwardingRule,
    StartTestServer,
    RegisterBackends,
}

impl SetupStep {
    /// Every step, in dependency order.
    pub const ALL: [SetupStep; 7] = [
        SetupStep::CreateHealthCheck,
        SetupStep::CreateBackendService,
        SetupStep::CreateUrlMap,
        SetupStep::CreateTargetProxy,
        SetupStep::CreateForwardingRule,
        SetupStep::StartTestServer,
        SetupStep::RegisterBackends,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SetupStep::CreateHealthCheck => "create_health_check",
            SetupStep::CreateBackendService => "create_backend_service",
            SetupStep::CreateUrlMap => "create_url_map",
            SetupStep::CreateTargetProxy => "create_target_proxy",
            SetupStep::CreateForwardingRule => "create_forwarding_rule",
            SetupStep::StartTestServer => "start_test_server",
            SetupStep::RegisterBackends => "register_backends",
        }
    }
}

impl std::fmt::Display for SetupStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Creates and destroys the chain of traffic-management resources scoped to
/// one test run: health check, backend service, URL map, target proxy,
/// forwarding rule.
///
/// The driver calls the `create_*` methods exactly once each, in the order
/// they're declared here, and never retries - transient provisioning errors
/// are the implementation's concern. `cleanup` tears down whatever was
/// created, in whatever order the implementation needs.
pub trait TrafficManager {
    async fn create_health_check(&mut self) -> Result<(), BoxError>;

    async fn create_backend_service(&mut self) -> Result<(), BoxError>;

    /// Create the URL map routing `address` to the backend service.
    async fn create_url_map(&mut self, address: &XdsAddress) -> Result<(), BoxError>;

    async fn create_target_proxy(&mut self) -> Result<(), BoxError>;

    async fn create_forwarding_rule(&mut self, port: u16) -> Result<(), BoxError>;

    /// Register the running server workload's endpoints with the backend
    /// service. Separate from the create sequence because the server has to
    /// exist first.
    async fn register_backends(&mut self) -> Result<(), BoxError>;

    /// Tear down every resource this manager created. Best effort; called
    /// once at the end of a run regardless of outcome.
    async fn cleanup(&mut self) -> Result<(), BoxError>;
}
