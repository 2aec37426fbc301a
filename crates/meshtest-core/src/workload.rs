//! Workload runner and endpoint handle contracts.
//!
//! Runners deploy containerized test workloads into a cluster and own their
//! lifecycle; handles represent a workload that's already running. Both live
//! outside this crate - the driver only sequences them.

use meshtest_api::{ClientConfig, ServerConfig, XdsAddress};

use crate::BoxError;

/// Deploys the test server workload.
pub trait ServerRunner {
    type Server: TestServer;

    /// Deploy the server and block until it's ready to serve.
    async fn run(&mut self, config: &ServerConfig) -> Result<Self::Server, BoxError>;

    /// Tear the server deployment down. With `force`, implementations should
    /// delete what they can and not fail on what they can't.
    async fn cleanup(&mut self, force: bool) -> Result<(), BoxError>;
}

/// A running test server.
///
/// A server doesn't know the virtual host/port the URL map routes to it;
/// the driver binds that on after setup, and clients target the bound
/// address.
pub trait TestServer {
    fn set_xds_address(&mut self, address: XdsAddress);

    fn xds_address(&self) -> Option<&XdsAddress>;
}

/// Builds client runners.
///
/// The driver asks for a fresh runner for every matrix entry, passing the
/// full configuration each time - a runner's bootstrap-generator image is
/// fixed at construction, so runners are never reused across entries.
pub trait ClientFactory {
    type Runner: ClientRunner;

    fn runner(&mut self, config: &ClientConfig) -> Self::Runner;
}

/// Deploys one test client workload.
pub trait ClientRunner {
    type Client: TestClient;

    /// Deploy the client pointed at `target`.
    async fn run(&mut self, target: &XdsAddress) -> Result<Self::Client, BoxError>;

    /// Tear the client deployment down. With `force`, implementations should
    /// delete what they can and not fail on what they can't.
    async fn cleanup(&mut self, force: bool) -> Result<(), BoxError>;
}

/// A running test client.
///
/// The probe methods are read-only: calling them any number of times against
/// an unchanged client observes the same result and changes nothing.
pub trait TestClient {
    /// Resolve once the client holds an active, established channel to its
    /// target. Implementations may wait indefinitely - the driver bounds the
    /// wait with its own timeout.
    async fn wait_until_active(&self) -> Result<(), BoxError>;

    /// Whether the client has accepted any xDS configuration.
    async fn xds_config_present(&self) -> Result<bool, BoxError>;

    /// Whether the server at `server` has observed successful RPCs from this
    /// client.
    async fn rpcs_succeeded(&self, server: &XdsAddress) -> Result<bool, BoxError>;
}
