use serde::{Deserialize, Serialize};

use crate::{ImageRef, Name};

/// The cloud and cluster scope one test run provisions into.
///
/// Built once at the start of a run and threaded explicitly into every
/// runner and provisioner constructor - nothing reads scope out of ambient
/// state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestScope {
    /// The cloud project that owns the traffic-management resources.
    pub project: String,

    /// The VPC network the forwarding rule attaches to.
    pub network: String,

    /// The Kubernetes namespace workloads deploy into.
    pub namespace: Name,

    /// The prefix shared by every traffic resource this run creates.
    pub resource_prefix: Name,

    /// The control plane URI bootstrap generators point clients at.
    pub xds_server_uri: String,
}

/// Deployment settings for the test server workload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub deployment_name: Name,

    pub image: ImageRef,

    #[serde(default = "default_replicas")]
    pub replicas: u32,

    /// The port serving test RPCs.
    #[serde(default = "default_test_port")]
    pub test_port: u16,

    /// The port serving health checks and channelz.
    #[serde(default = "default_maintenance_port")]
    pub maintenance_port: u16,
}

fn default_replicas() -> u32 {
    1
}

fn default_test_port() -> u16 {
    8080
}

fn default_maintenance_port() -> u16 {
    8081
}

/// Deployment settings for one test client workload.
///
/// A `ClientConfig` is bound to exactly one bootstrap-generator image.
/// Exercising a different generator version means building a new config (and
/// a new runner from it) with [ClientConfig::for_bootstrap_image] - the
/// bound image is never mutated in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub deployment_name: Name,

    pub image: ImageRef,

    /// The bootstrap-generator image injected into the client deployment.
    pub bootstrap_image: ImageRef,

    /// The port the client serves channel and RPC stats on.
    #[serde(default = "default_stats_port")]
    pub stats_port: u16,

    /// Reach workload ports through kubectl-style port forwarding instead of
    /// assuming the cluster is directly routable. Debugging aid.
    #[serde(default)]
    pub debug_use_port_forwarding: bool,

    /// Attach cloud credentials through workload identity rather than a
    /// mounted key.
    #[serde(default = "default_true")]
    pub enable_workload_identity: bool,

    /// Skip namespace creation because a previous runner in this run already
    /// created it.
    #[serde(default)]
    pub reuse_namespace: bool,
}

fn default_stats_port() -> u16 {
    8079
}

fn default_true() -> bool {
    true
}

impl ClientConfig {
    /// Rebind this config to a different bootstrap-generator image.
    ///
    /// The returned config reuses the namespace: the deployment is new, the
    /// namespace it lands in is not.
    pub fn for_bootstrap_image(&self, bootstrap_image: ImageRef) -> Self {
        Self {
            bootstrap_image,
            reuse_namespace: true,
            ..self.clone()
        }
    }
}
