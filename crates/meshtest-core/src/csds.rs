//! A probe for [CSDS][csds], the config-dump service test workloads expose.
//!
//! "xDS config is present" on a client means its dump contains at least one
//! ACKed resource. An empty dump, or a dump where everything was NACKed,
//! means the bootstrap generator under test never produced a working
//! bootstrap.
//!
//! [csds]: https://www.envoyproxy.io/docs/envoy/latest/api-v3/service/status/v3/csds.proto

use tonic::transport::{Channel, Endpoint};
use xds_api::pb::envoy::{
    admin::v3::ClientResourceStatus,
    service::status::v3::{
        client_config::GenericXdsConfig,
        client_status_discovery_service_client::ClientStatusDiscoveryServiceClient,
        ClientStatusRequest, ClientStatusResponse,
    },
};

use crate::error::Result;

/// A CSDS client pointed at one test workload.
///
/// Fetches are read-only: the workload reports the state of its own xDS
/// cache and nothing changes on either side, so a fetch can be repeated
/// freely and observes the same config until the control plane pushes an
/// update.
pub struct CsdsProbe {
    client: ClientStatusDiscoveryServiceClient<Channel>,
}

impl CsdsProbe {
    /// Connect to a workload's CSDS endpoint.
    pub async fn connect(uri: String) -> Result<Self> {
        let channel = Endpoint::from_shared(uri)?.connect().await?;

        Ok(Self {
            client: ClientStatusDiscoveryServiceClient::new(channel),
        })
    }

    /// Fetch the workload's config dump.
    ///
    /// The request carries no node matchers: a test workload is a
    /// single-node CSDS endpoint and has exactly one config to report.
    pub async fn fetch(&mut self) -> Result<ClientStatusResponse> {
        let response = self
            .client
            .fetch_client_status(ClientStatusRequest::default())
            .await?;

        Ok(response.into_inner())
    }

    /// Fetch and check whether any config has been ACKed.
    pub async fn config_present(&mut self) -> Result<bool> {
        let response = self.fetch().await?;
        Ok(has_acked_config(&response))
    }
}

/// Every generic xDS config entry in a dump, across all reported client
/// configs.
pub fn generic_configs(
    response: &ClientStatusResponse,
) -> impl Iterator<Item = &GenericXdsConfig> {
    response
        .config
        .iter()
        .flat_map(|config| config.generic_xds_configs.iter())
}

/// The ACKed subset of a dump.
pub fn acked_configs(response: &ClientStatusResponse) -> Vec<&GenericXdsConfig> {
    generic_configs(response)
        .filter(|config| config.client_status() == ClientResourceStatus::Acked)
        .collect()
}

/// Whether a dump shows any usable (ACKed) configuration.
pub fn has_acked_config(response: &ClientStatusResponse) -> bool {
    generic_configs(response).any(|config| config.client_status() == ClientResourceStatus::Acked)
}
