//! Run a full scenario against in-memory collaborators.
//!
//! Nothing here touches a cloud project or a cluster - every collaborator
//! just logs and succeeds. Useful for seeing the orchestration order and the
//! report format: `RUST_LOG=info cargo run --example dry-run`.

use std::str::FromStr;
use std::time::Duration;

use meshtest_api::{
    ClientConfig, ImageRef, MatrixEntry, Name, ServerConfig, TestScope, VersionMatrix, XdsAddress,
};
use meshtest_core::{
    BoxError, ClientFactory, ClientRunner, DriverOptions, ServerRunner, TestClient, TestDriver,
    TestServer, TrafficManager,
};
use tracing_subscriber::EnvFilter;

struct FakeTraffic;

impl TrafficManager for FakeTraffic {
    async fn create_health_check(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn create_backend_service(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn create_url_map(&mut self, address: &XdsAddress) -> Result<(), BoxError> {
        tracing::info!(%address, "url map routes to");
        Ok(())
    }

    async fn create_target_proxy(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn create_forwarding_rule(&mut self, port: u16) -> Result<(), BoxError> {
        tracing::info!(port, "forwarding rule");
        Ok(())
    }

    async fn register_backends(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

struct FakeServer {
    xds_address: Option<XdsAddress>,
}

impl TestServer for FakeServer {
    fn set_xds_address(&mut self, address: XdsAddress) {
        self.xds_address = Some(address);
    }

    fn xds_address(&self) -> Option<&XdsAddress> {
        self.xds_address.as_ref()
    }
}

struct FakeServerRunner;

impl ServerRunner for FakeServerRunner {
    type Server = FakeServer;

    async fn run(&mut self, config: &ServerConfig) -> Result<FakeServer, BoxError> {
        tracing::info!(deployment = %config.deployment_name, "server up");
        Ok(FakeServer { xds_address: None })
    }

    async fn cleanup(&mut self, _force: bool) -> Result<(), BoxError> {
        Ok(())
    }
}

struct FakeFactory;

impl ClientFactory for FakeFactory {
    type Runner = FakeClientRunner;

    fn runner(&mut self, config: &ClientConfig) -> FakeClientRunner {
        FakeClientRunner {
            bootstrap_image: config.bootstrap_image.clone(),
        }
    }
}

struct FakeClientRunner {
    bootstrap_image: ImageRef,
}

impl ClientRunner for FakeClientRunner {
    type Client = FakeClient;

    async fn run(&mut self, target: &XdsAddress) -> Result<FakeClient, BoxError> {
        tracing::info!(bootstrap = %self.bootstrap_image, %target, "client up");
        Ok(FakeClient)
    }

    async fn cleanup(&mut self, _force: bool) -> Result<(), BoxError> {
        Ok(())
    }
}

struct FakeClient;

impl TestClient for FakeClient {
    async fn wait_until_active(&self) -> Result<(), BoxError> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    }

    async fn xds_config_present(&self) -> Result<bool, BoxError> {
        Ok(true)
    }

    async fn rpcs_succeeded(&self, _server: &XdsAddress) -> Result<bool, BoxError> {
        Ok(true)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let scope = TestScope {
        project: "example-project".to_string(),
        network: "default".to_string(),
        namespace: Name::from_static("psm-interop"),
        resource_prefix: Name::from_static("psm-interop"),
        xds_server_uri: "trafficdirector.googleapis.com:443".to_string(),
    };
    let server = ServerConfig {
        deployment_name: Name::from_static("psm-grpc-server"),
        image: ImageRef::from_str("gcr.io/grpc-testing/xds-server:latest").unwrap(),
        replicas: 1,
        test_port: 8080,
        maintenance_port: 8081,
    };
    let client = ClientConfig {
        deployment_name: Name::from_static("psm-grpc-client"),
        image: ImageRef::from_str("gcr.io/grpc-testing/xds-client:latest").unwrap(),
        bootstrap_image: ImageRef::from_str("gcr.io/grpc-testing/td-grpc-bootstrap:latest")
            .unwrap(),
        stats_port: 8079,
        debug_use_port_forwarding: false,
        enable_workload_identity: true,
        reuse_namespace: false,
    };

    let matrix = VersionMatrix::new(vec![
        MatrixEntry::new(
            "v0.14.0",
            ImageRef::from_str("gcr.io/grpc-testing/td-grpc-bootstrap:v0.14.0").unwrap(),
        ),
        MatrixEntry::new(
            "v0.15.0",
            ImageRef::from_str("gcr.io/grpc-testing/td-grpc-bootstrap:v0.15.0").unwrap(),
        ),
    ])
    .unwrap();

    let options = DriverOptions::new(
        scope,
        server,
        client,
        XdsAddress::new("xds-test-server", 8080).unwrap(),
        matrix,
    )
    .with_force_cleanup(true)
    .with_activation_timeout(Duration::from_secs(10));

    let driver = TestDriver::new(FakeTraffic, FakeServerRunner, FakeFactory, options);
    let report = driver.run().await.unwrap();

    print!("{report}");
    std::process::exit(if report.passed() { 0 } else { 1 });
}
