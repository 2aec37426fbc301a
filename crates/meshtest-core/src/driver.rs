use std::time::Duration;

use meshtest_api::{ClientConfig, MatrixEntry, ServerConfig, TestScope, XdsAddress};

use crate::{
    report::{CleanupOutcome, EntryOutcome, EntryReport, RunReport, StepReport},
    topology::{SetupStep, TrafficManager},
    workload::{ClientFactory, ClientRunner, ServerRunner, TestClient, TestServer},
    Error,
};

/// How long to wait for a client to report an active channel before giving
/// up on a matrix entry. Covers image pulls, bootstrap generation, and xDS
/// config distribution.
pub const DEFAULT_ACTIVATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything one test run consumes: the scope to provision into, the two
/// workload configs, the virtual address wired through the URL map, and the
/// version matrix.
#[derive(Clone, Debug)]
pub struct DriverOptions {
    pub scope: TestScope,

    pub server: ServerConfig,

    /// The base client config. Each matrix entry derives its own from this,
    /// rebinding the bootstrap image.
    pub client: ClientConfig,

    /// The host/port the URL map routes to the server, and the authority
    /// clients dial.
    pub xds_address: XdsAddress,

    /// Bootstrap-generator versions to exercise, in reporting order. An
    /// empty list is allowed here and makes the run vacuous (setup and
    /// teardown only); rejecting it is the configuration layer's job, see
    /// [meshtest_api::VersionMatrix].
    pub matrix: Vec<MatrixEntry>,

    /// Swallow client cleanup errors so one entry's stuck teardown can't
    /// block the entries after it.
    pub force_cleanup: bool,

    /// Bound on the wait for an active channel, per entry.
    pub activation_timeout: Duration,
}

impl DriverOptions {
    pub fn new(
        scope: TestScope,
        server: ServerConfig,
        client: ClientConfig,
        xds_address: XdsAddress,
        matrix: impl Into<Vec<MatrixEntry>>,
    ) -> Self {
        Self {
            scope,
            server,
            client,
            xds_address,
            matrix: matrix.into(),
            force_cleanup: false,
            activation_timeout: DEFAULT_ACTIVATION_TIMEOUT,
        }
    }

    pub fn with_force_cleanup(mut self, force_cleanup: bool) -> Self {
        self.force_cleanup = force_cleanup;
        self
    }

    pub fn with_activation_timeout(mut self, timeout: Duration) -> Self {
        self.activation_timeout = timeout;
        self
    }
}

/// The scenario driver.
///
/// One driver owns one run: it stands the shared fixture up exactly once
/// (topology, server, backend registration), exercises every matrix entry
/// against it in order, and tears the fixture down at the end no matter what
/// happened in between.
///
/// Entries are isolated from each other. A failed assertion, a bring-up
/// error, or a timed-out activation wait is recorded against its own entry
/// and the run moves on; that entry's client cleanup still runs. Only a
/// failure in the shared setup is fatal to the whole run.
pub struct TestDriver<T, S, F> {
    traffic: T,
    server_runner: S,
    clients: F,
    options: DriverOptions,
}

impl<T, S, F> TestDriver<T, S, F>
where
    T: TrafficManager,
    S: ServerRunner,
    F: ClientFactory,
{
    pub fn new(traffic: T, server_runner: S, clients: F, options: DriverOptions) -> Self {
        Self {
            traffic,
            server_runner,
            clients,
            options,
        }
    }

    /// Run the scenario to completion.
    ///
    /// Returns `Ok(report)` whenever the shared setup succeeded, even if
    /// every matrix entry failed - per-entry results live in the report.
    /// `Err` is reserved for fatal setup failures; best-effort teardown has
    /// already run by the time it's returned.
    pub async fn run(mut self) -> Result<RunReport, Error> {
        tracing::info!(
            project = %self.options.scope.project,
            namespace = %self.options.scope.namespace,
            versions = self.options.matrix.len(),
            "starting run",
        );

        let mut report = RunReport::default();

        let server = match self.setup(&mut report).await {
            Ok(server) => server,
            Err(e) => {
                self.teardown(&mut report).await;
                return Err(e);
            }
        };

        let matrix = std::mem::take(&mut self.options.matrix);
        for (i, entry) in matrix.iter().enumerate() {
            // an explicit fresh config per entry. the first runner creates
            // the namespace, every later one reuses it.
            let config = if i == 0 {
                ClientConfig {
                    bootstrap_image: entry.image.clone(),
                    ..self.options.client.clone()
                }
            } else {
                self.options.client.for_bootstrap_image(entry.image.clone())
            };

            tracing::info!(entry = %entry, "starting matrix entry");
            let entry_report = self.run_entry(entry, &config, &server).await;
            tracing::info!(
                entry = %entry,
                passed = entry_report.passed(),
                "finished matrix entry",
            );

            report.entries.push(entry_report);
        }

        self.teardown(&mut report).await;
        Ok(report)
    }

    /// Stand up the shared fixture: the five traffic resources in dependency
    /// order, then the server, then backend registration. The first failure
    /// is fatal and nothing after it runs.
    async fn setup(&mut self, report: &mut RunReport) -> Result<S::Server, Error> {
        let mut completed = Vec::new();

        macro_rules! step {
            ($step:expr, $fut:expr) => {{
                let step = $step;
                tracing::info!(step = %step, "setup");
                match $fut.await {
                    Ok(value) => {
                        report.steps.push(StepReport::ok(step));
                        completed.push(step);
                        value
                    }
                    Err(e) => {
                        tracing::error!(step = %step, err = %e, "setup failed");
                        report.steps.push(StepReport::failed(step, &e));
                        return Err(Error::Setup {
                            step,
                            completed,
                            source: e,
                        });
                    }
                }
            }};
        }

        let address = self.options.xds_address.clone();

        step!(
            SetupStep::CreateHealthCheck,
            self.traffic.create_health_check()
        );
        step!(
            SetupStep::CreateBackendService,
            self.traffic.create_backend_service()
        );
        step!(SetupStep::CreateUrlMap, self.traffic.create_url_map(&address));
        step!(
            SetupStep::CreateTargetProxy,
            self.traffic.create_target_proxy()
        );
        step!(
            SetupStep::CreateForwardingRule,
            self.traffic.create_forwarding_rule(address.port())
        );

        let mut server = step!(
            SetupStep::StartTestServer,
            self.server_runner.run(&self.options.server)
        );

        // the server's advertised address is the URL map's host/port, not
        // anything the runner could know on its own.
        server.set_xds_address(address);

        step!(
            SetupStep::RegisterBackends,
            self.traffic.register_backends()
        );

        Ok(server)
    }

    /// Exercise one matrix entry and clean its client up. Cleanup runs no
    /// matter how the entry went.
    async fn run_entry(
        &mut self,
        entry: &MatrixEntry,
        config: &ClientConfig,
        server: &S::Server,
    ) -> EntryReport {
        let mut runner = self.clients.runner(config);

        // entry-scoped failures become data on the report, never errors that
        // escape the loop. a timeout keeps its own category so it's never
        // mistaken for a definite negative.
        let outcome = match self.exercise(&mut runner, server).await {
            Ok(outcome) => outcome,
            Err(Error::DeadlineExceeded { waited }) => {
                tracing::warn!(entry = %entry, ?waited, "no active channel, skipping assertions");
                EntryOutcome::ActivationTimedOut { waited }
            }
            Err(e) => {
                tracing::warn!(entry = %entry, err = %e, "client bring-up failed");
                EntryOutcome::BringUpFailed {
                    message: e.to_string(),
                }
            }
        };

        let cleanup = match runner.cleanup(self.options.force_cleanup).await {
            Ok(()) => CleanupOutcome::Clean,
            Err(e) if self.options.force_cleanup => {
                tracing::warn!(entry = %entry, err = %e, "suppressing client cleanup error");
                CleanupOutcome::Suppressed {
                    message: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!(entry = %entry, err = %e, "client cleanup failed");
                CleanupOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        EntryReport {
            entry: entry.clone(),
            outcome,
            cleanup,
        }
    }

    /// Deploy a client, wait for an active channel, and run both assertions.
    async fn exercise(
        &mut self,
        runner: &mut F::Runner,
        server: &S::Server,
    ) -> Result<EntryOutcome, Error> {
        let target = match server.xds_address() {
            Some(address) => address.clone(),
            // bound during setup; reaching this is a driver bug
            None => return Err(Error::BringUp("server handle has no xDS address".into())),
        };

        let client = runner.run(&target).await.map_err(Error::BringUp)?;

        // the one bounded wait in a run
        let waited = self.options.activation_timeout;
        match tokio::time::timeout(waited, client.wait_until_active()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::BringUp(e)),
            Err(_) => return Err(Error::DeadlineExceeded { waited }),
        }

        // probes are read-only; an error talking to one is an infrastructure
        // problem, not a definite negative.
        let config_present = client.xds_config_present().await.map_err(Error::BringUp)?;
        let rpcs_received = client
            .rpcs_succeeded(&target)
            .await
            .map_err(Error::BringUp)?;

        if config_present && rpcs_received {
            Ok(EntryOutcome::Passed)
        } else {
            Ok(EntryOutcome::AssertionsFailed {
                config_present,
                rpcs_received,
            })
        }
    }

    /// Best-effort teardown of the shared fixture. Errors are logged and
    /// recorded, never surfaced.
    async fn teardown(&mut self, report: &mut RunReport) {
        if let Err(e) = self.server_runner.cleanup(self.options.force_cleanup).await {
            tracing::warn!(err = %e, "server cleanup failed");
            report.teardown_errors.push(format!("server: {e}"));
        }

        if let Err(e) = self.traffic.cleanup().await {
            tracing::warn!(err = %e, "topology cleanup failed");
            report.teardown_errors.push(format!("topology: {e}"));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::BoxError;
    use meshtest_api::{ImageRef, Name};
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::{Arc, Mutex};

    /// A shared journal of every collaborator call, in order.
    type Journal = Arc<Mutex<Vec<String>>>;

    fn log(journal: &Journal, event: impl Into<String>) {
        journal.lock().unwrap().push(event.into());
    }

    fn events(journal: &Journal) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    enum ClientMode {
        Healthy,
        DeployFails,
        NeverActivates,
        NoConfig,
        NoRpcs,
        CleanupFails,
    }

    struct MockTraffic {
        journal: Journal,
        fail_at: Option<SetupStep>,
    }

    impl MockTraffic {
        fn step(&self, step: SetupStep) -> Result<(), BoxError> {
            if self.fail_at == Some(step) {
                return Err(format!("induced failure at {step}").into());
            }
            Ok(())
        }
    }

    impl TrafficManager for MockTraffic {
        async fn create_health_check(&mut self) -> Result<(), BoxError> {
            log(&self.journal, "create_health_check");
            self.step(SetupStep::CreateHealthCheck)
        }

        async fn create_backend_service(&mut self) -> Result<(), BoxError> {
            log(&self.journal, "create_backend_service");
            self.step(SetupStep::CreateBackendService)
        }

        async fn create_url_map(&mut self, address: &XdsAddress) -> Result<(), BoxError> {
            log(&self.journal, format!("create_url_map:{address}"));
            self.step(SetupStep::CreateUrlMap)
        }

        async fn create_target_proxy(&mut self) -> Result<(), BoxError> {
            log(&self.journal, "create_target_proxy");
            self.step(SetupStep::CreateTargetProxy)
        }

        async fn create_forwarding_rule(&mut self, port: u16) -> Result<(), BoxError> {
            log(&self.journal, format!("create_forwarding_rule:{port}"));
            self.step(SetupStep::CreateForwardingRule)
        }

        async fn register_backends(&mut self) -> Result<(), BoxError> {
            log(&self.journal, "register_backends");
            self.step(SetupStep::RegisterBackends)
        }

        async fn cleanup(&mut self) -> Result<(), BoxError> {
            log(&self.journal, "traffic_cleanup");
            Ok(())
        }
    }

    struct MockServer {
        xds_address: Option<XdsAddress>,
    }

    impl TestServer for MockServer {
        fn set_xds_address(&mut self, address: XdsAddress) {
            self.xds_address = Some(address);
        }

        fn xds_address(&self) -> Option<&XdsAddress> {
            self.xds_address.as_ref()
        }
    }

    struct MockServerRunner {
        journal: Journal,
    }

    impl ServerRunner for MockServerRunner {
        type Server = MockServer;

        async fn run(&mut self, config: &ServerConfig) -> Result<MockServer, BoxError> {
            log(
                &self.journal,
                format!(
                    "start_test_server:replicas={}:port={}",
                    config.replicas, config.test_port
                ),
            );
            Ok(MockServer { xds_address: None })
        }

        async fn cleanup(&mut self, force: bool) -> Result<(), BoxError> {
            log(&self.journal, format!("server_cleanup:force={force}"));
            Ok(())
        }
    }

    struct MockFactory {
        journal: Journal,
        // mode per bootstrap image tag; anything unlisted is healthy.
        modes: HashMap<String, ClientMode>,
    }

    impl MockFactory {
        fn healthy(journal: Journal) -> Self {
            Self {
                journal,
                modes: HashMap::new(),
            }
        }

        fn with_modes(journal: Journal, modes: &[(&str, ClientMode)]) -> Self {
            Self {
                journal,
                modes: modes
                    .iter()
                    .map(|(tag, mode)| (tag.to_string(), *mode))
                    .collect(),
            }
        }
    }

    impl ClientFactory for MockFactory {
        type Runner = MockRunner;

        fn runner(&mut self, config: &ClientConfig) -> MockRunner {
            let tag = config
                .bootstrap_image
                .tag()
                .unwrap_or("latest")
                .to_string();
            log(
                &self.journal,
                format!("new_runner:{tag}:reuse={}", config.reuse_namespace),
            );

            let mode = self.modes.get(&tag).copied().unwrap_or(ClientMode::Healthy);
            MockRunner {
                journal: self.journal.clone(),
                tag,
                mode,
            }
        }
    }

    struct MockRunner {
        journal: Journal,
        tag: String,
        mode: ClientMode,
    }

    impl ClientRunner for MockRunner {
        type Client = MockClient;

        async fn run(&mut self, target: &XdsAddress) -> Result<MockClient, BoxError> {
            log(&self.journal, format!("client_run:{}:{target}", self.tag));
            if self.mode == ClientMode::DeployFails {
                return Err("induced deploy failure".into());
            }
            Ok(MockClient {
                journal: self.journal.clone(),
                tag: self.tag.clone(),
                mode: self.mode,
            })
        }

        async fn cleanup(&mut self, force: bool) -> Result<(), BoxError> {
            log(
                &self.journal,
                format!("client_cleanup:{}:force={force}", self.tag),
            );
            if self.mode == ClientMode::CleanupFails {
                return Err("induced cleanup failure".into());
            }
            Ok(())
        }
    }

    struct MockClient {
        journal: Journal,
        tag: String,
        mode: ClientMode,
    }

    impl TestClient for MockClient {
        async fn wait_until_active(&self) -> Result<(), BoxError> {
            log(&self.journal, format!("wait_until_active:{}", self.tag));
            if self.mode == ClientMode::NeverActivates {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn xds_config_present(&self) -> Result<bool, BoxError> {
            log(&self.journal, format!("xds_config_present:{}", self.tag));
            Ok(self.mode != ClientMode::NoConfig)
        }

        async fn rpcs_succeeded(&self, _server: &XdsAddress) -> Result<bool, BoxError> {
            log(&self.journal, format!("rpcs_succeeded:{}", self.tag));
            Ok(self.mode != ClientMode::NoRpcs)
        }
    }

    fn entry(tag: &str) -> MatrixEntry {
        MatrixEntry::new(
            tag,
            ImageRef::from_str(&format!("gcr.io/grpc-testing/td-grpc-bootstrap:{tag}")).unwrap(),
        )
    }

    fn options(matrix: Vec<MatrixEntry>) -> DriverOptions {
        let scope = TestScope {
            project: "grpc-testing".to_string(),
            network: "default-vpc".to_string(),
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
        let address = XdsAddress::new("xds-test-server", 8080).unwrap();

        DriverOptions::new(scope, server, client, address, matrix)
            .with_activation_timeout(Duration::from_secs(5))
    }

    fn driver(
        journal: &Journal,
        factory: MockFactory,
        options: DriverOptions,
    ) -> TestDriver<MockTraffic, MockServerRunner, MockFactory> {
        TestDriver::new(
            MockTraffic {
                journal: journal.clone(),
                fail_at: None,
            },
            MockServerRunner {
                journal: journal.clone(),
            },
            factory,
            options,
        )
    }

    fn setup_events() -> Vec<String> {
        vec![
            "create_health_check".to_string(),
            "create_backend_service".to_string(),
            "create_url_map:xds:///xds-test-server:8080".to_string(),
            "create_target_proxy".to_string(),
            "create_forwarding_rule:8080".to_string(),
            "start_test_server:replicas=1:port=8080".to_string(),
            "register_backends".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_baseline_single_version() {
        let journal = Journal::default();
        let factory = MockFactory::healthy(journal.clone());
        let driver = driver(&journal, factory, options(vec![entry("v0.14.0")]));

        let report = driver.run().await.unwrap();

        assert!(report.passed());
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].outcome, EntryOutcome::Passed);
        assert_eq!(report.entries[0].cleanup, CleanupOutcome::Clean);

        // the whole run, in order, with every probe called exactly once.
        let mut expected = setup_events();
        expected.extend([
            "new_runner:v0.14.0:reuse=false".to_string(),
            "client_run:v0.14.0:xds:///xds-test-server:8080".to_string(),
            "wait_until_active:v0.14.0".to_string(),
            "xds_config_present:v0.14.0".to_string(),
            "rpcs_succeeded:v0.14.0".to_string(),
            "client_cleanup:v0.14.0:force=false".to_string(),
            "server_cleanup:force=false".to_string(),
            "traffic_cleanup".to_string(),
        ]);
        assert_eq!(events(&journal), expected);
    }

    #[tokio::test]
    async fn test_setup_runs_once_in_order_for_any_matrix_size() {
        for n in [0, 1, 3] {
            let journal = Journal::default();
            let factory = MockFactory::healthy(journal.clone());
            let matrix = (0..n).map(|i| entry(&format!("v{i}"))).collect();
            let driver = driver(&journal, factory, options(matrix));

            let report = driver.run().await.unwrap();

            assert_eq!(report.entries.len(), n);
            let events = events(&journal);
            assert_eq!(&events[..7], setup_events().as_slice(), "matrix size {n}");
            for event in setup_events() {
                assert_eq!(
                    events.iter().filter(|e| **e == event).count(),
                    1,
                    "step {event} should run exactly once with matrix size {n}",
                );
            }
        }
    }

    #[tokio::test]
    async fn test_empty_matrix_is_vacuous() {
        let journal = Journal::default();
        let factory = MockFactory::healthy(journal.clone());
        let driver = driver(&journal, factory, options(vec![]));

        let report = driver.run().await.unwrap();

        assert!(report.passed());
        assert!(report.entries.is_empty());
        assert_eq!(report.steps.len(), 7);
        assert!(!events(&journal).iter().any(|e| e.starts_with("new_runner")));
    }

    #[tokio::test]
    async fn test_fatal_setup_aborts_run() {
        let journal = Journal::default();
        let driver = TestDriver::new(
            MockTraffic {
                journal: journal.clone(),
                fail_at: Some(SetupStep::CreateUrlMap),
            },
            MockServerRunner {
                journal: journal.clone(),
            },
            MockFactory::healthy(journal.clone()),
            options(vec![entry("v0.14.0")]),
        );

        let err = driver.run().await.unwrap_err();

        match &err {
            Error::Setup {
                step, completed, ..
            } => {
                assert_eq!(*step, SetupStep::CreateUrlMap);
                assert_eq!(
                    completed.as_slice(),
                    &[SetupStep::CreateHealthCheck, SetupStep::CreateBackendService],
                );
            }
            other => panic!("expected a setup error, got {other:?}"),
        }
        // the message attributes the failure without hiding what succeeded
        let message = err.to_string();
        assert!(message.contains("create_url_map"));
        assert!(message.contains("create_health_check, create_backend_service"));

        let events = events(&journal);
        // nothing past the failed step, and no entries attempted
        assert!(!events.iter().any(|e| e.starts_with("create_target_proxy")));
        assert!(!events.iter().any(|e| e.starts_with("new_runner")));
        // teardown was still attempted
        assert!(events.contains(&"server_cleanup:force=false".to_string()));
        assert!(events.contains(&"traffic_cleanup".to_string()));
    }

    #[tokio::test]
    async fn test_cleanup_runs_when_assertions_fail() {
        let journal = Journal::default();
        let factory =
            MockFactory::with_modes(journal.clone(), &[("v0.14.0", ClientMode::NoRpcs)]);
        let driver = driver(&journal, factory, options(vec![entry("v0.14.0")]));

        let report = driver.run().await.unwrap();

        assert!(!report.passed());
        assert_eq!(
            report.entries[0].outcome,
            EntryOutcome::AssertionsFailed {
                config_present: true,
                rpcs_received: false,
            },
        );
        assert_eq!(report.entries[0].cleanup, CleanupOutcome::Clean);
        assert!(events(&journal).contains(&"client_cleanup:v0.14.0:force=false".to_string()));
    }

    #[tokio::test]
    async fn test_cleanup_runs_when_bring_up_fails() {
        let journal = Journal::default();
        let factory =
            MockFactory::with_modes(journal.clone(), &[("v0.14.0", ClientMode::DeployFails)]);
        let driver = driver(&journal, factory, options(vec![entry("v0.14.0")]));

        let report = driver.run().await.unwrap();

        assert!(matches!(
            report.entries[0].outcome,
            EntryOutcome::BringUpFailed { .. },
        ));

        let events = events(&journal);
        // assertions skipped, cleanup still attempted
        assert!(!events.iter().any(|e| e.starts_with("xds_config_present")));
        assert!(!events.iter().any(|e| e.starts_with("rpcs_succeeded")));
        assert!(events.contains(&"client_cleanup:v0.14.0:force=false".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_timeout_skips_assertions() {
        let journal = Journal::default();
        let factory =
            MockFactory::with_modes(journal.clone(), &[("v0.14.0", ClientMode::NeverActivates)]);
        let driver = driver(&journal, factory, options(vec![entry("v0.14.0")]));

        let report = driver.run().await.unwrap();

        // a timeout is reported as its own category, not as a false assertion
        assert_eq!(
            report.entries[0].outcome,
            EntryOutcome::ActivationTimedOut {
                waited: Duration::from_secs(5),
            },
        );

        let events = events(&journal);
        assert!(!events.iter().any(|e| e.starts_with("xds_config_present")));
        assert!(!events.iter().any(|e| e.starts_with("rpcs_succeeded")));
        assert!(events.contains(&"client_cleanup:v0.14.0:force=false".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_version_fails_activation() {
        let journal = Journal::default();
        let factory =
            MockFactory::with_modes(journal.clone(), &[("vB", ClientMode::NeverActivates)]);
        let driver = driver(&journal, factory, options(vec![entry("vA"), entry("vB")]));

        let report = driver.run().await.unwrap();

        assert_eq!(report.entries.len(), 2);
        assert!(report.entries[0].passed());
        assert!(matches!(
            report.entries[1].outcome,
            EntryOutcome::ActivationTimedOut { .. },
        ));

        let events = events(&journal);
        assert!(events.contains(&"client_cleanup:vA:force=false".to_string()));
        assert!(events.contains(&"client_cleanup:vB:force=false".to_string()));
    }

    #[tokio::test]
    async fn test_force_cleanup_suppresses_and_continues() {
        let journal = Journal::default();
        let factory =
            MockFactory::with_modes(journal.clone(), &[("vA", ClientMode::CleanupFails)]);
        let driver = driver(
            &journal,
            factory,
            options(vec![entry("vA"), entry("vB")]).with_force_cleanup(true),
        );

        let report = driver.run().await.unwrap();

        // vA's cleanup error is swallowed and doesn't fail the entry
        assert!(report.entries[0].passed());
        assert!(matches!(
            report.entries[0].cleanup,
            CleanupOutcome::Suppressed { .. },
        ));
        // vB still ran, fully
        assert!(report.entries[1].passed());
        assert!(events(&journal).contains(&"client_cleanup:vB:force=true".to_string()));
    }

    #[tokio::test]
    async fn test_unforced_cleanup_failure_fails_entry_but_not_run() {
        let journal = Journal::default();
        let factory =
            MockFactory::with_modes(journal.clone(), &[("vA", ClientMode::CleanupFails)]);
        let driver = driver(&journal, factory, options(vec![entry("vA"), entry("vB")]));

        let report = driver.run().await.unwrap();

        assert!(!report.entries[0].passed());
        assert_eq!(report.entries[0].outcome, EntryOutcome::Passed);
        assert!(matches!(
            report.entries[0].cleanup,
            CleanupOutcome::Failed { .. },
        ));
        // the next entry still ran
        assert!(report.entries[1].passed());
        assert!(!report.passed());
    }

    #[tokio::test]
    async fn test_fresh_runner_per_entry_reuses_namespace() {
        let journal = Journal::default();
        let factory = MockFactory::healthy(journal.clone());
        let driver = driver(&journal, factory, options(vec![entry("vA"), entry("vB")]));

        driver.run().await.unwrap();

        let events = events(&journal);
        // one runner per entry: the first creates the namespace, the second
        // reuses it.
        assert!(events.contains(&"new_runner:vA:reuse=false".to_string()));
        assert!(events.contains(&"new_runner:vB:reuse=true".to_string()));
    }
}
