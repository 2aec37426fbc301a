//! The meshtest scenario driver.
//!
//! A run stands up an xDS traffic-management topology (health check through
//! forwarding rule, in dependency order), deploys a test server behind it,
//! and then exercises a matrix of bootstrap-generator versions: for each
//! version, a fresh client workload is deployed with that generator image,
//! waited into an active channel, asserted against (config present, RPCs
//! received), and torn down. Entries are isolated - one bad version can't
//! take down the results for the others - and the shared fixture is cleaned
//! up no matter what.
//!
//! The cloud provisioner, the Kubernetes runners, and the RPC harness live
//! elsewhere; this crate defines the traits it drives them through
//! ([TrafficManager], [ServerRunner], [ClientFactory]) and owns the
//! sequencing, the failure isolation, and the report.

// collaborator traits use `async fn`. they're only ever driven through the
// driver's generics, never boxed, so the auto-trait caveats don't bite.
#![allow(async_fn_in_trait)]

mod error;
pub use error::{BoxError, Error, Result};

mod topology;
pub use topology::{SetupStep, TrafficManager};

mod workload;
pub use workload::{ClientFactory, ClientRunner, ServerRunner, TestClient, TestServer};

mod report;
pub use report::{CleanupOutcome, EntryOutcome, EntryReport, RunReport, StepReport};

mod driver;
pub use driver::{DriverOptions, TestDriver, DEFAULT_ACTIVATION_TIMEOUT};

mod csds;
pub use csds::{acked_configs, generic_configs, has_acked_config, CsdsProbe};
