use std::time::Duration;

use crate::topology::SetupStep;

/// The error type collaborators return from their trait methods.
///
/// Provisioners and runners live outside this crate and keep their own error
/// types; the driver only ever logs or wraps them.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A `Result` alias where the `Err` case is `meshtest_core::Error`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A shared setup step failed. Fatal: no matrix entries run, and the
    /// whole run is reported failed at this step's boundary. `completed`
    /// names the steps that succeeded before the failure, so a failure at
    /// step N never obscures that steps 1..N-1 went through.
    #[error("setup failed at {step} (completed: {})", format_steps(.completed))]
    Setup {
        step: SetupStep,
        completed: Vec<SetupStep>,
        #[source]
        source: BoxError,
    },

    /// A client workload failed to deploy or to report an active channel.
    /// Scoped to one matrix entry.
    #[error("client bring-up failed: {0}")]
    BringUp(#[source] BoxError),

    /// The bounded wait for an active channel ran out. Distinct from both
    /// bring-up errors and assertion failures: nothing definite was
    /// observed, the client just never got there in time.
    #[error("no active channel after {waited:?}")]
    DeadlineExceeded { waited: Duration },

    #[error(transparent)]
    Transport(#[from] tonic::transport::Error),

    #[error("CSDS fetch failed: {0}")]
    Status(#[from] tonic::Status),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::DeadlineExceeded { .. })
    }
}

fn format_steps(steps: &[SetupStep]) -> String {
    let names: Vec<_> = steps.iter().map(|s| s.name()).collect();
    names.join(", ")
}
