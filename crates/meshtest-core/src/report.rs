use std::time::Duration;

use meshtest_api::MatrixEntry;
use serde::Serialize;

use crate::topology::SetupStep;

/// The recorded result of one shared setup step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepReport {
    pub step: SetupStep,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub(crate) fn ok(step: SetupStep) -> Self {
        Self { step, error: None }
    }

    pub(crate) fn failed(step: SetupStep, error: impl std::fmt::Display) -> Self {
        Self {
            step,
            error: Some(error.to_string()),
        }
    }

    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// How one matrix entry went.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// The client went active and both assertions held.
    Passed,

    /// The client never came up: deployment failed, the activation wait
    /// errored, or a probe call hit an infrastructure error. Assertions were
    /// skipped, not failed.
    BringUpFailed { message: String },

    /// The client deployed but never reported an active channel within the
    /// bound. Its own category: nothing definite was observed.
    ActivationTimedOut { waited: Duration },

    /// The client went active but a probe observed a definite negative.
    AssertionsFailed {
        config_present: bool,
        rpcs_received: bool,
    },
}

impl EntryOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, EntryOutcome::Passed)
    }
}

/// How the entry's client teardown went. Cleanup runs for every entry, no
/// matter how the entry itself went.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "cleanup", rename_all = "snake_case")]
pub enum CleanupOutcome {
    Clean,

    /// Cleanup errored but force-cleanup was on, so the error was logged and
    /// swallowed. Doesn't fail the entry.
    Suppressed { message: String },

    /// Cleanup errored with force-cleanup off. Fails the entry, but not the
    /// entries after it.
    Failed { message: String },
}

impl CleanupOutcome {
    pub fn failed(&self) -> bool {
        matches!(self, CleanupOutcome::Failed { .. })
    }
}

/// The full record for one matrix entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntryReport {
    pub entry: MatrixEntry,

    #[serde(flatten)]
    pub outcome: EntryOutcome,

    #[serde(flatten)]
    pub cleanup: CleanupOutcome,
}

impl EntryReport {
    pub fn passed(&self) -> bool {
        self.outcome.passed() && !self.cleanup.failed()
    }
}

/// Everything a run did, in execution order: one result per setup step, one
/// per matrix entry, and any errors from end-of-run teardown.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
    pub entries: Vec<EntryReport>,

    /// Errors from best-effort teardown of the shared fixture. Logged and
    /// recorded, never fatal.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub teardown_errors: Vec<String>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepReport::passed) && self.entries.iter().all(EntryReport::passed)
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for step in &self.steps {
            match &step.error {
                None => writeln!(f, "setup {}: ok", step.step)?,
                Some(e) => writeln!(f, "setup {}: FAILED: {e}", step.step)?,
            }
        }

        for report in &self.entries {
            match &report.outcome {
                EntryOutcome::Passed => write!(f, "{}: passed", report.entry)?,
                EntryOutcome::BringUpFailed { message } => {
                    write!(f, "{}: bring-up failed: {message}", report.entry)?
                }
                EntryOutcome::ActivationTimedOut { waited } => write!(
                    f,
                    "{}: no active channel after {waited:?}, assertions skipped",
                    report.entry,
                )?,
                EntryOutcome::AssertionsFailed {
                    config_present,
                    rpcs_received,
                } => write!(
                    f,
                    "{}: assertions failed (config_present={config_present}, rpcs_received={rpcs_received})",
                    report.entry,
                )?,
            }

            match &report.cleanup {
                CleanupOutcome::Clean => writeln!(f)?,
                CleanupOutcome::Suppressed { message } => {
                    writeln!(f, " (cleanup suppressed: {message})")?
                }
                CleanupOutcome::Failed { message } => {
                    writeln!(f, " (cleanup FAILED: {message})")?
                }
            }
        }

        for error in &self.teardown_errors {
            writeln!(f, "teardown: {error}")?;
        }

        Ok(())
    }
}
