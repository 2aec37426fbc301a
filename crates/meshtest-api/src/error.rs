use std::borrow::Cow;

/// An error validating a meshtest configuration value.
///
/// Errors should be treated as opaque. They carry a message about what was
/// wrong and, where it helps, the input that caused the problem.
#[derive(Clone, thiserror::Error)]
pub struct Error {
    message: Cow<'static, str>,

    // the input that failed validation, if it's small enough to be worth
    // echoing back.
    input: Option<String>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)?;

        if let Some(input) = &self.input {
            write!(f, ": {input:?}")?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("message", &self.message)
            .field("input", &self.input)
            .finish()
    }
}

impl Error {
    /// Create a new error with a static message.
    pub(crate) fn new_static(message: &'static str) -> Self {
        Self {
            message: Cow::Borrowed(message),
            input: None,
        }
    }

    /// Attach the offending input to this error.
    pub(crate) fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }
}
