/// Convenience result type used across clipreel.
pub type ClipreelResult<T> = Result<T, ClipreelError>;

/// Top-level error taxonomy used by planner, render and audio APIs.
#[derive(thiserror::Error, Debug)]
pub enum ClipreelError {
    /// Invalid user-provided configuration or clip data. Aborts the whole render.
    #[error("validation error: {0}")]
    Validation(String),

    /// Runtime failure of a subprocess, device or stream.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing config documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// The render was cancelled through a [`crate::CancelFlag`].
    #[error("render cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClipreelError {
    /// Build a [`ClipreelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ClipreelError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ClipreelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for configuration errors raised before or during planning.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
