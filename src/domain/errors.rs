use thiserror::Error;

/// Errors surfaced by the serving core.
///
/// Variants map to distinct caller semantics: `Input` is user-correctable,
/// `ModelNotFound` means the requested combination has no trained artifact,
/// `Unavailable` is a deployment problem, `Prediction` is a runtime
/// inference failure.
#[derive(Debug, Error)]
pub enum ServingError {
    #[error("invalid input: {reason}")]
    Input { reason: String },

    #[error("no trained model for {market}-{crop}")]
    ModelNotFound { market: String, crop: String },

    #[error("required artifact unavailable: {artifact}")]
    Unavailable { artifact: String },

    #[error("inference failed after {attempts} attempt(s): {reason}")]
    Prediction { attempts: usize, reason: String },
}

impl ServingError {
    pub fn input(reason: impl Into<String>) -> Self {
        Self::Input {
            reason: reason.into(),
        }
    }

    pub fn unavailable(artifact: impl Into<String>) -> Self {
        Self::Unavailable {
            artifact: artifact.into(),
        }
    }

    /// Stable discriminant used in error payloads and for status mapping
    /// by the transport layer.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input { .. } => "input_error",
            Self::ModelNotFound { .. } => "not_found",
            Self::Unavailable { .. } => "unavailable",
            Self::Prediction { .. } => "prediction_error",
        }
    }
}
