//! Error taxonomy for the scoring pipeline

use thiserror::Error;

/// Errors surfaced by a scoring request.
///
/// Every variant is returned to the caller as-is. The pipeline never retries
/// and never produces a partial [`ScoreResult`](crate::types::ScoreResult).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// An applicant attribute is outside its domain.
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The derived features do not line up with what the classifier was fitted on.
    #[error("feature schema mismatch: {0}")]
    FeatureSchemaMismatch(String),

    /// The classifier could not be loaded or could not run.
    #[error("inference unavailable: {0}")]
    InferenceUnavailable(String),

    /// The classifier returned something that is not a probability.
    #[error("classifier returned invalid probability {0}")]
    InvalidProbability(f64),
}

impl ScoringError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ScoringError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Stable label used in metrics and error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::InvalidInput { .. } => "invalid_input",
            ScoringError::FeatureSchemaMismatch(_) => "feature_schema_mismatch",
            ScoringError::InferenceUnavailable(_) => "inference_unavailable",
            ScoringError::InvalidProbability(_) => "invalid_probability",
        }
    }

    /// Field named by an `InvalidInput` error
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ScoringError::InvalidInput { field, .. } => Some(field),
            _ => None,
        }
    }
}
