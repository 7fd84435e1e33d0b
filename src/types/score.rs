//! Score result and response data structures

use crate::error::ScoringError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One contiguous probability band of the rating scale.
///
/// A band covers `[lower, next band's lower)`; the last band extends to 1.0
/// inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingBand {
    /// Inclusive lower probability bound
    pub lower: f64,
    /// Rating label returned to callers
    pub label: String,
    /// Guidance shown alongside the rating
    #[serde(default)]
    pub advice: String,
}

impl RatingBand {
    pub fn new(lower: f64, label: &str, advice: &str) -> Self {
        Self {
            lower,
            label: label.to_string(),
            advice: advice.to_string(),
        }
    }
}

/// Outcome of a successful assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Probability of default (0.0 - 1.0)
    pub probability: f64,
    /// Credit score within the configured range
    pub credit_score: u32,
    /// Risk rating label
    pub rating: String,
    /// Guidance attached to the rating band
    pub advice: String,
}

/// Error details carried in a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl From<&ScoringError> for ErrorBody {
    fn from(err: &ScoringError) -> Self {
        Self {
            kind: err.kind().to_string(),
            field: err.field().map(str::to_string),
            message: err.to_string(),
        }
    }
}

/// Either the score or the reason there is none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Scored(ScoreResult),
    Rejected(ErrorBody),
}

/// Envelope the service sends back for every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// Unique response identifier
    pub request_id: String,
    /// Version of the trained artifact
    pub model_version: String,
    /// Version of the scaling, score range and band configuration
    pub calibration_version: String,
    /// Response generation timestamp
    pub scored_at: DateTime<Utc>,
    pub outcome: Outcome,
}

impl ScoreResponse {
    pub fn new(
        model_version: &str,
        calibration_version: &str,
        result: Result<ScoreResult, ScoringError>,
    ) -> Self {
        let outcome = match result {
            Ok(score) => Outcome::Scored(score),
            Err(err) => Outcome::Rejected(ErrorBody::from(&err)),
        };

        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            model_version: model_version.to_string(),
            calibration_version: calibration_version.to_string(),
            scored_at: Utc::now(),
            outcome,
        }
    }

    pub fn score(&self) -> Option<&ScoreResult> {
        match &self.outcome {
            Outcome::Scored(score) => Some(score),
            Outcome::Rejected(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_response_serialization() {
        let result = ScoreResult {
            probability: 0.12,
            credit_score: 828,
            rating: "Low Risk".to_string(),
            advice: "Applicant shows strong repayment ability.".to_string(),
        };

        let response = ScoreResponse::new("lr-1", "cal-1", Ok(result.clone()));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"scored\""));

        let deserialized: ScoreResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.request_id, response.request_id);
        assert_eq!(deserialized.score(), Some(&result));
    }

    #[test]
    fn test_rejected_response_carries_field() {
        let err = ScoringError::invalid("age", "must be between 18 and 100, got 17");
        let response = ScoreResponse::new("lr-1", "cal-1", Err(err));

        assert!(response.score().is_none());
        match &response.outcome {
            Outcome::Rejected(body) => {
                assert_eq!(body.kind, "invalid_input");
                assert_eq!(body.field.as_deref(), Some("age"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
