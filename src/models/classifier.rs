//! Contract between the pipeline and a trained classifier

use crate::error::ScoringError;
use crate::feature_deriver::FeatureVector;

/// A trained default-risk classifier.
///
/// Implementations are loaded once and shared read-only across concurrent
/// requests. `infer` must be deterministic for a given feature vector and
/// return a calibrated probability of default.
pub trait Classifier: Send + Sync {
    /// Human readable model name
    fn name(&self) -> &str;

    /// Feature names, in the order the artifact was fitted on
    fn feature_names(&self) -> &[String];

    /// Probability of default for one applicant
    fn infer(&self, features: &FeatureVector) -> Result<f64, ScoringError>;
}

/// Describe how `features` differs from what `classifier` expects
pub fn schema_mismatch(classifier: &dyn Classifier, features: &[&str]) -> Option<String> {
    let expected = classifier.feature_names();

    if expected.len() != features.len() {
        return Some(format!(
            "{} expects {} features, derived {}",
            classifier.name(),
            expected.len(),
            features.len()
        ));
    }

    expected
        .iter()
        .zip(features)
        .enumerate()
        .find(|(_, (want, have))| want.as_str() != **have)
        .map(|(position, (want, have))| {
            format!(
                "{} expects {:?} at position {}, derived {:?}",
                classifier.name(),
                want,
                position,
                have
            )
        })
}
