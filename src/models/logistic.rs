//! Logistic regression evaluated from fitted coefficients

use crate::config::LogisticConfig;
use crate::error::ScoringError;
use crate::feature_deriver::FeatureVector;
use crate::models::classifier::Classifier;

/// Logistic regression classifier.
///
/// `p = 1 / (1 + e^-(intercept + w·x))`, with `w` ordered as the features
/// the model was fitted on.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    name: String,
    intercept: f64,
    feature_names: Vec<String>,
    weights: Vec<f64>,
}

impl LogisticClassifier {
    pub fn new(name: &str, intercept: f64, coefficients: Vec<(String, f64)>) -> Self {
        let (feature_names, weights) = coefficients.into_iter().unzip();
        Self {
            name: name.to_string(),
            intercept,
            feature_names,
            weights,
        }
    }

    pub fn from_config(name: &str, config: &LogisticConfig) -> Self {
        Self::new(
            name,
            config.intercept,
            config
                .coefficients
                .iter()
                .map(|c| (c.feature.clone(), c.weight))
                .collect(),
        )
    }

    /// Linear predictor `intercept + w·x`
    pub fn logit(&self, values: &[f64]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(values)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn infer(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        if features.len() != self.weights.len() {
            return Err(ScoringError::FeatureSchemaMismatch(format!(
                "{} has {} coefficients, received {} features",
                self.name,
                self.weights.len(),
                features.len()
            )));
        }

        Ok(sigmoid(self.logit(features.values())))
    }
}
