//! ONNX Runtime backed classifier

use crate::error::ScoringError;
use crate::feature_deriver::FeatureVector;
use crate::models::classifier::Classifier;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

/// Classifier wrapping a loaded ONNX session.
///
/// Running a session needs exclusive access, so requests take turns on the
/// mutex. The session itself is never replaced after loading.
pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    feature_names: Vec<String>,
}

impl OnnxClassifier {
    pub fn new(
        name: &str,
        session: Session,
        input_name: String,
        output_name: String,
        feature_names: Vec<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
            feature_names,
        }
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    fn unavailable(&self, what: &str, err: impl std::fmt::Display) -> ScoringError {
        ScoringError::InferenceUnavailable(format!("{}: {}: {}", self.name, what, err))
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn infer(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_f32()))
            .map_err(|e| self.unavailable("failed to create input tensor", e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| self.unavailable("session lock poisoned", e))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| self.unavailable("session run failed", e))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| self.unavailable("missing output", &self.output_name))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| self.unavailable("output is not a float tensor", e))?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        let probability = default_class_probability(&dims, data).ok_or_else(|| {
            self.unavailable("unexpected output shape", format!("{:?}", dims))
        })?;

        debug!(model = %self.name, probability = probability, "Extracted from tensor");
        Ok(probability)
    }
}

/// Probability of the default class from a classifier output tensor.
///
/// Accepts `[batch, classes]`, `[classes]` or a single probability; with two
/// or more classes the default class sits at index 1.
pub fn default_class_probability(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = match dims {
        [_, classes] | [classes] => *classes,
        [] => 1,
        _ => return None,
    };

    let index = if classes >= 2 { 1 } else { 0 };
    data.get(index).map(|&p| p as f64)
}
