//! Classifier loader

use crate::config::{ModelBackend, ModelConfig, OnnxConfig};
use crate::error::ScoringError;
use crate::models::classifier::Classifier;
use crate::models::logistic::LogisticClassifier;
use crate::models::onnx::OnnxClassifier;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Builds the configured classifier once at startup
pub struct ModelLoader;

impl ModelLoader {
    /// Load the classifier selected by `config.backend`
    pub fn load(config: &ModelConfig) -> Result<Arc<dyn Classifier>> {
        let name = format!("{:?}-{}", config.backend, config.version).to_lowercase();

        let classifier: Arc<dyn Classifier> = match config.backend {
            ModelBackend::Logistic => {
                let logistic = config
                    .logistic
                    .as_ref()
                    .context("[model.logistic] is required for the logistic backend")?;
                info!(
                    model = %name,
                    coefficients = logistic.coefficients.len(),
                    "Logistic model loaded from configuration"
                );
                Arc::new(LogisticClassifier::from_config(&name, logistic))
            }
            ModelBackend::Onnx => {
                let onnx = config
                    .onnx
                    .as_ref()
                    .context("[model.onnx] is required for the onnx backend")?;
                Arc::new(Self::load_onnx(&name, onnx)?)
            }
        };

        Ok(classifier)
    }

    /// Load an ONNX artifact from file
    pub fn load_onnx(name: &str, config: &OnnxConfig) -> Result<OnnxClassifier> {
        let path = Path::new(&config.path);

        info!(model = %name, path = %path.display(), threads = config.threads, "Loading ONNX model");

        if !path.exists() {
            return Err(ScoringError::InferenceUnavailable(format!(
                "model file not found: {}",
                path.display()
            ))
            .into());
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.threads)?
            .commit_from_file(path)
            .map_err(|e| {
                ScoringError::InferenceUnavailable(format!(
                    "failed to load model from {}: {}",
                    path.display(),
                    e
                ))
            })?;

        // Get input/output names
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            features = config.features.len(),
            "Model loaded successfully"
        );

        Ok(OnnxClassifier::new(
            name,
            session,
            input_name,
            output_name,
            config.features.clone(),
        ))
    }
}
