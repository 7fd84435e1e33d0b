//! Configuration management for the credit risk scoring service

use crate::types::score::RatingBand;
use anyhow::{bail, Context, Result};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Which classifier implementation backs inference
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// Logistic regression evaluated from configured coefficients
    #[default]
    Logistic,
    /// ONNX artifact executed with ONNX Runtime
    Onnx,
}

/// Categorical encoding the classifier was fitted with
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalEncoding {
    /// One indicator column per non-baseline category
    #[default]
    OneHot,
    /// One integer code column per attribute
    Ordinal,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    pub scoring: ScoringConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming applicant profiles
    pub request_subject: String,
    /// Subject every score response is also published on
    pub result_subject: String,
    /// Queue group shared by service instances so each request is scored once
    #[serde(default)]
    pub queue_group: Option<String>,
}

/// Trained classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub backend: ModelBackend,
    /// Version tag of the trained artifact
    pub version: String,
    #[serde(default)]
    pub logistic: Option<LogisticConfig>,
    #[serde(default)]
    pub onnx: Option<OnnxConfig>,
}

/// Fitted logistic regression parameters
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticConfig {
    pub intercept: f64,
    /// Coefficients in the feature order the model was fitted on
    pub coefficients: Vec<Coefficient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Coefficient {
    pub feature: String,
    pub weight: f64,
}

/// ONNX artifact location and the feature order it expects
#[derive(Debug, Clone, Deserialize)]
pub struct OnnxConfig {
    pub path: String,
    /// Number of intra-op threads for the session (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub threads: usize,
    pub features: Vec<String>,
}

fn default_onnx_threads() -> usize {
    1
}

/// Calibration shared by the feature deriver and score transformer
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Version tag of this calibration
    pub version: String,
    pub features: FeatureConfig,
    pub score: ScoreConfig,
    pub rating: RatingConfig,
}

/// Feature encoding and training-time scaling statistics
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub encoding: CategoricalEncoding,
    #[serde(default)]
    pub scaling: Vec<ScalingRange>,
}

/// Min-max range observed for one feature at training time
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScalingRange {
    pub feature: String,
    pub min: f64,
    pub max: f64,
}

impl ScalingRange {
    pub fn new(feature: &str, min: f64, max: f64) -> Self {
        Self {
            feature: feature.to_string(),
            min,
            max,
        }
    }
}

/// Credit score range
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreConfig {
    pub min_score: u32,
    pub max_score: u32,
}

/// Probability bands mapped to rating labels
#[derive(Debug, Clone, Deserialize)]
pub struct RatingConfig {
    pub bands: Vec<RatingBand>,
}

/// Serving configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum requests scored concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        Self::finish(config)
    }

    /// Load configuration from TOML text
    pub fn load_from_str(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .context("Failed to build configuration")?;

        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self> {
        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app.validate()?;
        Ok(app)
    }

    /// Check cross-field constraints that deserialization cannot express
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.workers == 0 {
            bail!("pipeline.workers must be at least 1");
        }
        if matches!(self.nats.queue_group.as_deref(), Some(group) if group.trim().is_empty()) {
            bail!("nats.queue_group must not be empty when set");
        }
        match self.model.backend {
            ModelBackend::Logistic if self.model.logistic.is_none() => {
                bail!("model.backend is \"logistic\" but [model.logistic] is missing")
            }
            ModelBackend::Onnx if self.model.onnx.is_none() => {
                bail!("model.backend is \"onnx\" but [model.onnx] is missing")
            }
            _ => {}
        }
        self.scoring.validate().context("Invalid scoring calibration")
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.score.validate()?;
        self.rating.validate()
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        for (i, range) in self.scaling.iter().enumerate() {
            if !(range.min.is_finite() && range.max.is_finite()) || range.max <= range.min {
                bail!(
                    "scaling range for {} must satisfy min < max, got [{}, {}]",
                    range.feature,
                    range.min,
                    range.max
                );
            }
            if self.scaling[..i].iter().any(|r| r.feature == range.feature) {
                bail!("scaling range for {} is declared twice", range.feature);
            }
        }
        Ok(())
    }
}

impl ScoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_score >= self.max_score {
            bail!(
                "score range must satisfy min_score < max_score, got [{}, {}]",
                self.min_score,
                self.max_score
            );
        }
        Ok(())
    }
}

impl RatingConfig {
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.bands.first() else {
            bail!("at least one rating band is required");
        };
        if first.lower != 0.0 {
            bail!("first rating band must start at 0.0, got {}", first.lower);
        }
        for pair in self.bands.windows(2) {
            if !(pair[1].lower > pair[0].lower) {
                bail!(
                    "rating band lower bounds must be strictly increasing ({} then {})",
                    pair[0].lower,
                    pair[1].lower
                );
            }
        }
        for band in &self.bands {
            if !(0.0..1.0).contains(&band.lower) {
                bail!("rating band {} lower bound {} is outside [0, 1)", band.label, band.lower);
            }
            if band.label.trim().is_empty() {
                bail!("rating band starting at {} has an empty label", band.lower);
            }
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            version: "calibration-2024.1".to_string(),
            features: FeatureConfig {
                encoding: CategoricalEncoding::OneHot,
                scaling: vec![
                    ScalingRange::new("age", 18.0, 70.0),
                    ScalingRange::new("annual_income", 0.0, 5_000_000.0),
                    ScalingRange::new("loan_amount", 0.0, 10_000_000.0),
                    ScalingRange::new("loan_tenure_months", 6.0, 60.0),
                    ScalingRange::new("avg_days_past_due", 0.0, 40.0),
                    ScalingRange::new("delinquency_ratio", 0.0, 100.0),
                    ScalingRange::new("credit_utilization_ratio", 0.0, 100.0),
                    ScalingRange::new("num_open_accounts", 1.0, 4.0),
                    ScalingRange::new("loan_to_income_ratio", 0.0, 5.0),
                ],
            },
            score: ScoreConfig {
                min_score: 300,
                max_score: 900,
            },
            rating: RatingConfig {
                bands: vec![
                    RatingBand::new(0.0, "Low Risk", "Applicant shows strong repayment ability."),
                    RatingBand::new(
                        0.2,
                        "Moderate Risk",
                        "Applicant may require additional verification.",
                    ),
                    RatingBand::new(0.5, "High Risk", "Applicant likely to default."),
                ],
            },
        }
    }
}

fn default_coefficients() -> Vec<Coefficient> {
    [
        ("age", -1.2),
        ("annual_income", -0.8),
        ("loan_amount", 0.6),
        ("loan_tenure_months", 0.9),
        ("avg_days_past_due", 2.4),
        ("delinquency_ratio", 3.6),
        ("credit_utilization_ratio", 2.8),
        ("num_open_accounts", 0.7),
        ("loan_to_income_ratio", 4.0),
        ("residence_type_owned", -0.5),
        ("residence_type_rented", 0.4),
        ("loan_purpose_education", 0.3),
        ("loan_purpose_home", -0.2),
        ("loan_purpose_personal", 0.6),
        ("loan_type_unsecured", 0.5),
    ]
    .into_iter()
    .map(|(feature, weight)| Coefficient {
        feature: feature.to_string(),
        weight,
    })
    .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "credit.applications".to_string(),
                result_subject: "credit.scores".to_string(),
                queue_group: Some("credit-scorers".to_string()),
            },
            model: ModelConfig {
                backend: ModelBackend::Logistic,
                version: "credit-lr-2024.1".to_string(),
                logistic: Some(LogisticConfig {
                    intercept: -6.5,
                    coefficients: default_coefficients(),
                }),
                onnx: None,
            },
            scoring: ScoringConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
