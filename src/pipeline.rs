//! Credit risk scoring entry point

use crate::config::{AppConfig, ScoringConfig};
use crate::error::ScoringError;
use crate::feature_deriver::{FeatureDeriver, FeatureVector};
use crate::models::classifier::{schema_mismatch, Classifier};
use crate::models::loader::ModelLoader;
use crate::score_transformer::ScoreTransformer;
use crate::types::applicant::{ApplicantProfile, LoanPurpose, LoanType, ResidenceType};
use crate::types::score::ScoreResult;
use anyhow::Result;
use std::sync::Arc;

/// Scores applicants end to end: derive features, infer, transform.
///
/// Cheap to clone; clones share the same loaded classifier.
#[derive(Clone)]
pub struct CreditRiskScorer {
    deriver: FeatureDeriver,
    classifier: Arc<dyn Classifier>,
    transformer: ScoreTransformer,
    calibration_version: String,
}

impl CreditRiskScorer {
    /// Assemble a scorer around an already loaded classifier.
    ///
    /// Fails with [`ScoringError::FeatureSchemaMismatch`] when the derived
    /// layout is not exactly what the classifier was fitted on.
    pub fn new(config: &ScoringConfig, classifier: Arc<dyn Classifier>) -> Result<Self> {
        let deriver = FeatureDeriver::new(&config.features)?;
        let transformer = ScoreTransformer::new(&config.score, &config.rating)?;

        if let Some(detail) = schema_mismatch(classifier.as_ref(), &deriver.feature_names()) {
            return Err(ScoringError::FeatureSchemaMismatch(detail).into());
        }

        Ok(Self {
            deriver,
            classifier,
            transformer,
            calibration_version: config.version.clone(),
        })
    }

    /// Load the configured classifier and assemble a scorer
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let classifier = ModelLoader::load(&config.model)?;
        Self::new(&config.scoring, classifier)
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn transformer(&self) -> &ScoreTransformer {
        &self.transformer
    }

    pub fn calibration_version(&self) -> &str {
        &self.calibration_version
    }

    /// Feature vector for a profile, as the classifier would receive it
    pub fn derive_features(&self, profile: &ApplicantProfile) -> Result<FeatureVector, ScoringError> {
        self.deriver.derive(profile)
    }

    /// Assess one applicant.
    ///
    /// Either all of probability, score and rating are produced, or the
    /// first error is returned.
    pub fn predict(&self, profile: &ApplicantProfile) -> Result<ScoreResult, ScoringError> {
        let features = self.deriver.derive(profile)?;

        if let Some(detail) = schema_mismatch(self.classifier.as_ref(), features.names()) {
            return Err(ScoringError::FeatureSchemaMismatch(detail));
        }

        let probability = self.classifier.infer(&features)?;
        self.transformer.transform(probability)
    }

    /// Assess one applicant from loose fields, parsing the categorical labels
    #[allow(clippy::too_many_arguments)]
    pub fn predict_fields(
        &self,
        age: u32,
        annual_income: f64,
        loan_amount: f64,
        loan_tenure_months: u32,
        avg_days_past_due: u32,
        delinquency_ratio_pct: u32,
        credit_utilization_pct: u32,
        num_open_accounts: u32,
        residence_type: &str,
        loan_purpose: &str,
        loan_type: &str,
    ) -> Result<ScoreResult, ScoringError> {
        let profile = ApplicantProfile {
            age,
            annual_income,
            loan_amount,
            loan_tenure_months,
            avg_days_past_due,
            delinquency_ratio_pct,
            credit_utilization_pct,
            num_open_accounts,
            residence_type: residence_type.parse::<ResidenceType>()?,
            loan_purpose: loan_purpose.parse::<LoanPurpose>()?,
            loan_type: loan_type.parse::<LoanType>()?,
        };

        self.predict(&profile)
    }
}
