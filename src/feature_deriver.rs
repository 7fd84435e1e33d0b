//! Feature derivation for credit risk model inference.
//!
//! Turns an [`ApplicantProfile`] into the exact numeric vector the trained
//! classifier expects: derived ratios, categorical encoding and min-max
//! scaling with statistics captured at training time.

use crate::config::{CategoricalEncoding, FeatureConfig, ScalingRange};
use crate::error::ScoringError;
use crate::types::applicant::{ApplicantProfile, LoanPurpose, LoanType, ResidenceType};

pub const LOAN_TO_INCOME_RATIO: &str = "loan_to_income_ratio";

/// Numeric features, in model order. Shared by every encoding.
pub const NUMERIC_FEATURES: [&str; 9] = [
    "age",
    "annual_income",
    "loan_amount",
    "loan_tenure_months",
    "avg_days_past_due",
    "delinquency_ratio",
    "credit_utilization_ratio",
    "num_open_accounts",
    LOAN_TO_INCOME_RATIO,
];

/// Indicator columns for one-hot encoding.
/// Mortgage, Auto and Secured are the dropped baselines.
pub const ONE_HOT_FEATURES: [&str; 6] = [
    "residence_type_owned",
    "residence_type_rented",
    "loan_purpose_education",
    "loan_purpose_home",
    "loan_purpose_personal",
    "loan_type_unsecured",
];

/// Code columns for ordinal encoding
pub const ORDINAL_FEATURES: [&str; 3] = ["residence_type", "loan_purpose", "loan_type"];

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

fn residence_code(value: ResidenceType) -> f64 {
    match value {
        ResidenceType::Owned => 0.0,
        ResidenceType::Rented => 1.0,
        ResidenceType::Mortgage => 2.0,
    }
}

fn purpose_code(value: LoanPurpose) -> f64 {
    match value {
        LoanPurpose::Education => 0.0,
        LoanPurpose::Home => 1.0,
        LoanPurpose::Auto => 2.0,
        LoanPurpose::Personal => 3.0,
    }
}

fn loan_type_code(value: LoanType) -> f64 {
    match value {
        LoanType::Unsecured => 0.0,
        LoanType::Secured => 1.0,
    }
}

/// Ordered, named feature values handed to the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<&'static str>,
    values: Vec<f64>,
    loan_to_income_ratio: f64,
}

impl FeatureVector {
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature as the classifier sees it (after scaling)
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    /// Unscaled loan amount to annual income ratio
    pub fn loan_to_income_ratio(&self) -> f64 {
        self.loan_to_income_ratio
    }

    /// Single-precision copy for tensor backends
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }

    /// Whether the layout equals `expected`, name for name
    pub fn matches_schema<S: AsRef<str>>(&self, expected: &[S]) -> bool {
        self.names.len() == expected.len()
            && self
                .names
                .iter()
                .zip(expected)
                .all(|(have, want)| *have == want.as_ref())
    }
}

/// Derives model features from applicant profiles.
///
/// Holds only immutable calibration, so one instance can serve any number of
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct FeatureDeriver {
    encoding: CategoricalEncoding,
    /// Range per layout position, resolved once at construction
    scaling: Vec<Option<ScalingRange>>,
}

impl FeatureDeriver {
    /// Build a deriver from calibration.
    ///
    /// Fails when a scaling range names a feature the configured encoding
    /// does not produce.
    pub fn new(config: &FeatureConfig) -> Result<Self, ScoringError> {
        config
            .validate()
            .map_err(|e| ScoringError::FeatureSchemaMismatch(e.to_string()))?;

        let layout = Self::layout_for(config.encoding);

        if let Some(unknown) = config
            .scaling
            .iter()
            .find(|range| !layout.iter().any(|name| *name == range.feature))
        {
            return Err(ScoringError::FeatureSchemaMismatch(format!(
                "scaling range configured for unknown feature {:?} under {:?} encoding",
                unknown.feature, config.encoding
            )));
        }

        let scaling = layout
            .iter()
            .map(|name| {
                config
                    .scaling
                    .iter()
                    .find(|range| range.feature == *name)
                    .cloned()
            })
            .collect();

        Ok(Self {
            encoding: config.encoding,
            scaling,
        })
    }

    /// Feature names produced under an encoding, in model order
    pub fn layout_for(encoding: CategoricalEncoding) -> Vec<&'static str> {
        let categorical: &[&'static str] = match encoding {
            CategoricalEncoding::OneHot => &ONE_HOT_FEATURES,
            CategoricalEncoding::Ordinal => &ORDINAL_FEATURES,
        };
        NUMERIC_FEATURES.iter().chain(categorical).copied().collect()
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        Self::layout_for(self.encoding)
    }

    pub fn feature_count(&self) -> usize {
        self.scaling.len()
    }

    pub fn encoding(&self) -> CategoricalEncoding {
        self.encoding
    }

    /// Validate a profile and derive its feature vector
    pub fn derive(&self, profile: &ApplicantProfile) -> Result<FeatureVector, ScoringError> {
        profile.validate()?;

        let loan_to_income_ratio = safe_ratio(profile.loan_amount, profile.annual_income);

        let mut values = Vec::with_capacity(self.scaling.len());
        values.extend([
            profile.age as f64,
            profile.annual_income,
            profile.loan_amount,
            profile.loan_tenure_months as f64,
            profile.avg_days_past_due as f64,
            profile.delinquency_ratio_pct as f64,
            profile.credit_utilization_pct as f64,
            profile.num_open_accounts as f64,
            loan_to_income_ratio,
        ]);

        match self.encoding {
            CategoricalEncoding::OneHot => values.extend([
                indicator(profile.residence_type == ResidenceType::Owned),
                indicator(profile.residence_type == ResidenceType::Rented),
                indicator(profile.loan_purpose == LoanPurpose::Education),
                indicator(profile.loan_purpose == LoanPurpose::Home),
                indicator(profile.loan_purpose == LoanPurpose::Personal),
                indicator(profile.loan_type == LoanType::Unsecured),
            ]),
            CategoricalEncoding::Ordinal => values.extend([
                residence_code(profile.residence_type),
                purpose_code(profile.loan_purpose),
                loan_type_code(profile.loan_type),
            ]),
        }

        for (value, range) in values.iter_mut().zip(&self.scaling) {
            if let Some(range) = range {
                *value = (*value - range.min) / (range.max - range.min);
            }
        }

        Ok(FeatureVector {
            names: self.feature_names(),
            values,
            loan_to_income_ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::types::applicant::tests::sample_profile;

    fn unscaled(encoding: CategoricalEncoding) -> FeatureDeriver {
        FeatureDeriver::new(&FeatureConfig {
            encoding,
            scaling: Vec::new(),
        })
        .unwrap()
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(10.0, 4.0), 2.5);
        assert_eq!(safe_ratio(10.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_loan_to_income_ratio() {
        let deriver = unscaled(CategoricalEncoding::OneHot);
        let features = deriver.derive(&sample_profile()).unwrap();

        let expected = 2_560_000.0 / 1_200_000.0;
        assert!((features.loan_to_income_ratio() - expected).abs() < 1e-12);
        assert!((features.loan_to_income_ratio() - 2.1333).abs() < 1e-4);
        assert_eq!(features.get(LOAN_TO_INCOME_RATIO), Some(features.loan_to_income_ratio()));
    }

    #[test]
    fn test_zero_income_ratio_is_zero() {
        let deriver = FeatureDeriver::new(&ScoringConfig::default().features).unwrap();
        let mut profile = sample_profile();
        profile.annual_income = 0.0;

        for loan_amount in [0.0, 1.0, 2_560_000.0, 1e12] {
            profile.loan_amount = loan_amount;
            let features = deriver.derive(&profile).unwrap();
            assert_eq!(features.loan_to_income_ratio(), 0.0);
            assert_eq!(features.get(LOAN_TO_INCOME_RATIO), Some(0.0));
        }
    }

    #[test]
    fn test_one_hot_layout() {
        let deriver = unscaled(CategoricalEncoding::OneHot);
        let features = deriver.derive(&sample_profile()).unwrap();

        assert_eq!(features.len(), deriver.feature_count());
        assert_eq!(features.len(), 15);
        assert_eq!(features.values()[0], 28.0);
        assert_eq!(features.get("residence_type_owned"), Some(1.0));
        assert_eq!(features.get("residence_type_rented"), Some(0.0));
        assert_eq!(features.get("loan_purpose_home"), Some(1.0));
        assert_eq!(features.get("loan_purpose_education"), Some(0.0));
        assert_eq!(features.get("loan_type_unsecured"), Some(0.0));
    }

    #[test]
    fn test_baseline_categories_encode_to_zero() {
        let deriver = unscaled(CategoricalEncoding::OneHot);
        let mut profile = sample_profile();
        profile.residence_type = ResidenceType::Mortgage;
        profile.loan_purpose = LoanPurpose::Auto;
        profile.loan_type = LoanType::Secured;

        let features = deriver.derive(&profile).unwrap();
        for name in ONE_HOT_FEATURES {
            assert_eq!(features.get(name), Some(0.0), "{name}");
        }
    }

    #[test]
    fn test_ordinal_layout() {
        let deriver = unscaled(CategoricalEncoding::Ordinal);
        let mut profile = sample_profile();
        profile.residence_type = ResidenceType::Mortgage;
        profile.loan_purpose = LoanPurpose::Personal;
        profile.loan_type = LoanType::Unsecured;

        let features = deriver.derive(&profile).unwrap();
        assert_eq!(features.len(), 12);
        assert_eq!(features.get("residence_type"), Some(2.0));
        assert_eq!(features.get("loan_purpose"), Some(3.0));
        assert_eq!(features.get("loan_type"), Some(0.0));
        assert_eq!(features.get("residence_type_owned"), None);
    }

    #[test]
    fn test_min_max_scaling() {
        let deriver = FeatureDeriver::new(&FeatureConfig {
            encoding: CategoricalEncoding::OneHot,
            scaling: vec![
                ScalingRange::new("age", 18.0, 68.0),
                ScalingRange::new("loan_to_income_ratio", 0.0, 4.0),
            ],
        })
        .unwrap();

        let features = deriver.derive(&sample_profile()).unwrap();
        assert!((features.get("age").unwrap() - 0.2).abs() < 1e-12);
        let expected = (2_560_000.0 / 1_200_000.0) / 4.0;
        assert!((features.get(LOAN_TO_INCOME_RATIO).unwrap() - expected).abs() < 1e-12);
        // unscaled accessor is unaffected
        assert!((features.loan_to_income_ratio() - 2.1333).abs() < 1e-4);
        // features without a range pass through
        assert_eq!(features.get("loan_tenure_months"), Some(36.0));
    }

    #[test]
    fn test_scaling_does_not_clip() {
        let deriver = FeatureDeriver::new(&FeatureConfig {
            encoding: CategoricalEncoding::OneHot,
            scaling: vec![ScalingRange::new("age", 18.0, 68.0)],
        })
        .unwrap();
        let mut profile = sample_profile();
        profile.age = 93;

        let features = deriver.derive(&profile).unwrap();
        assert!((features.get("age").unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_scaling_feature_rejected() {
        let config = FeatureConfig {
            encoding: CategoricalEncoding::Ordinal,
            scaling: vec![ScalingRange::new("residence_type_owned", 0.0, 1.0)],
        };
        let err = FeatureDeriver::new(&config).unwrap_err();
        assert_eq!(err.kind(), "feature_schema_mismatch");
    }

    #[test]
    fn test_degenerate_scaling_range_rejected() {
        for range in [
            ScalingRange::new("age", 28.0, 28.0),
            ScalingRange::new("age", 70.0, 18.0),
            ScalingRange::new("age", 18.0, f64::INFINITY),
        ] {
            let config = FeatureConfig {
                encoding: CategoricalEncoding::OneHot,
                scaling: vec![range.clone()],
            };
            let err = FeatureDeriver::new(&config).unwrap_err();
            assert_eq!(err.kind(), "feature_schema_mismatch", "{range:?}");
        }

        let duplicated = FeatureConfig {
            encoding: CategoricalEncoding::OneHot,
            scaling: vec![
                ScalingRange::new("age", 18.0, 70.0),
                ScalingRange::new("age", 18.0, 80.0),
            ],
        };
        assert!(FeatureDeriver::new(&duplicated).is_err());
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let deriver = unscaled(CategoricalEncoding::OneHot);
        let mut profile = sample_profile();
        profile.age = 17;

        let err = deriver.derive(&profile).unwrap_err();
        assert_eq!(err.field(), Some("age"));
    }

    #[test]
    fn test_matches_schema() {
        let deriver = unscaled(CategoricalEncoding::Ordinal);
        let features = deriver.derive(&sample_profile()).unwrap();

        let expected: Vec<String> = deriver.feature_names().iter().map(|s| s.to_string()).collect();
        assert!(features.matches_schema(&expected));

        let mut reordered = expected.clone();
        reordered.swap(0, 1);
        assert!(!features.matches_schema(&reordered));
        assert!(!features.matches_schema(&expected[..5]));
    }
}
