//! End-to-end tests for the scoring pipeline

use credit_risk_scoring::config::{AppConfig, CategoricalEncoding, ScalingRange, ScoringConfig};
use credit_risk_scoring::feature_deriver::FeatureDeriver;
use credit_risk_scoring::{
    ApplicantProfile, Classifier, CreditRiskScorer, FeatureVector, LoanPurpose, LoanType,
    ResidenceType, ScoringError,
};
use std::sync::Arc;

fn applicant() -> ApplicantProfile {
    ApplicantProfile {
        age: 28,
        annual_income: 1_200_000.0,
        loan_amount: 2_560_000.0,
        loan_tenure_months: 36,
        avg_days_past_due: 20,
        delinquency_ratio_pct: 30,
        credit_utilization_pct: 30,
        num_open_accounts: 2,
        residence_type: ResidenceType::Owned,
        loan_purpose: LoanPurpose::Home,
        loan_type: LoanType::Secured,
    }
}

fn one_hot_names() -> Vec<String> {
    FeatureDeriver::layout_for(CategoricalEncoding::OneHot)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Returns the same probability for everyone
struct FixedProbability {
    probability: f64,
    features: Vec<String>,
}

impl FixedProbability {
    fn scorer(probability: f64) -> CreditRiskScorer {
        let classifier = Arc::new(Self {
            probability,
            features: one_hot_names(),
        });
        CreditRiskScorer::new(&ScoringConfig::default(), classifier).unwrap()
    }
}

impl Classifier for FixedProbability {
    fn name(&self) -> &str {
        "fixed"
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn infer(&self, _features: &FeatureVector) -> Result<f64, ScoringError> {
        Ok(self.probability)
    }
}

/// Artifact that could not be reached
struct Unavailable(Vec<String>);

impl Classifier for Unavailable {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn feature_names(&self) -> &[String] {
        &self.0
    }

    fn infer(&self, _features: &FeatureVector) -> Result<f64, ScoringError> {
        Err(ScoringError::InferenceUnavailable("artifact not loaded".to_string()))
    }
}

fn default_scorer() -> CreditRiskScorer {
    CreditRiskScorer::from_config(&AppConfig::default()).unwrap()
}

#[test]
fn test_end_to_end_scenario() {
    let scorer = default_scorer();
    let profile = applicant();

    let features = scorer.derive_features(&profile).unwrap();
    assert!((features.loan_to_income_ratio() - 2.133_333).abs() < 1e-6);

    let result = scorer.predict(&profile).unwrap();
    assert!((0.0..=1.0).contains(&result.probability));
    assert_eq!(result.credit_score, scorer.transformer().credit_score(result.probability));
    assert_eq!(result.rating, scorer.transformer().rating(result.probability).label);
    assert_eq!(result.rating, "Low Risk");
    assert!((800..=840).contains(&result.credit_score));
}

#[test]
fn test_predict_is_deterministic() {
    let scorer = default_scorer();
    let profile = applicant();

    let first = scorer.predict(&profile).unwrap();
    for _ in 0..100 {
        assert_eq!(scorer.predict(&profile).unwrap(), first);
    }
}

#[test]
fn test_concurrent_predictions_agree() {
    let scorer = default_scorer();
    let expected = scorer.predict(&applicant()).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let scorer = scorer.clone();
                scope.spawn(move || {
                    (0..200)
                        .map(|_| scorer.predict(&applicant()).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for result in handle.join().unwrap() {
                assert_eq!(result, expected);
            }
        }
    });
}

#[test]
fn test_zero_income_ratio_policy() {
    let scorer = default_scorer();
    let mut profile = applicant();
    profile.annual_income = 0.0;

    for loan_amount in [0.0, 50_000.0, 2_560_000.0] {
        profile.loan_amount = loan_amount;
        let features = scorer.derive_features(&profile).unwrap();
        assert_eq!(features.loan_to_income_ratio(), 0.0);
        assert!(scorer.predict(&profile).is_ok());
    }
}

#[test]
fn test_score_monotonic_in_probability() {
    let profile = applicant();
    let mut previous = u32::MAX;

    for i in 0..=100 {
        let p = i as f64 / 100.0;
        let result = FixedProbability::scorer(p).predict(&profile).unwrap();
        assert!(result.credit_score <= previous, "score rose at p={p}");
        previous = result.credit_score;
    }
}

#[test]
fn test_rating_band_boundaries() {
    let profile = applicant();
    let rating = |p: f64| FixedProbability::scorer(p).predict(&profile).unwrap().rating;

    assert_eq!(rating(0.0), "Low Risk");
    assert_eq!(rating(0.19), "Low Risk");
    assert_eq!(rating(0.2), "Moderate Risk");
    assert_eq!(rating(0.49), "Moderate Risk");
    assert_eq!(rating(0.5), "High Risk");
    assert_eq!(rating(1.0), "High Risk");
}

#[test]
fn test_probability_half_is_high_risk() {
    let result = FixedProbability::scorer(0.5).predict(&applicant()).unwrap();
    assert_eq!(result.rating, "High Risk");
    assert_eq!(result.credit_score, 600);
    assert_eq!(result.advice, "Applicant likely to default.");
}

#[test]
fn test_input_validation_boundaries() {
    let scorer = default_scorer();

    let mut profile = applicant();
    profile.age = 17;
    let err = scorer.predict(&profile).unwrap_err();
    assert!(matches!(err, ScoringError::InvalidInput { field: "age", .. }));

    for age in [18, 100] {
        profile.age = age;
        assert!(scorer.predict(&profile).is_ok(), "age {age}");
    }

    let mut profile = applicant();
    profile.delinquency_ratio_pct = 101;
    let err = scorer.predict(&profile).unwrap_err();
    assert_eq!(err.field(), Some("delinquency_ratio_pct"));

    profile.delinquency_ratio_pct = 100;
    assert!(scorer.predict(&profile).is_ok());
}

#[test]
fn test_predict_fields_entry_point() {
    let scorer = default_scorer();
    let result = scorer
        .predict_fields(
            28,
            1_200_000.0,
            2_560_000.0,
            36,
            20,
            30,
            30,
            2,
            "Owned",
            "Home",
            "Secured",
        )
        .unwrap();
    assert_eq!(result, scorer.predict(&applicant()).unwrap());

    let err = scorer
        .predict_fields(28, -5.0, 1.0, 36, 20, 30, 30, 2, "Owned", "Home", "Secured")
        .unwrap_err();
    assert_eq!(err.field(), Some("annual_income"));
}

#[test]
fn test_schema_mismatch_is_fatal() {
    let mut features = one_hot_names();
    features.swap(0, 1);
    let classifier = Arc::new(FixedProbability {
        probability: 0.1,
        features,
    });

    let err = match CreditRiskScorer::new(&ScoringConfig::default(), classifier) {
        Ok(_) => panic!("reordered features must be rejected"),
        Err(err) => err,
    };
    assert!(matches!(
        err.downcast_ref::<ScoringError>(),
        Some(ScoringError::FeatureSchemaMismatch(_))
    ));
}

#[test]
fn test_inference_failure_propagates() {
    let classifier = Arc::new(Unavailable(one_hot_names()));
    let scorer = CreditRiskScorer::new(&ScoringConfig::default(), classifier).unwrap();

    let err = scorer.predict(&applicant()).unwrap_err();
    assert_eq!(
        err,
        ScoringError::InferenceUnavailable("artifact not loaded".to_string())
    );
}

#[test]
fn test_out_of_range_probability_rejected() {
    let err = FixedProbability::scorer(1.2).predict(&applicant()).unwrap_err();
    assert_eq!(err, ScoringError::InvalidProbability(1.2));
}

#[test]
fn test_shipped_config_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/config.toml");
    let shipped = AppConfig::load_from_path(path).unwrap();

    let from_file = CreditRiskScorer::from_config(&shipped).unwrap();
    let built_in = default_scorer();

    assert_eq!(
        from_file.predict(&applicant()).unwrap(),
        built_in.predict(&applicant()).unwrap()
    );
    assert_eq!(from_file.calibration_version(), built_in.calibration_version());
    assert_eq!(shipped.scoring.rating.bands, ScoringConfig::default().rating.bands);
}

#[test]
fn test_degenerate_calibration_rejected_at_construction() {
    let mut config = ScoringConfig::default();
    config.features.scaling[0] = ScalingRange::new("age", 28.0, 28.0);
    let classifier = Arc::new(FixedProbability {
        probability: 0.1,
        features: one_hot_names(),
    });

    let err = match CreditRiskScorer::new(&config, classifier) {
        Ok(_) => panic!("a zero-width scaling range must be rejected"),
        Err(err) => err,
    };
    assert!(matches!(
        err.downcast_ref::<ScoringError>(),
        Some(ScoringError::FeatureSchemaMismatch(_))
    ));
}
