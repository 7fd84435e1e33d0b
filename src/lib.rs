//! Credit Risk Scoring Library
//!
//! Derives model features from a loan applicant's attributes, runs a trained
//! default-risk classifier, and maps the resulting probability to a bounded
//! credit score and a risk rating.

pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_deriver;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod score_transformer;
pub mod types;
pub mod workers;

pub use config::AppConfig;
pub use consumer::ApplicationConsumer;
pub use error::ScoringError;
pub use feature_deriver::{FeatureDeriver, FeatureVector};
pub use models::{Classifier, ModelLoader};
pub use pipeline::CreditRiskScorer;
pub use producer::ResultProducer;
pub use score_transformer::ScoreTransformer;
pub use types::{ApplicantProfile, LoanPurpose, LoanType, ResidenceType, ScoreResponse, ScoreResult};
pub use workers::WorkerLimiter;
