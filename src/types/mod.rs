//! Type definitions for the scoring pipeline

pub mod applicant;
pub mod score;

pub use applicant::{ApplicantProfile, LoanPurpose, LoanType, ResidenceType};
pub use score::{Outcome, RatingBand, ScoreResponse, ScoreResult};
