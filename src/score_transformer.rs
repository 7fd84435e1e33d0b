//! Mapping from default probability to credit score and risk rating

use crate::config::{RatingConfig, ScoreConfig};
use crate::error::ScoringError;
use crate::types::score::{RatingBand, ScoreResult};
use anyhow::Result;

/// Converts a classifier probability into a bounded score and a rating.
///
/// The score is linear in the probability of repayment:
/// `min_score + (1 - p) * (max_score - min_score)`, rounded to the nearest
/// integer. Ratings come from contiguous probability bands, each closed at
/// its lower bound; the last band is closed at 1.0.
#[derive(Debug, Clone)]
pub struct ScoreTransformer {
    min_score: u32,
    max_score: u32,
    bands: Vec<RatingBand>,
}

impl ScoreTransformer {
    pub fn new(score: &ScoreConfig, rating: &RatingConfig) -> Result<Self> {
        score.validate()?;
        rating.validate()?;

        Ok(Self {
            min_score: score.min_score,
            max_score: score.max_score,
            bands: rating.bands.clone(),
        })
    }

    pub fn score_range(&self) -> (u32, u32) {
        (self.min_score, self.max_score)
    }

    pub fn bands(&self) -> &[RatingBand] {
        &self.bands
    }

    /// Credit score for a probability in [0, 1]
    pub fn credit_score(&self, probability: f64) -> u32 {
        let p = probability.clamp(0.0, 1.0);
        let span = (self.max_score - self.min_score) as f64;
        let score = (self.min_score as f64 + (1.0 - p) * span).round();
        (score as u32).clamp(self.min_score, self.max_score)
    }

    /// Rating band containing a probability in [0, 1]
    pub fn rating(&self, probability: f64) -> &RatingBand {
        // validation guarantees a first band starting at 0.0
        self.bands
            .iter()
            .rev()
            .find(|band| probability >= band.lower)
            .unwrap_or(&self.bands[0])
    }

    /// Score and rate a probability, rejecting values outside [0, 1]
    pub fn transform(&self, probability: f64) -> Result<ScoreResult, ScoringError> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ScoringError::InvalidProbability(probability));
        }

        let band = self.rating(probability);
        Ok(ScoreResult {
            probability,
            credit_score: self.credit_score(probability),
            rating: band.label.clone(),
            advice: band.advice.clone(),
        })
    }
}
