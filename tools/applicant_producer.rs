//! Sample Applicant Producer
//!
//! Generates random applicant profiles and sends them to the scoring service
//! as NATS requests, logging each response.

use credit_risk_scoring::{
    ApplicantProfile, AppConfig, CreditRiskScorer, LoanPurpose, LoanType, ResidenceType,
    ScoreResponse,
};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Applicant generator for testing
struct ApplicantGenerator {
    rng: rand::rngs::ThreadRng,
}

impl ApplicantGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate an applicant with a clean repayment history
    fn generate_prime(&mut self) -> ApplicantProfile {
        let annual_income = self.rng.gen_range(600_000.0..4_000_000.0_f64).round();
        ApplicantProfile {
            age: self.rng.gen_range(25..=65),
            annual_income,
            loan_amount: (annual_income * self.rng.gen_range(0.2..2.0)).round(),
            loan_tenure_months: self.rng.gen_range(6..=60),
            avg_days_past_due: self.rng.gen_range(0..=5),
            delinquency_ratio_pct: self.rng.gen_range(0..=10),
            credit_utilization_pct: self.rng.gen_range(0..=40),
            num_open_accounts: self.rng.gen_range(1..=3),
            residence_type: self.random_choice(&ResidenceType::ALL),
            loan_purpose: self.random_choice(&LoanPurpose::ALL),
            loan_type: self.random_choice(&LoanType::ALL),
        }
    }

    /// Generate an applicant with a history of missed payments
    fn generate_risky(&mut self) -> ApplicantProfile {
        let annual_income = self.rng.gen_range(0.0..900_000.0_f64).round();
        ApplicantProfile {
            age: self.rng.gen_range(18..=35),
            annual_income,
            loan_amount: self.rng.gen_range(500_000.0..5_000_000.0_f64).round(),
            loan_tenure_months: self.rng.gen_range(24..=60),
            avg_days_past_due: self.rng.gen_range(10..=40),
            delinquency_ratio_pct: self.rng.gen_range(30..=100),
            credit_utilization_pct: self.rng.gen_range(50..=100),
            num_open_accounts: self.rng.gen_range(2..=4),
            residence_type: ResidenceType::Rented,
            loan_purpose: self.random_choice(&[LoanPurpose::Personal, LoanPurpose::Education]),
            loan_type: LoanType::Unsecured,
        }
    }

    fn random_choice<T: Copy>(&mut self, choices: &[T]) -> T {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Share of risky applicants from argv, 0.3 when omitted
fn parse_risky_rate(arg: Option<&str>) -> anyhow::Result<f64> {
    let Some(arg) = arg else {
        return Ok(0.3);
    };
    let rate: f64 = arg
        .parse()
        .map_err(|e| anyhow::anyhow!("risky_rate {arg:?} is not a number: {e}"))?;
    if !(0.0..=1.0).contains(&rate) {
        anyhow::bail!("risky_rate must be between 0 and 1, got {rate}");
    }
    Ok(rate)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("applicant_producer=info".parse()?),
        )
        .init();

    info!("Starting Sample Applicant Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("credit.applications");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let risky_rate = parse_risky_rate(args.get(4).map(|s| s.as_str()))?;
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        risky_rate = risky_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Scoring locally instead.");
            return run_local_mode(count, risky_rate, delay_ms).await;
        }
    };

    let mut generator = ApplicantGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let applicant = if rng.gen_bool(risky_rate) {
            generator.generate_risky()
        } else {
            generator.generate_prime()
        };

        let payload = serde_json::to_vec(&applicant)?;
        match client.request(subject.to_string(), payload.into()).await {
            Ok(reply) => match serde_json::from_slice::<ScoreResponse>(&reply.payload) {
                Ok(response) => info!(
                    n = i + 1,
                    request_id = %response.request_id,
                    outcome = ?response.outcome,
                    "Received score"
                ),
                Err(e) => warn!(error = %e, "Unreadable score response"),
            },
            Err(e) => warn!(error = %e, "Scoring request failed"),
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!("Completed! Sent {} applications", count);

    Ok(())
}

async fn run_local_mode(count: u64, risky_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in local mode (no NATS connection)");

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to built-in configuration");
        AppConfig::default()
    });
    let scorer = CreditRiskScorer::from_config(&config)?;

    let mut generator = ApplicantGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let applicant = if rng.gen_bool(risky_rate) {
            generator.generate_risky()
        } else {
            generator.generate_prime()
        };

        match scorer.predict(&applicant) {
            Ok(result) => info!(
                n = i + 1,
                probability = format!("{:.2}%", result.probability * 100.0),
                credit_score = result.credit_score,
                rating = %result.rating,
                "Scored locally"
            ),
            Err(e) => warn!(n = i + 1, error = %e, "Applicant rejected"),
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risky_rate_argument() {
        assert_eq!(parse_risky_rate(None).unwrap(), 0.3);
        assert_eq!(parse_risky_rate(Some("0")).unwrap(), 0.0);
        assert_eq!(parse_risky_rate(Some("1")).unwrap(), 1.0);
        assert_eq!(parse_risky_rate(Some("0.75")).unwrap(), 0.75);

        for bad in ["1.5", "-0.1", "NaN", "inf", "lots"] {
            assert!(parse_risky_rate(Some(bad)).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_generated_applicants_are_valid() {
        let mut generator = ApplicantGenerator::new();
        for _ in 0..50 {
            assert!(generator.generate_prime().validate().is_ok());
            assert!(generator.generate_risky().validate().is_ok());
        }
    }
}
