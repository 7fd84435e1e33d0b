//! Loan applicant data structures

use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_AGE: u32 = 18;
pub const MAX_AGE: u32 = 100;
pub const MAX_PERCENT: u32 = 100;
pub const MIN_OPEN_ACCOUNTS: u32 = 1;
pub const MAX_OPEN_ACCOUNTS: u32 = 4;

/// Applicant's housing situation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ResidenceType {
    Owned,
    Rented,
    Mortgage,
}

/// What the loan is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum LoanPurpose {
    Education,
    Home,
    Auto,
    Personal,
}

/// Whether the loan is backed by collateral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum LoanType {
    Unsecured,
    Secured,
}

impl ResidenceType {
    pub const ALL: [ResidenceType; 3] = [Self::Owned, Self::Rented, Self::Mortgage];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Owned => "Owned",
            Self::Rented => "Rented",
            Self::Mortgage => "Mortgage",
        }
    }
}

impl LoanPurpose {
    pub const ALL: [LoanPurpose; 4] = [Self::Education, Self::Home, Self::Auto, Self::Personal];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Education => "Education",
            Self::Home => "Home",
            Self::Auto => "Auto",
            Self::Personal => "Personal",
        }
    }
}

impl LoanType {
    pub const ALL: [LoanType; 2] = [Self::Unsecured, Self::Secured];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unsecured => "Unsecured",
            Self::Secured => "Secured",
        }
    }
}

fn parse_label<T: Copy>(
    field: &'static str,
    value: &str,
    all: &[T],
    label: fn(&T) -> &'static str,
) -> Result<T, ScoringError> {
    let trimmed = value.trim();
    all.iter()
        .find(|candidate| label(candidate).eq_ignore_ascii_case(trimmed))
        .copied()
        .ok_or_else(|| {
            let expected: Vec<&str> = all.iter().map(label).collect();
            ScoringError::invalid(
                field,
                format!("unknown value {:?}, expected one of {:?}", value, expected),
            )
        })
}

impl FromStr for ResidenceType {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("residence_type", s, &Self::ALL, Self::label)
    }
}

impl FromStr for LoanPurpose {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("loan_purpose", s, &Self::ALL, Self::label)
    }
}

impl FromStr for LoanType {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("loan_type", s, &Self::ALL, Self::label)
    }
}

// Payload values go through the same case-insensitive parser as `FromStr`
impl TryFrom<String> for ResidenceType {
    type Error = ScoringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for LoanPurpose {
    type Error = ScoringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for LoanType {
    type Error = ScoringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ResidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for LoanPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw borrower attributes submitted for assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    /// Age in years
    pub age: u32,

    /// Annual income in currency units
    pub annual_income: f64,

    /// Requested loan amount in currency units
    pub loan_amount: f64,

    /// Loan tenure in months
    pub loan_tenure_months: u32,

    /// Average days past due per delinquency
    #[serde(alias = "avg_dpd_per_delinquency")]
    pub avg_days_past_due: u32,

    /// Share of past payments that were delinquent (%)
    #[serde(alias = "delinquency_ratio")]
    pub delinquency_ratio_pct: u32,

    /// Share of available credit in use (%)
    #[serde(alias = "credit_utilization_ratio")]
    pub credit_utilization_pct: u32,

    /// Number of open loan accounts
    pub num_open_accounts: u32,

    pub residence_type: ResidenceType,
    pub loan_purpose: LoanPurpose,
    pub loan_type: LoanType,
}

impl ApplicantProfile {
    /// Check every attribute against its domain.
    ///
    /// Returns the first violation found, in field declaration order.
    pub fn validate(&self) -> Result<(), ScoringError> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(ScoringError::invalid(
                "age",
                format!("must be between {MIN_AGE} and {MAX_AGE}, got {}", self.age),
            ));
        }
        check_amount("annual_income", self.annual_income)?;
        check_amount("loan_amount", self.loan_amount)?;
        check_percent("delinquency_ratio_pct", self.delinquency_ratio_pct)?;
        check_percent("credit_utilization_pct", self.credit_utilization_pct)?;
        if !(MIN_OPEN_ACCOUNTS..=MAX_OPEN_ACCOUNTS).contains(&self.num_open_accounts) {
            return Err(ScoringError::invalid(
                "num_open_accounts",
                format!(
                    "must be between {MIN_OPEN_ACCOUNTS} and {MAX_OPEN_ACCOUNTS}, got {}",
                    self.num_open_accounts
                ),
            ));
        }
        Ok(())
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), ScoringError> {
    if !value.is_finite() {
        return Err(ScoringError::invalid(field, format!("must be finite, got {value}")));
    }
    if value < 0.0 {
        return Err(ScoringError::invalid(
            field,
            format!("must be non-negative, got {value}"),
        ));
    }
    Ok(())
}

fn check_percent(field: &'static str, value: u32) -> Result<(), ScoringError> {
    if value > MAX_PERCENT {
        return Err(ScoringError::invalid(
            field,
            format!("must be between 0 and {MAX_PERCENT}, got {value}"),
        ));
    }
    Ok(())
}
