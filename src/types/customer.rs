//! Customer profile submitted for churn scoring

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::RangeInclusive;

pub const CREDIT_SCORE_RANGE: RangeInclusive<u32> = 0..=1000;
pub const AGE_RANGE: RangeInclusive<u32> = 18..=90;
pub const TENURE_RANGE: RangeInclusive<u32> = 0..=10;
pub const BALANCE_RANGE: RangeInclusive<f64> = 0.0..=1e7;
pub const NUM_PRODUCTS_RANGE: RangeInclusive<u32> = 1..=4;
pub const FLAG_RANGE: RangeInclusive<u8> = 0..=1;
pub const SALARY_RANGE: RangeInclusive<f64> = 0.0..=1e6;

/// Raw account and demographic attributes of one bank customer.
///
/// Field aliases accept the column names of the training dataset, so rows
/// exported straight from it deserialize as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    /// Correlation id echoed back in the response
    #[serde(default, alias = "CustomerId")]
    pub customer_id: Option<String>,

    #[serde(alias = "CreditScore")]
    pub credit_score: u32,

    /// Country of residence, one of the geography encoder's categories
    #[serde(alias = "Geography")]
    pub geography: String,

    /// One of the gender encoder's classes
    #[serde(alias = "Gender")]
    pub gender: String,

    #[serde(alias = "Age")]
    pub age: u32,

    /// Years with the bank
    #[serde(alias = "Tenure")]
    pub tenure: u32,

    #[serde(alias = "Balance")]
    pub balance: f64,

    /// Number of bank products held
    #[serde(alias = "NumOfProducts")]
    pub num_products: u32,

    /// 1 if the customer has a credit card
    #[serde(alias = "HasCrCard")]
    pub has_cr_card: u8,

    /// 1 if the customer is an active member
    #[serde(alias = "IsActiveMember")]
    pub is_active_member: u8,

    #[serde(alias = "EstimatedSalary")]
    pub estimated_salary: f64,
}

impl CustomerProfile {
    /// Check every numeric field against its documented domain.
    ///
    /// Categorical fields are checked by the encoders.
    pub fn validate(&self) -> Result<(), PipelineError> {
        check("credit_score", self.credit_score, &CREDIT_SCORE_RANGE)?;
        check("age", self.age, &AGE_RANGE)?;
        check("tenure", self.tenure, &TENURE_RANGE)?;
        check_float("balance", self.balance, &BALANCE_RANGE)?;
        check("num_products", self.num_products, &NUM_PRODUCTS_RANGE)?;
        check("has_cr_card", self.has_cr_card, &FLAG_RANGE)?;
        check("is_active_member", self.is_active_member, &FLAG_RANGE)?;
        check_float("estimated_salary", self.estimated_salary, &SALARY_RANGE)?;
        Ok(())
    }
}

impl Default for CustomerProfile {
    /// Starting values of the profile input form; categorical fields are left
    /// empty until a vocabulary is known.
    fn default() -> Self {
        Self {
            customer_id: None,
            credit_score: 600,
            geography: String::new(),
            gender: String::new(),
            age: 30,
            tenure: 5,
            balance: 0.0,
            num_products: 1,
            has_cr_card: 0,
            is_active_member: 0,
            estimated_salary: 50000.0,
        }
    }
}

fn check<T>(field: &'static str, value: T, range: &RangeInclusive<T>) -> Result<(), PipelineError>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(PipelineError::OutOfRange {
            field,
            reason: format!(
                "{} not in [{}, {}]",
                value,
                range.start(),
                range.end()
            ),
        })
    }
}

fn check_float(
    field: &'static str,
    value: f64,
    range: &RangeInclusive<f64>,
) -> Result<(), PipelineError> {
    if !value.is_finite() {
        return Err(PipelineError::OutOfRange {
            field,
            reason: format!("{} is not a finite number", value),
        });
    }
    check(field, value, range)
}
