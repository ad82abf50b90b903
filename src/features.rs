//! Feature assembly for churn model inference.
//!
//! Packs a customer profile and its encoded categories into the exact column
//! order the scaler and model were fitted on. Column order is part of the
//! model contract: a swapped column still produces a prediction, just a wrong
//! one, so the order lives in [`BASE_COLUMNS`] and is checked against the
//! scaler's recorded feature names at load time.

use crate::types::customer::CustomerProfile;

/// Numeric columns that precede the geography block, in training order.
pub const BASE_COLUMNS: [&str; 9] = [
    "CreditScore",
    "Gender",
    "Age",
    "Tenure",
    "Balance",
    "NumOfProducts",
    "HasCrCard",
    "IsActiveMember",
    "EstimatedSalary",
];

/// Prefix for the one-hot geography columns.
pub const GEOGRAPHY_PREFIX: &str = "Geography";

/// Ordered numeric features for a single customer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Narrow to the model's input precision.
    pub fn to_f32(&self) -> Vec<f32> {
        self.0.iter().map(|&v| v as f32).collect()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Builds feature vectors for a fixed geography column layout.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    geography_columns: Vec<String>,
}

impl FeatureAssembler {
    /// Create an assembler whose trailing block uses the given one-hot column names.
    pub fn new(geography_columns: Vec<String>) -> Self {
        Self { geography_columns }
    }

    /// Pack a profile, its gender code and its geography row.
    pub fn assemble(
        &self,
        profile: &CustomerProfile,
        gender_code: usize,
        geography: &[f64],
    ) -> FeatureVector {
        let mut features = Vec::with_capacity(self.feature_count());

        features.push(f64::from(profile.credit_score));
        features.push(gender_code as f64);
        features.push(f64::from(profile.age));
        features.push(f64::from(profile.tenure));
        features.push(profile.balance);
        features.push(f64::from(profile.num_products));
        features.push(f64::from(profile.has_cr_card));
        features.push(f64::from(profile.is_active_member));
        features.push(profile.estimated_salary);

        features.extend_from_slice(geography);

        FeatureVector::new(features)
    }

    /// Total width: base columns plus one per geography.
    pub fn feature_count(&self) -> usize {
        BASE_COLUMNS.len() + self.geography_columns.len()
    }

    /// Column names in assembly order.
    pub fn feature_names(&self) -> Vec<String> {
        BASE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.geography_columns.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler() -> FeatureAssembler {
        FeatureAssembler::new(vec![
            "Geography_France".to_string(),
            "Geography_Germany".to_string(),
            "Geography_Spain".to_string(),
        ])
    }

    fn profile() -> CustomerProfile {
        CustomerProfile {
            customer_id: None,
            credit_score: 600,
            geography: "France".to_string(),
            gender: "Male".to_string(),
            age: 30,
            tenure: 5,
            balance: 0.0,
            num_products: 1,
            has_cr_card: 1,
            is_active_member: 1,
            estimated_salary: 50000.0,
        }
    }

    #[test]
    fn test_base_column_order_is_pinned() {
        assert_eq!(
            BASE_COLUMNS,
            [
                "CreditScore",
                "Gender",
                "Age",
                "Tenure",
                "Balance",
                "NumOfProducts",
                "HasCrCard",
                "IsActiveMember",
                "EstimatedSalary",
            ]
        );
    }

    #[test]
    fn test_assemble() {
        let features = assembler().assemble(&profile(), 1, &[1.0, 0.0, 0.0]);

        assert_eq!(
            features.as_slice(),
            &[600.0, 1.0, 30.0, 5.0, 0.0, 1.0, 1.0, 1.0, 50000.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_values_pass_through_unchanged() {
        let mut profile = profile();
        profile.balance = 125_510.82;
        profile.estimated_salary = 79_084.1;
        profile.has_cr_card = 0;

        let features = assembler().assemble(&profile, 0, &[0.0, 0.0, 1.0]);

        assert_eq!(features.as_slice()[4], 125_510.82);
        assert_eq!(features.as_slice()[6], 0.0);
        assert_eq!(features.as_slice()[8], 79_084.1);
    }

    #[test]
    fn test_feature_count() {
        let assembler = assembler();
        assert_eq!(assembler.feature_count(), 12);
        assert_eq!(assembler.feature_names().len(), 12);
        assert_eq!(
            assembler.assemble(&profile(), 0, &[0.0, 1.0, 0.0]).len(),
            assembler.feature_count()
        );
    }

    #[test]
    fn test_feature_names() {
        let names = assembler().feature_names();
        assert_eq!(names[0], "CreditScore");
        assert_eq!(names[8], "EstimatedSalary");
        assert_eq!(names[9], "Geography_France");
        assert_eq!(names[11], "Geography_Spain");
    }
}
