//! Threshold decision on the model's churn probability

use crate::types::prediction::ChurnLabel;

/// Probabilities strictly above this are classified as churn.
pub const CHURN_THRESHOLD: f64 = 0.5;

/// Classify a churn probability.
pub fn decide(probability: f64) -> ChurnLabel {
    if probability > CHURN_THRESHOLD {
        ChurnLabel::Churn
    } else {
        ChurnLabel::NoChurn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(decide(0.5), ChurnLabel::NoChurn);
        assert_eq!(decide(0.500_001), ChurnLabel::Churn);
        assert_eq!(decide(0.499_999), ChurnLabel::NoChurn);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(decide(0.0), ChurnLabel::NoChurn);
        assert_eq!(decide(1.0), ChurnLabel::Churn);
    }
}
