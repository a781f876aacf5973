//! Global-model inference.
//!
//! The FedAvg inference rule: every member produces a class-probability
//! vector, each vector is scaled by the member's weight, and the scaled
//! vectors are summed elementwise. Argmax of the combined vector is the
//! predicted class; the positive-class slot is the risk score.

use serde::{Deserialize, Serialize};

use crate::aggregation::GlobalModel;
use crate::error::CoreError;
use crate::schema::FeatureRow;

/// Risk band derived from the positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Band boundaries are inclusive upward: 0.33 is already Medium and
    /// 0.67 already High.
    pub fn from_score(score: f64) -> Self {
        if score < 0.33 {
            RiskLevel::Low
        } else if score < 0.67 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Full assessment for one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub predicted_class: usize,
    /// Feature name to signed attribution, most influential first.
    pub attribution: Vec<(String, f64)>,
}

/// Combine member predictions under the stored weights.
///
/// The feature row must already be in canonical column order; no structural
/// validation happens here. Returns (positive-class probability, predicted
/// class). Combination is commutative, so member order cannot change the
/// result.
pub fn ensemble_predict(model: &GlobalModel, row: &FeatureRow) -> (f64, usize) {
    let mut combined = [0.0f64; 2];
    for (member, weight) in &model.members {
        let p = member.predict_proba(row);
        combined[0] += weight * p[0];
        combined[1] += weight * p[1];
    }
    // First maximum wins on a tie, as argmax would.
    let predicted = (combined[1] > combined[0]) as usize;
    (combined[1], predicted)
}

/// Checked prediction over a possibly-absent global model.
pub fn predict(model: Option<&GlobalModel>, row: &FeatureRow) -> Result<(f64, usize), CoreError> {
    let model = model.ok_or(CoreError::NoGlobalModel)?;
    Ok(ensemble_predict(model, row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{DecisionTree, RandomForest};

    fn member(p: [f64; 2]) -> RandomForest {
        RandomForest { trees: vec![DecisionTree::constant(p)] }
    }

    fn two_member_model() -> GlobalModel {
        GlobalModel {
            version: 1,
            members: vec![(member([0.2, 0.8]), 0.5), (member([0.6, 0.4]), 0.5)],
            contribution_count: 2,
            total_samples: 20,
            created_at: 0,
        }
    }

    #[test]
    fn combines_weighted_probabilities() {
        let (score, class) = ensemble_predict(&two_member_model(), &[0.0; 13]);
        assert!((score - 0.6).abs() < 1e-9);
        assert_eq!(class, 1);
    }

    #[test]
    fn unequal_weights_shift_the_score() {
        let model = GlobalModel {
            version: 1,
            members: vec![(member([0.2, 0.8]), 0.9), (member([0.6, 0.4]), 0.1)],
            contribution_count: 2,
            total_samples: 100,
            created_at: 0,
        };
        let (score, class) = ensemble_predict(&model, &[0.0; 13]);
        assert!((score - 0.76).abs() < 1e-9);
        assert_eq!(class, 1);
    }

    #[test]
    fn absent_model_is_rejected() {
        assert!(matches!(predict(None, &[0.0; 13]), Err(CoreError::NoGlobalModel)));
    }

    #[test]
    fn tie_resolves_to_class_zero() {
        let model = GlobalModel {
            version: 1,
            members: vec![(member([0.5, 0.5]), 1.0)],
            contribution_count: 1,
            total_samples: 10,
            created_at: 0,
        };
        let (score, class) = ensemble_predict(&model, &[0.0; 13]);
        assert!((score - 0.5).abs() < 1e-9);
        assert_eq!(class, 0);
    }

    #[test]
    fn risk_bands() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.329999), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.33), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.669999), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.67), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::High);
    }

    #[test]
    fn risk_level_display() {
        assert_eq!(RiskLevel::Medium.to_string(), "Medium");
    }
}
