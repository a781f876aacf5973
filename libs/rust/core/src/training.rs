//! Local model training.
//!
//! Turns one site's raw tabular submission into a [`Contribution`]: a fitted
//! forest, the feature order it expects, and the sample count the aggregator
//! weights it by.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::forest::RandomForest;
use crate::schema::{parse_dataset, FEATURE_COLUMNS};

/// Training hyperparameters. Defaults match the reference deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub trees: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self { trees: 100, max_depth: 10, seed: 42 }
    }
}

/// One site's local training result. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub model: RandomForest,
    pub feature_names: Vec<String>,
    pub sample_count: u64,
}

/// Validate a raw dataset and fit a local model on it.
///
/// Validation failures come back as [`CoreError::Training`] with the
/// original failure preserved as the source.
pub fn train_local(text: &str, cfg: &TrainerConfig) -> Result<Contribution, CoreError> {
    let dataset = parse_dataset(text).map_err(CoreError::training)?;
    let model = RandomForest::fit(&dataset.features, &dataset.labels, cfg.trees, cfg.max_depth, cfg.seed);
    Ok(Contribution {
        model,
        feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        sample_count: dataset.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn site_csv(rows: usize) -> String {
        let mut out = String::from(
            "age,sex,cp,trestbps,chol,fbs,restecg,thalach,exang,oldpeak,slope,ca,thal,target\n",
        );
        for i in 0..rows {
            let target = (i % 2 == 0) as u8;
            out.push_str(&format!(
                "{},{},2,{},240,0,1,{},0,1.5,2,0,3,{}\n",
                40 + i,
                i % 2,
                120 + i,
                140 + i,
                target
            ));
        }
        out
    }

    #[test]
    fn produces_contribution_with_sample_count() {
        let cfg = TrainerConfig { trees: 10, max_depth: 5, ..Default::default() };
        let contribution = train_local(&site_csv(24), &cfg).unwrap();
        assert_eq!(contribution.sample_count, 24);
        assert_eq!(contribution.feature_names.len(), 13);
        assert_eq!(contribution.feature_names[0], "age");
        assert_eq!(contribution.model.tree_count(), 10);
    }

    #[test]
    fn wraps_validation_failure_with_cause() {
        let err = train_local(&site_csv(4), &TrainerConfig::default()).unwrap_err();
        match &err {
            CoreError::Training { source } => {
                assert!(matches!(**source, CoreError::InsufficientRows { rows: 4, .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
        // The original message survives through the chain.
        assert!(err.source().unwrap().to_string().contains("at least 10 samples"));
    }

    #[test]
    fn training_is_deterministic() {
        let cfg = TrainerConfig { trees: 8, max_depth: 6, seed: 42 };
        let text = site_csv(30);
        let a = train_local(&text, &cfg).unwrap();
        let b = train_local(&text, &cfg).unwrap();
        let row = [55.0, 1.0, 2.0, 130.0, 240.0, 0.0, 1.0, 150.0, 0.0, 1.5, 2.0, 0.0, 3.0];
        assert_eq!(a.model.predict_proba(&row), b.model.predict_proba(&row));
    }
}
