//! FedAvg aggregation.
//!
//! Folds every stored contribution into one versioned global model. With
//! tree ensembles the member parameters cannot be averaged directly, so
//! FedAvg is realized at prediction time: each member keeps its sample-count
//! weight and the predictor averages member outputs under those weights.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::forest::RandomForest;
use crate::training::Contribution;

/// Aggregation output. Append-only: new versions never replace old ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalModel {
    pub version: u64,
    /// (classifier, weight) pairs in contribution read order.
    pub members: Vec<(RandomForest, f64)>,
    pub contribution_count: usize,
    pub total_samples: u64,
    pub created_at: i64,
}

/// Sample-weighted combination of all contributions.
///
/// `weight[i] = sample_count[i] / total_samples`, member order follows the
/// input order. The new version is `previous_max_version + 1`; reading the
/// previous maximum and storing the result are the caller's job and are not
/// atomic here, so concurrent aggregations must be serialized by the store
/// or the caller.
pub fn federated_average(
    contributions: &[Contribution],
    previous_max_version: u64,
) -> Result<GlobalModel, CoreError> {
    if contributions.is_empty() {
        return Err(CoreError::NoContributions);
    }

    let total_samples: u64 = contributions.iter().map(|c| c.sample_count).sum();
    let members: Vec<(RandomForest, f64)> = contributions
        .iter()
        .map(|c| (c.model.clone(), c.sample_count as f64 / total_samples as f64))
        .collect();

    Ok(GlobalModel {
        version: previous_max_version + 1,
        members,
        contribution_count: contributions.len(),
        total_samples,
        created_at: chrono::Utc::now().timestamp(),
    })
}
