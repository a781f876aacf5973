//! Per-feature attribution for a single prediction.
//!
//! Attribution is computed over one representative member of the global
//! ensemble (the first, by construction) rather than the weighted ensemble.
//! The method is the additive decision-path scheme for tree models: walking
//! a tree from root to leaf, the change in positive-class probability across
//! each split is credited to the split feature, and per-tree credits are
//! averaged over the forest. The credited amounts sum to the representative
//! model's prediction minus its mean root value.
//!
//! Attribution must never abort an assessment: any internal failure yields
//! an all-zero map over the canonical feature names instead.

use anyhow::{anyhow, bail, Result};
use tracing::warn;

use crate::aggregation::GlobalModel;
use crate::forest::{DecisionTree, RandomForest};
use crate::metrics::FEDERATION_METRICS;
use crate::schema::{FeatureRow, FEATURE_COLUMNS, FEATURE_COUNT};

/// Signed per-feature scores for one prediction, ordered by descending
/// absolute magnitude. All-zero scores mean "attribution unavailable".
pub fn explain_prediction(model: &GlobalModel, row: &FeatureRow) -> Vec<(String, f64)> {
    let scores = match representative_attribution(model, row) {
        Ok(scores) => scores,
        Err(error) => {
            warn!(%error, "attribution degraded to zero map");
            FEDERATION_METRICS.attribution_fallbacks_total.add(1, &[]);
            [0.0; FEATURE_COUNT]
        }
    };

    let mut named: Vec<(String, f64)> = FEATURE_COLUMNS
        .iter()
        .zip(scores)
        .map(|(name, score)| (name.to_string(), score))
        .collect();
    named.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    named
}

fn representative_attribution(model: &GlobalModel, row: &FeatureRow) -> Result<[f64; FEATURE_COUNT]> {
    let (representative, _) =
        model.members.first().ok_or_else(|| anyhow!("global model has no members"))?;
    forest_attribution(representative, row)
}

fn forest_attribution(forest: &RandomForest, row: &FeatureRow) -> Result<[f64; FEATURE_COUNT]> {
    if forest.trees.is_empty() {
        bail!("representative model has no trees");
    }
    let mut acc = [0.0; FEATURE_COUNT];
    for tree in &forest.trees {
        path_contributions(tree, row, &mut acc)?;
    }
    for score in &mut acc {
        *score /= forest.trees.len() as f64;
    }
    Ok(acc)
}

/// Walk the decision path, crediting each split's probability change to the
/// split feature.
fn path_contributions(tree: &DecisionTree, row: &FeatureRow, acc: &mut [f64; FEATURE_COUNT]) -> Result<()> {
    let mut node = tree.nodes.first().ok_or_else(|| anyhow!("tree has no nodes"))?;
    let mut current = node.value[1];
    while !node.is_leaf() {
        let (Some(left), Some(right)) = (node.left, node.right) else {
            bail!("split node missing a child");
        };
        if node.feature >= FEATURE_COUNT {
            bail!("split feature {} out of range", node.feature);
        }
        let next_id = if row[node.feature] <= node.threshold { left } else { right };
        let next = tree.nodes.get(next_id).ok_or_else(|| anyhow!("child index out of bounds"))?;
        acc[node.feature] += next.value[1] - current;
        current = next.value[1];
        node = next;
    }
    Ok(())
}
