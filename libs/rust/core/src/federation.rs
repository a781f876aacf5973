//! Federation coordination.
//!
//! [`FederationHub`] wires the store collaborators to the pure training,
//! aggregation and inference functions. Every operation either completes
//! and appends exactly one record, or fails and appends nothing.

use std::time::Instant;

use anyhow::Result;
use tracing::info;

use crate::aggregation::{federated_average, GlobalModel};
use crate::error::CoreError;
use crate::explain::explain_prediction;
use crate::inference::{ensemble_predict, RiskAssessment, RiskLevel};
use crate::metrics::FEDERATION_METRICS;
use crate::schema::PatientRecord;
use crate::store::{ContributionStore, GlobalModelStore};
use crate::training::{train_local, Contribution, TrainerConfig};

pub struct FederationHub<C, G> {
    contributions: C,
    globals: G,
    trainer: TrainerConfig,
}

impl<C: ContributionStore, G: GlobalModelStore> FederationHub<C, G> {
    pub fn new(contributions: C, globals: G, trainer: TrainerConfig) -> Self {
        Self { contributions, globals, trainer }
    }

    /// Train a local model on one site's raw dataset and log the
    /// contribution. Nothing is stored when training fails.
    pub fn submit_training(&self, text: &str) -> Result<Contribution> {
        let start = Instant::now();
        let contribution = train_local(text, &self.trainer)?;
        self.contributions.append(contribution.clone())?;
        FEDERATION_METRICS.trainings_total.add(1, &[]);
        FEDERATION_METRICS
            .training_latency_ms
            .record(start.elapsed().as_secs_f64() * 1000.0, &[]);
        info!(samples = contribution.sample_count, trees = contribution.model.tree_count(), "local_model_trained");
        Ok(contribution)
    }

    /// Fold every stored contribution into the next global model version.
    ///
    /// Reading the current maximum version and appending the new record are
    /// two separate store calls; concurrent aggregations must be serialized
    /// by the store or the caller.
    pub fn aggregate(&self) -> Result<GlobalModel> {
        let start = Instant::now();
        let contributions = self.contributions.read_all()?;
        let previous = self.globals.max_version()?;
        let model = federated_average(&contributions, previous)?;
        self.globals.append(model.clone())?;
        FEDERATION_METRICS.aggregations_total.add(1, &[]);
        FEDERATION_METRICS
            .aggregation_latency_ms
            .record(start.elapsed().as_secs_f64() * 1000.0, &[]);
        info!(
            version = model.version,
            contributions = model.contribution_count,
            total_samples = model.total_samples,
            "global_model_aggregated"
        );
        Ok(model)
    }

    /// Assess one record against the latest global model: weighted-ensemble
    /// probability, risk band, and per-feature attribution (zero map when
    /// attribution is unavailable).
    pub fn assess(&self, record: &PatientRecord) -> Result<RiskAssessment> {
        let start = Instant::now();
        let Some(model) = self.globals.latest()? else {
            return Err(CoreError::NoGlobalModel.into());
        };
        let row = record.to_features();
        let (risk_score, predicted_class) = ensemble_predict(&model, &row);
        let assessment = RiskAssessment {
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            predicted_class,
            attribution: explain_prediction(&model, &row),
        };
        FEDERATION_METRICS.assessments_total.add(1, &[]);
        FEDERATION_METRICS
            .assessment_latency_ms
            .record(start.elapsed().as_secs_f64() * 1000.0, &[]);
        info!(
            score = assessment.risk_score,
            level = %assessment.risk_level,
            model_version = model.version,
            "risk_assessed"
        );
        Ok(assessment)
    }

    pub fn latest_model(&self) -> Result<Option<GlobalModel>> {
        self.globals.latest()
    }
}
