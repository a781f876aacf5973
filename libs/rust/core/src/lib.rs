//! Core federated learning library for CardioMesh services.
//!
//! Sites validate and train on their own tabular data (`schema`, `forest`,
//! `training`), a coordinator folds the stored contributions into a
//! versioned global ensemble (`aggregation`), and the latest global model
//! serves single-record risk assessments with per-feature attributions
//! (`inference`, `explain`). `federation` wires the flow to the store
//! collaborator traits in `store`; persistence engines themselves live
//! outside this crate.

pub mod aggregation;
pub mod error;
pub mod explain;
pub mod federation;
pub mod forest;
pub mod inference;
pub mod metrics;
pub mod schema;
pub mod store;
pub mod training;

pub use aggregation::{federated_average, GlobalModel};
pub use error::CoreError;
pub use explain::explain_prediction;
pub use federation::FederationHub;
pub use forest::{DecisionTree, RandomForest};
pub use inference::{ensemble_predict, predict, RiskAssessment, RiskLevel};
pub use metrics::{FederationMetrics, FEDERATION_METRICS};
pub use schema::{parse_dataset, Dataset, FeatureRow, PatientRecord, FEATURE_COLUMNS};
pub use store::{ContributionStore, GlobalModelStore, MemoryStore};
pub use training::{train_local, Contribution, TrainerConfig};
