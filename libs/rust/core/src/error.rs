use thiserror::Error;

/// Failures surfaced by the federation core.
///
/// Validation problems are caught before any model is fitted; aggregation
/// and prediction preconditions are checked before heavy work. Attribution
/// never fails through this type (it degrades to a zero map instead).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("dataset must contain at least {min} samples, got {rows}")]
    InsufficientRows { rows: usize, min: usize },

    #[error("column {column} has a non-numeric value at row {row}")]
    InvalidValue { column: String, row: usize },

    #[error("model training failed: {source}")]
    Training {
        #[source]
        source: Box<CoreError>,
    },

    #[error("no model contributions available for aggregation")]
    NoContributions,

    #[error("no global model available")]
    NoGlobalModel,
}

impl CoreError {
    /// Wraps a validation failure the way the trainer reports it.
    pub fn training(source: CoreError) -> Self {
        CoreError::Training { source: Box::new(source) }
    }
}
