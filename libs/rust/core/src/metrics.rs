//! Federation metrics.

use once_cell::sync::Lazy;
use opentelemetry::metrics::{Counter, Histogram, Meter, Unit};

static FED_METER: Lazy<Meter> = Lazy::new(|| opentelemetry::global::meter("cardiomesh_federation"));

pub struct FederationMetrics {
    pub trainings_total: Counter<u64>,
    pub aggregations_total: Counter<u64>,
    pub assessments_total: Counter<u64>,
    pub attribution_fallbacks_total: Counter<u64>,
    pub training_latency_ms: Histogram<f64>,
    pub aggregation_latency_ms: Histogram<f64>,
    pub assessment_latency_ms: Histogram<f64>,
}

pub static FEDERATION_METRICS: Lazy<FederationMetrics> = Lazy::new(|| FederationMetrics {
    trainings_total: FED_METER
        .u64_counter("cardiomesh_trainings_total")
        .with_description("Local trainings completed")
        .init(),
    aggregations_total: FED_METER
        .u64_counter("cardiomesh_aggregations_total")
        .with_description("Global model aggregations completed")
        .init(),
    assessments_total: FED_METER
        .u64_counter("cardiomesh_assessments_total")
        .with_description("Risk assessments served")
        .init(),
    attribution_fallbacks_total: FED_METER
        .u64_counter("cardiomesh_attribution_fallbacks_total")
        .with_description("Assessments served with a degraded zero attribution map")
        .init(),
    training_latency_ms: FED_METER
        .f64_histogram("cardiomesh_training_latency_ms")
        .with_description("Local training latency (ms)")
        .with_unit(Unit::new("ms"))
        .init(),
    aggregation_latency_ms: FED_METER
        .f64_histogram("cardiomesh_aggregation_latency_ms")
        .with_description("Aggregation latency (ms)")
        .with_unit(Unit::new("ms"))
        .init(),
    assessment_latency_ms: FED_METER
        .f64_histogram("cardiomesh_assessment_latency_ms")
        .with_description("Assessment latency (ms)")
        .with_unit(Unit::new("ms"))
        .init(),
});
