//! Observability for relationship resolution.
//!
//! With the `metrics` feature, counters and a duration histogram are recorded
//! through an OpenTelemetry meter provider backed by a Prometheus registry;
//! [`LifelineMetrics::gather`] renders it in the text exposition format.
//! With the `tracing` feature, every resolution runs inside a span.

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics::SdkMeterProvider;
#[cfg(feature = "metrics")]
use prometheus::{Registry, TextEncoder};

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<LifelineMetrics> = Lazy::new(LifelineMetrics::init);

#[cfg(feature = "metrics")]
pub struct LifelineMetrics {
    pub registry: Registry,
    pub provider: SdkMeterProvider,
    pub resolutions_total: Counter<u64>,
    pub strategy_fallbacks_total: Counter<u64>,
    pub resolve_duration: Histogram<f64>,
}

#[cfg(feature = "metrics")]
impl LifelineMetrics {
    pub fn init() -> Self {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
            .expect("failed to build prometheus exporter");
        let provider = SdkMeterProvider::builder().with_reader(exporter).build();
        let meter = provider.meter("lifeline");

        let resolutions_total = meter
            .u64_counter("lifeline_resolutions_total")
            .with_description("Relationship queries resolved")
            .build();

        let strategy_fallbacks_total = meter
            .u64_counter("lifeline_strategy_fallbacks_total")
            .with_description("JOIN fetches re-issued with the UNION strategy")
            .build();

        let resolve_duration = meter
            .f64_histogram("lifeline_resolve_duration_seconds")
            .with_description("Duration of relationship queries")
            .build();

        Self {
            registry,
            provider,
            resolutions_total,
            strategy_fallbacks_total,
            resolve_duration,
        }
    }

    /// Count one successful resolution of a `kind` relationship
    pub fn record_resolution(&self, kind: &'static str, elapsed: std::time::Duration) {
        let attributes = [KeyValue::new("relationship", kind)];
        self.resolutions_total.add(1, &attributes);
        self.resolve_duration.record(elapsed.as_secs_f64(), &attributes);
    }

    pub fn record_fallback(&self) {
        self.strategy_fallbacks_total.add(1, &[]);
    }

    /// Current metrics in the Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    /// Span covering one relationship query
    pub fn resolve_span(entity: &str, field: &str, relationship: &'static str) -> Span {
        tracing::debug_span!(
            "lifeline.resolve",
            entity = entity,
            field = field,
            relationship = relationship
        )
    }
}
