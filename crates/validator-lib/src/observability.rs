//! Observability for template validation
//!
//! Provides:
//! - Prometheus metrics (validation outcomes, rejection kinds, latency)
//! - Structured logging of validation results with tracing

use crate::error::ValidatorError;
use crate::validator::ValidationOutcome;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for validation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ValidatorMetricsInner> = OnceLock::new();

struct ValidatorMetricsInner {
    validations: IntCounterVec,
    rejections: IntCounterVec,
    validation_latency_seconds: Histogram,
}

impl ValidatorMetricsInner {
    fn new() -> Self {
        Self {
            validations: register_int_counter_vec!(
                "template_validator_validations_total",
                "Template validations by outcome (valid, rejected, error)",
                &["outcome"]
            )
            .expect("Failed to register validations_total"),

            rejections: register_int_counter_vec!(
                "template_validator_rejections_total",
                "Rejected templates by rejection kind",
                &["kind"]
            )
            .expect("Failed to register rejections_total"),

            validation_latency_seconds: register_histogram!(
                "template_validator_validation_latency_seconds",
                "Time spent validating a template, schema load included",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register validation_latency_seconds"),
        }
    }
}

/// Validator metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Debug, Clone)]
pub struct ValidatorMetrics {
    _private: (),
}

impl Default for ValidatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorMetrics {
    /// Create a new metrics handle (registers global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ValidatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ValidatorMetricsInner {
        GLOBAL_METRICS.get_or_init(ValidatorMetricsInner::new)
    }

    pub fn observe_validation_latency(&self, duration_secs: f64) {
        self.inner().validation_latency_seconds.observe(duration_secs);
    }

    /// Count a completed validation and, if rejected, its rejection kind
    pub fn record_outcome(&self, outcome: &ValidationOutcome) {
        match outcome.rejection() {
            None => self.inner().validations.with_label_values(&["valid"]).inc(),
            Some(rejection) => {
                self.inner().validations.with_label_values(&["rejected"]).inc();
                self.inner()
                    .rejections
                    .with_label_values(&[rejection.kind()])
                    .inc();
            }
        }
    }

    /// Count a validation that could not run
    pub fn inc_errors(&self) {
        self.inner().validations.with_label_values(&["error"]).inc();
    }

    pub fn validations(&self, outcome: &str) -> u64 {
        self.inner().validations.with_label_values(&[outcome]).get()
    }

    pub fn rejections(&self, kind: &str) -> u64 {
        self.inner().rejections.with_label_values(&[kind]).get()
    }
}

/// Render every registered metric in the Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Structured logger for validation events
#[derive(Debug, Clone)]
pub struct ValidationLogger {
    source: String,
}

impl Default for ValidationLogger {
    fn default() -> Self {
        Self::new("template-validator")
    }
}

impl ValidationLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Log the result of a completed validation
    pub fn log_outcome(&self, schema: &str, outcome: &ValidationOutcome) {
        match outcome.rejection() {
            None => {
                info!(
                    event = "template_validated",
                    source = %self.source,
                    schema = %schema,
                    valid = true,
                    "Template accepted"
                );
            }
            Some(rejection) => {
                info!(
                    event = "template_validated",
                    source = %self.source,
                    schema = %schema,
                    valid = false,
                    kind = rejection.kind(),
                    diagnostics = rejection.diagnostics().len(),
                    "Template rejected"
                );
            }
        }
    }

    /// Log a validation that could not run
    pub fn log_error(&self, schema: &str, error: &ValidatorError) {
        warn!(
            event = "template_validation_failed",
            source = %self.source,
            schema = %schema,
            error = %error,
            "Template validation could not complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rejection;
    use crate::models::{Bound, ResourceFamily, ResourceField, ResourceScope};

    #[test]
    fn test_metrics_count_outcomes() {
        let metrics = ValidatorMetrics::new();
        let rejected = ValidationOutcome::rejected(Rejection::MissingField(ResourceField::new(
            ResourceScope::Primary,
            ResourceFamily::Cpu,
            Bound::Limit,
        )));

        let valid_before = metrics.validations("valid");
        let missing_before = metrics.rejections("missing_field");

        metrics.record_outcome(&ValidationOutcome::valid());
        metrics.record_outcome(&rejected);
        metrics.observe_validation_latency(0.0002);

        // Other tests share the global registry, so only lower bounds hold
        assert!(metrics.validations("valid") > valid_before);
        assert!(metrics.rejections("missing_field") > missing_before);

        let text = encode_metrics().unwrap();
        assert!(text.contains("template_validator_validations_total"));
    }

    #[test]
    fn test_validation_logger_creation() {
        let logger = ValidationLogger::new("test-service");
        assert_eq!(logger.source, "test-service");
        assert_eq!(ValidationLogger::default().source, "template-validator");
    }
}
