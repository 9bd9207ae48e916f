//! Prometheus metrics for the Regflow Validation Agent
//!
//! - `regflow_validations_total` (counter) - validations by engine and outcome
//! - `regflow_issues_total` (counter) - issues by code and blocking flag
//! - `regflow_validation_duration_seconds` (histogram) - engine run time
//! - `regflow_ledger_appends_total` (counter) - ledger appends by result
//! - `regflow_ledger_verify_failures_total` (counter) - broken-chain reports

use prometheus::{CounterVec, HistogramOpts, HistogramVec, IntCounter, Opts, Registry};
use std::sync::Arc;
use std::time::Instant;

use super::{Result, TelemetryError};
use crate::contracts::{DecisionOutcome, ValidationIssue};

/// Validation metrics for Prometheus
pub struct ValidationMetrics {
    validations_total: CounterVec,
    issues_total: CounterVec,
    duration_seconds: HistogramVec,
    ledger_appends_total: CounterVec,
    ledger_verify_failures_total: IntCounter,
}

impl ValidationMetrics {
    /// Create the metrics and register them with the provided registry
    pub fn new(registry: Arc<Registry>) -> Result<Self> {
        let validations_total = CounterVec::new(
            Opts::new("validations_total", "Total number of validations by engine and outcome")
                .namespace("regflow"),
            &["engine", "outcome"],
        )?;

        let issues_total = CounterVec::new(
            Opts::new("issues_total", "Total number of validation issues by code")
                .namespace("regflow"),
            &["code", "blocking"],
        )?;

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "validation_duration_seconds",
                "Validation engine duration in seconds",
            )
            .namespace("regflow")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["engine"],
        )?;

        let ledger_appends_total = CounterVec::new(
            Opts::new("ledger_appends_total", "Total number of audit ledger appends")
                .namespace("regflow"),
            &["result"],
        )?;

        let ledger_verify_failures_total = IntCounter::with_opts(
            Opts::new(
                "ledger_verify_failures_total",
                "Number of chain verifications that found a broken link",
            )
            .namespace("regflow"),
        )?;

        registry.register(Box::new(validations_total.clone()))?;
        registry.register(Box::new(issues_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(ledger_appends_total.clone()))?;
        registry.register(Box::new(ledger_verify_failures_total.clone()))?;

        Ok(Self {
            validations_total,
            issues_total,
            duration_seconds,
            ledger_appends_total,
            ledger_verify_failures_total,
        })
    }

    /// Record a completed validation and its issues
    pub fn record_validation(
        &self,
        engine: &str,
        outcome: DecisionOutcome,
        issues: &[ValidationIssue],
    ) {
        self.validations_total
            .with_label_values(&[engine, outcome.as_str()])
            .inc();
        for issue in issues {
            let blocking = if issue.blocking { "true" } else { "false" };
            self.issues_total
                .with_label_values(&[issue.code.as_str(), blocking])
                .inc();
        }
    }

    /// Observe engine duration
    pub fn observe_duration(&self, engine: &str, duration_secs: f64) {
        self.duration_seconds
            .with_label_values(&[engine])
            .observe(duration_secs);
    }

    /// Record a ledger append attempt
    pub fn record_append(&self, success: bool) {
        let result = if success { "success" } else { "failure" };
        self.ledger_appends_total.with_label_values(&[result]).inc();
    }

    /// Record a broken-chain verification
    pub fn record_verify_failure(&self) {
        self.ledger_verify_failures_total.inc();
    }

    /// Start an engine timer (records duration on drop)
    pub fn start_timer<'a>(&'a self, engine: &'a str) -> ValidationTimer<'a> {
        ValidationTimer {
            start: Instant::now(),
            engine,
            metrics: self,
        }
    }
}

/// RAII guard for timing validations
pub struct ValidationTimer<'a> {
    start: Instant,
    engine: &'a str,
    metrics: &'a ValidationMetrics,
}

impl<'a> Drop for ValidationTimer<'a> {
    fn drop(&mut self) {
        self.metrics
            .observe_duration(self.engine, self.start.elapsed().as_secs_f64());
    }
}

/// Registry for all agent metrics
pub struct ValidationMetricsRegistry {
    registry: Arc<Registry>,
    validation: ValidationMetrics,
}

impl ValidationMetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let validation = ValidationMetrics::new(Arc::clone(&registry))?;
        Ok(Self {
            registry,
            validation,
        })
    }

    /// Get validation metrics
    pub fn validation(&self) -> &ValidationMetrics {
        &self.validation
    }

    /// Encode metrics as text for scraping
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| TelemetryError::MetricsError(prometheus::Error::Msg(e.to_string())))
    }
}
