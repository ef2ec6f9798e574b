//! # Structured Logging Module
//!
//! Environment-aware structured logging for batch invocations. Output is JSON
//! on stdout so that the function's log stream stays machine readable.

use crate::constants::{defaults, env_vars, operations};
use crate::processing::errors::{AggregateProcessingError, RecordError};
use crate::processing::policy::ErrorHandlingPolicy;
use crate::processing::result::BatchSummary;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// `RUST_LOG` takes precedence over the environment's default level. Safe to
/// call more than once, and tolerates a subscriber installed by the host.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_ansi(false)
                .with_filter(filter),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            log_level = log_level,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env_vars::ENVIRONMENT)
        .or_else(|_| std::env::var(env_vars::APP_ENVIRONMENT))
        .unwrap_or_else(|_| defaults::ENVIRONMENT.to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "test" => "debug",
        "development" => "debug",
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for batch-level operations
pub fn log_batch_operation(
    operation: &str,
    source: &str,
    batch_size: usize,
    policy: ErrorHandlingPolicy,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        source = %source,
        batch_size = batch_size,
        policy = %policy,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📦 BATCH_OPERATION"
    );
}

pub fn log_batch_completed(source: &str, policy: ErrorHandlingPolicy, summary: &BatchSummary) {
    tracing::info!(
        operation = operations::BATCH_COMPLETED,
        source = %source,
        policy = %policy,
        total = summary.total,
        succeeded = summary.succeeded,
        handler_failed = summary.handler_failed,
        circuit_broken = summary.circuit_broken,
        unprocessed = summary.unprocessed,
        timestamp = %Utc::now().to_rfc3339(),
        "✅ BATCH_COMPLETED"
    );
}

pub fn log_batch_escalated(source: &str, aggregate: &AggregateProcessingError) {
    let cause = aggregate.circuit_breaker_cause().map(|e| format!("{e:#}"));
    log_error(
        source,
        operations::BATCH_ESCALATED,
        &aggregate.to_string(),
        cause.as_deref(),
    );
}

/// Log a handler failure for a single record
pub fn log_record_failure(error: &RecordError, position: usize) {
    let cause = error.handler_error().map(|e| format!("{e:#}"));
    tracing::warn!(
        operation = operations::RECORD_FAILED,
        record_id = %error.record_id(),
        position = position,
        kind = %error.kind(),
        cause = cause.as_deref(),
        timestamp = %Utc::now().to_rfc3339(),
        "⚠️ RECORD_FAILED"
    );
}

pub fn log_circuit_broken(record_id: &str, position: usize, remaining: Option<usize>) {
    tracing::warn!(
        operation = operations::CIRCUIT_BROKEN,
        record_id = %record_id,
        position = position,
        remaining = remaining,
        timestamp = %Utc::now().to_rfc3339(),
        "🛑 CIRCUIT_BROKEN: stopping batch at first failure"
    );
}

/// Observer failures are reported and otherwise ignored
pub fn log_observer_failure(component: &str, subject: &str, error: &str) {
    tracing::warn!(
        operation = operations::OBSERVER_FAILED,
        component = %component,
        subject = %subject,
        error = %error,
        timestamp = %Utc::now().to_rfc3339(),
        "👀 OBSERVER_FAILED"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
