//! # Failure Taxonomy
//!
//! Every record that did not complete successfully carries exactly one
//! [`RecordError`]. The same values are bundled into an
//! [`AggregateProcessingError`] when the batch has to be retried as a unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type returned by record handlers.
///
/// Handlers can `?` any error type; the original error is preserved as the
/// source of the resulting [`RecordError`].
pub type HandlerError = anyhow::Error;

/// Discriminant of a [`RecordError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The handler was never invoked for the record
    Unprocessed,
    /// The handler ran and failed
    HandlerFailed,
    /// The handler failed and this failure stopped the batch
    CircuitBroken,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Unprocessed => write!(f, "Unprocessed"),
            FailureKind::HandlerFailed => write!(f, "Handler Failed"),
            FailureKind::CircuitBroken => write!(f, "Circuit Broken"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Record {record_id} was not processed: batch processing stopped before reaching it")]
    Unprocessed { record_id: String },

    #[error("Record handler failed for {record_id}: {source}")]
    HandlerFailed {
        record_id: String,
        #[source]
        source: HandlerError,
    },

    #[error("Record handler failed for {record_id} and stopped the batch: {source}")]
    CircuitBroken {
        record_id: String,
        #[source]
        source: HandlerError,
    },
}

impl RecordError {
    pub fn handler_failed(record_id: impl Into<String>, source: HandlerError) -> Self {
        RecordError::HandlerFailed {
            record_id: record_id.into(),
            source,
        }
    }

    pub fn record_id(&self) -> &str {
        match self {
            RecordError::Unprocessed { record_id }
            | RecordError::HandlerFailed { record_id, .. }
            | RecordError::CircuitBroken { record_id, .. } => record_id,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            RecordError::Unprocessed { .. } => FailureKind::Unprocessed,
            RecordError::HandlerFailed { .. } => FailureKind::HandlerFailed,
            RecordError::CircuitBroken { .. } => FailureKind::CircuitBroken,
        }
    }

    /// The error raised by the handler, if the handler ran at all
    pub fn handler_error(&self) -> Option<&HandlerError> {
        match self {
            RecordError::Unprocessed { .. } => None,
            RecordError::HandlerFailed { source, .. } | RecordError::CircuitBroken { source, .. } => {
                Some(source)
            }
        }
    }

    pub fn was_attempted(&self) -> bool {
        !matches!(self, RecordError::Unprocessed { .. })
    }

    /// Re-labels a handler failure as the one that tripped the breaker.
    pub(crate) fn into_circuit_broken(self) -> Self {
        match self {
            RecordError::HandlerFailed { record_id, source } => {
                RecordError::CircuitBroken { record_id, source }
            }
            other => other,
        }
    }
}

/// Raised instead of a partial result when nothing in the batch succeeded
/// under a stop-on-first-failure policy.
///
/// Holds one error per record, in batch order.
#[derive(Debug, Error)]
#[error("{}", summarize(.errors))]
pub struct AggregateProcessingError {
    errors: Vec<RecordError>,
}

impl AggregateProcessingError {
    pub fn new(errors: Vec<RecordError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[RecordError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<RecordError> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn record_ids(&self) -> Vec<&str> {
        self.errors.iter().map(RecordError::record_id).collect()
    }

    pub fn attempted_count(&self) -> usize {
        self.errors.iter().filter(|e| e.was_attempted()).count()
    }

    pub fn unprocessed_count(&self) -> usize {
        self.errors.len() - self.attempted_count()
    }

    /// The handler error of the record that stopped the batch
    pub fn circuit_breaker_cause(&self) -> Option<&HandlerError> {
        self.errors
            .iter()
            .find(|e| e.kind() == FailureKind::CircuitBroken)
            .and_then(RecordError::handler_error)
    }
}

fn summarize(errors: &[RecordError]) -> String {
    let attempted = errors.iter().filter(|e| e.was_attempted()).count();
    format!(
        "All {} records of the batch failed ({} attempted, {} unprocessed); the entire batch must be retried",
        errors.len(),
        attempted,
        errors.len() - attempted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::error::Error as _;

    #[test]
    fn test_kind_and_record_id() {
        let err = RecordError::handler_failed("msg-1", anyhow!("boom"));
        assert_eq!(err.kind(), FailureKind::HandlerFailed);
        assert_eq!(err.record_id(), "msg-1");
        assert!(err.was_attempted());

        let err = RecordError::Unprocessed {
            record_id: "msg-2".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::Unprocessed);
        assert!(err.handler_error().is_none());
        assert!(!err.was_attempted());
    }

    #[test]
    fn test_into_circuit_broken_keeps_cause() {
        let err = RecordError::handler_failed("msg-1", anyhow!("downstream unavailable"))
            .into_circuit_broken();

        assert_eq!(err.kind(), FailureKind::CircuitBroken);
        assert_eq!(
            err.handler_error().map(|e| e.to_string()),
            Some("downstream unavailable".to_string())
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_into_circuit_broken_leaves_unprocessed_alone() {
        let err = RecordError::Unprocessed {
            record_id: "msg-3".to_string(),
        }
        .into_circuit_broken();
        assert_eq!(err.kind(), FailureKind::Unprocessed);
    }

    #[test]
    fn test_aggregate_counts() {
        let aggregate = AggregateProcessingError::new(vec![
            RecordError::handler_failed("1", anyhow!("bad payload")).into_circuit_broken(),
            RecordError::Unprocessed {
                record_id: "2".to_string(),
            },
            RecordError::Unprocessed {
                record_id: "3".to_string(),
            },
        ]);

        assert_eq!(aggregate.len(), 3);
        assert_eq!(aggregate.attempted_count(), 1);
        assert_eq!(aggregate.unprocessed_count(), 2);
        assert_eq!(aggregate.record_ids(), vec!["1", "2", "3"]);
        assert_eq!(
            aggregate.circuit_breaker_cause().map(|e| e.to_string()),
            Some("bad payload".to_string())
        );
        assert_eq!(
            aggregate.to_string(),
            "All 3 records of the batch failed (1 attempted, 2 unprocessed); the entire batch must be retried"
        );
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::CircuitBroken).unwrap();
        assert_eq!(json, "\"circuit_broken\"");
    }
}
