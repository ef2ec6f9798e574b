//! Error types for batch processing.
//!
//! Record-level failures never surface here: they are captured as
//! [`RecordError`](crate::processing::RecordError)s inside the
//! [`ProcessingResult`](crate::processing::ProcessingResult). `BatchError` covers
//! the cases where the batch as a whole cannot be reported on.

use crate::processing::errors::AggregateProcessingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Extraction error for record at position {position}: {reason}")]
    ExtractionError { position: usize, reason: String },
    #[error("Duplicate record id in batch: {0}")]
    DuplicateRecordId(String),
    /// Nothing in the batch succeeded under a stop-on-first-failure policy.
    /// The whole batch must be retried.
    #[error(transparent)]
    ProcessingError(#[from] AggregateProcessingError),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BatchError {
    /// Returns the aggregate error when the whole batch failed.
    pub fn as_aggregate(&self) -> Option<&AggregateProcessingError> {
        match self {
            BatchError::ProcessingError(aggregate) => Some(aggregate),
            _ => None,
        }
    }

    pub fn is_full_batch_failure(&self) -> bool {
        matches!(self, BatchError::ProcessingError(_))
    }
}

impl From<serde_json::Error> for BatchError {
    fn from(error: serde_json::Error) -> Self {
        BatchError::SerializationError(format!("JSON serialization error: {error}"))
    }
}

impl From<config::ConfigError> for BatchError {
    fn from(error: config::ConfigError) -> Self {
        BatchError::ConfigurationError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::errors::RecordError;

    #[test]
    fn test_display_messages() {
        let err = BatchError::ExtractionError {
            position: 3,
            reason: "missing messageId".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Extraction error for record at position 3: missing messageId"
        );

        let err = BatchError::DuplicateRecordId("abc".to_string());
        assert_eq!(err.to_string(), "Duplicate record id in batch: abc");
    }

    #[test]
    fn test_aggregate_conversion() {
        let aggregate = AggregateProcessingError::new(vec![RecordError::Unprocessed {
            record_id: "1".to_string(),
        }]);
        let err: BatchError = aggregate.into();

        assert!(err.is_full_batch_failure());
        assert_eq!(err.as_aggregate().map(|a| a.len()), Some(1));
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: BatchError = parse_err.into();
        assert!(matches!(err, BatchError::SerializationError(_)));
        assert!(!err.is_full_batch_failure());
    }
}
