use crate::processing::errors::{FailureKind, RecordError};

/// A record the handler processed successfully
#[derive(Debug, Clone)]
pub struct RecordSuccess<R> {
    pub record_id: String,
    pub position: usize,
    pub record: R,
    /// Auxiliary value returned by the handler
    pub data: Option<serde_json::Value>,
}

/// A record that must be retried
#[derive(Debug)]
pub struct RecordFailure<R> {
    pub record_id: String,
    pub position: usize,
    pub record: R,
    pub error: RecordError,
}

impl<R> RecordFailure<R> {
    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }
}

/// Terminal state of one record after an engine invocation
#[derive(Debug)]
pub enum RecordOutcome<R> {
    Success(RecordSuccess<R>),
    Failure(RecordFailure<R>),
}

impl<R> RecordOutcome<R> {
    pub fn record_id(&self) -> &str {
        match self {
            RecordOutcome::Success(success) => &success.record_id,
            RecordOutcome::Failure(failure) => &failure.record_id,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            RecordOutcome::Success(success) => success.position,
            RecordOutcome::Failure(failure) => failure.position,
        }
    }

    pub fn record(&self) -> &R {
        match self {
            RecordOutcome::Success(success) => &success.record,
            RecordOutcome::Failure(failure) => &failure.record,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RecordOutcome::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RecordOutcome::Success(_) => None,
            RecordOutcome::Failure(failure) => Some(failure.kind()),
        }
    }
}
