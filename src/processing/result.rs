//! # Processing Results
//!
//! [`ProcessingResult`] is what the engine hands back to the caller.
//! [`PartialFailureResponse`] is the subset the invoking platform understands:
//! the ids to redeliver, serialized as
//! `{"batchItemFailures":[{"itemIdentifier":"..."}]}`.

use crate::processing::errors::FailureKind;
use crate::processing::outcome::{RecordFailure, RecordOutcome, RecordSuccess};
use crate::processing::policy::ErrorHandlingPolicy;
use serde::{Deserialize, Serialize};

/// One id the platform must redeliver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    pub item_identifier: String,
}

/// Partial batch failure response returned to the invoking platform.
///
/// An empty list means the whole batch succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialFailureResponse {
    pub batch_item_failures: Vec<BatchItemFailure>,
}

impl PartialFailureResponse {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            batch_item_failures: ids
                .into_iter()
                .map(|id| BatchItemFailure {
                    item_identifier: id.into(),
                })
                .collect(),
        }
    }

    pub fn failed_record_ids(&self) -> Vec<&str> {
        self.batch_item_failures
            .iter()
            .map(|f| f.item_identifier.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.batch_item_failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.batch_item_failures.len()
    }
}

/// Outcome counts of one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub handler_failed: usize,
    pub circuit_broken: usize,
    pub unprocessed: usize,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.handler_failed + self.circuit_broken + self.unprocessed
    }
}

/// Terminal aggregate of one engine invocation.
///
/// Every record of the batch appears in exactly one of [`successes`] or
/// [`failures`], both kept in batch order. Each record is owned by its
/// outcome; [`batch_records`] merges them back into delivery order.
///
/// [`successes`]: ProcessingResult::successes
/// [`failures`]: ProcessingResult::failures
/// [`batch_records`]: ProcessingResult::batch_records
#[derive(Debug)]
pub struct ProcessingResult<R> {
    batch_size: usize,
    successes: Vec<RecordSuccess<R>>,
    failures: Vec<RecordFailure<R>>,
    response: PartialFailureResponse,
    policy: ErrorHandlingPolicy,
}

impl<R> ProcessingResult<R> {
    pub(crate) fn new(
        batch_size: usize,
        successes: Vec<RecordSuccess<R>>,
        failures: Vec<RecordFailure<R>>,
        policy: ErrorHandlingPolicy,
    ) -> Self {
        let response =
            PartialFailureResponse::from_ids(failures.iter().map(|f| f.record_id.clone()));
        Self {
            batch_size,
            successes,
            failures,
            response,
            policy,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// `(record id, record)` for every record of the batch, in delivery order
    pub fn batch_records(&self) -> Vec<(&str, &R)> {
        let mut records = Vec::with_capacity(self.batch_size);
        let mut successes = self.successes.iter().peekable();
        let mut failures = self.failures.iter().peekable();

        loop {
            let take_success = match (successes.peek(), failures.peek()) {
                (Some(success), Some(failure)) => success.position < failure.position,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            if take_success {
                if let Some(success) = successes.next() {
                    records.push((success.record_id.as_str(), &success.record));
                }
            } else if let Some(failure) = failures.next() {
                records.push((failure.record_id.as_str(), &failure.record));
            }
        }

        records
    }

    pub fn successes(&self) -> &[RecordSuccess<R>] {
        &self.successes
    }

    pub fn failures(&self) -> &[RecordFailure<R>] {
        &self.failures
    }

    pub fn response(&self) -> &PartialFailureResponse {
        &self.response
    }

    pub fn into_response(self) -> PartialFailureResponse {
        self.response
    }

    pub fn policy(&self) -> ErrorHandlingPolicy {
        self.policy
    }

    pub fn is_full_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_record_ids(&self) -> Vec<&str> {
        self.response.failed_record_ids()
    }

    pub fn failures_of_kind(&self, kind: FailureKind) -> impl Iterator<Item = &RecordFailure<R>> {
        self.failures.iter().filter(move |f| f.kind() == kind)
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.batch_size,
            succeeded: self.successes.len(),
            ..Default::default()
        };
        for failure in &self.failures {
            match failure.kind() {
                FailureKind::HandlerFailed => summary.handler_failed += 1,
                FailureKind::CircuitBroken => summary.circuit_broken += 1,
                FailureKind::Unprocessed => summary.unprocessed += 1,
            }
        }
        summary
    }

    /// Every outcome merged back into batch order
    pub fn into_outcomes(self) -> Vec<RecordOutcome<R>> {
        let mut outcomes: Vec<RecordOutcome<R>> = self
            .successes
            .into_iter()
            .map(RecordOutcome::Success)
            .chain(self.failures.into_iter().map(RecordOutcome::Failure))
            .collect();
        outcomes.sort_by_key(RecordOutcome::position);
        outcomes
    }
}
