//! # Record Extraction
//!
//! A [`RecordExtractor`] turns a source-specific batch event into the ordered
//! list of `(record id, record)` pairs the engine works on, and reports
//! whether the source guarantees delivery order.
//!
//! Failing to identify a record is a configuration problem with the caller's
//! adapter, not a record failure: extraction errors abort the invocation
//! before any handler runs.

pub mod custom;
pub mod dynamodb;
pub mod kinesis;
pub mod sqs;

pub use custom::FnExtractor;
pub use dynamodb::DynamoDbStreamExtractor;
pub use kinesis::KinesisExtractor;
pub use sqs::SqsExtractor;

use crate::error::{BatchError, Result};
use crate::processing::policy::SourceOrdering;
use std::collections::HashSet;

/// A record paired with the identifier reported back to the platform
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord<R> {
    pub record_id: String,
    pub record: R,
}

impl<R> BatchRecord<R> {
    pub fn new(record_id: impl Into<String>, record: R) -> Self {
        Self {
            record_id: record_id.into(),
            record,
        }
    }
}

pub trait RecordExtractor: Send + Sync {
    type Event: Sync;
    type Record: Clone + Send + Sync + 'static;

    /// Short source label used in logs
    fn source_name(&self) -> &'static str;

    /// Records of the event in delivery order
    fn records(&self, event: &Self::Event) -> Vec<Self::Record>;

    /// Identifier of a record, `None` if the record carries none
    fn record_id(&self, record: &Self::Record) -> Option<String>;

    fn ordering(&self, event: &Self::Event) -> SourceOrdering;

    /// Pairs every record with its identifier, preserving delivery order.
    ///
    /// Missing, empty and repeated identifiers are rejected.
    fn extract(&self, event: &Self::Event) -> Result<Vec<BatchRecord<Self::Record>>> {
        let mut seen = HashSet::new();
        self.records(event)
            .into_iter()
            .enumerate()
            .map(|(position, record)| {
                let record_id = self
                    .record_id(&record)
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| BatchError::ExtractionError {
                        position,
                        reason: format!("{} record has no identifier", self.source_name()),
                    })?;
                if !seen.insert(record_id.clone()) {
                    return Err(BatchError::DuplicateRecordId(record_id));
                }
                Ok(BatchRecord { record_id, record })
            })
            .collect()
    }
}
