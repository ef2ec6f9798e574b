//! # Result Aggregation
//!
//! Per-record outcome bookkeeping for one invocation. Every slot starts out as
//! unprocessed so that an interrupted loop never drops a record silently; the
//! engine then overwrites slots as handlers complete.

use crate::extractor::BatchRecord;
use crate::processing::errors::{AggregateProcessingError, RecordError};
use crate::processing::outcome::{RecordFailure, RecordSuccess};
use crate::processing::policy::ErrorHandlingPolicy;
use crate::processing::result::ProcessingResult;

#[derive(Debug)]
enum Slot {
    Unprocessed,
    Succeeded(Option<serde_json::Value>),
    Failed(RecordError),
}

#[derive(Debug, Default)]
pub(crate) struct OutcomeTable {
    slots: Vec<Slot>,
}

impl OutcomeTable {
    pub(crate) fn new(batch_size: usize) -> Self {
        let slots = (0..batch_size).map(|_| Slot::Unprocessed).collect();
        Self { slots }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn record_success(&mut self, position: usize, data: Option<serde_json::Value>) {
        self.slots[position] = Slot::Succeeded(data);
    }

    pub(crate) fn record_failure(&mut self, position: usize, error: RecordError) {
        self.slots[position] = Slot::Failed(error);
    }

    /// Marks the failure at `position` as the one that stopped the batch
    pub(crate) fn mark_circuit_broken(&mut self, position: usize) {
        let slot = std::mem::replace(&mut self.slots[position], Slot::Unprocessed);
        self.slots[position] = match slot {
            Slot::Failed(error) => Slot::Failed(error.into_circuit_broken()),
            other => other,
        };
    }

    pub(crate) fn success_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Succeeded(_)))
            .count()
    }

    /// Moves every record into its outcome, in batch order
    pub(crate) fn into_result<R>(
        self,
        batch_records: Vec<BatchRecord<R>>,
        policy: ErrorHandlingPolicy,
    ) -> ProcessingResult<R> {
        debug_assert_eq!(self.slots.len(), batch_records.len());
        let batch_size = batch_records.len();
        let mut successes = Vec::new();
        let mut failures = Vec::new();

        let slots = batch_records.into_iter().zip(self.slots);
        for (position, (BatchRecord { record_id, record }, slot)) in slots.enumerate() {
            match slot {
                Slot::Succeeded(data) => successes.push(RecordSuccess {
                    record_id,
                    position,
                    record,
                    data,
                }),
                Slot::Failed(error) => failures.push(RecordFailure {
                    record_id,
                    position,
                    record,
                    error,
                }),
                Slot::Unprocessed => failures.push(RecordFailure {
                    error: RecordError::Unprocessed {
                        record_id: record_id.clone(),
                    },
                    record_id,
                    position,
                    record,
                }),
            }
        }

        ProcessingResult::new(batch_size, successes, failures, policy)
    }

    /// Bundles one error per unsuccessful record, in batch order
    pub(crate) fn into_aggregate_error<R>(
        self,
        batch_records: &[BatchRecord<R>],
    ) -> AggregateProcessingError {
        let errors = batch_records
            .iter()
            .zip(self.slots)
            .filter_map(|(batch_record, slot)| match slot {
                Slot::Succeeded(_) => None,
                Slot::Failed(error) => Some(error),
                Slot::Unprocessed => Some(RecordError::Unprocessed {
                    record_id: batch_record.record_id.clone(),
                }),
            })
            .collect();
        AggregateProcessingError::new(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::errors::FailureKind;
    use anyhow::anyhow;

    fn records(ids: &[&str]) -> Vec<BatchRecord<String>> {
        ids.iter()
            .map(|id| BatchRecord {
                record_id: id.to_string(),
                record: format!("payload-{id}"),
            })
            .collect()
    }

    #[test]
    fn test_untouched_slots_are_unprocessed() {
        let table = OutcomeTable::new(2);
        let result = table.into_result(records(&["a", "b"]), ErrorHandlingPolicy::StopOnFirstFailure);

        assert!(result.successes().is_empty());
        assert_eq!(result.failed_record_ids(), vec!["a", "b"]);
        assert!(result
            .failures()
            .iter()
            .all(|f| f.kind() == FailureKind::Unprocessed));
    }

    #[test]
    fn test_partition_and_order() {
        let mut table = OutcomeTable::new(4);
        table.record_success(2, Some(serde_json::json!("ok")));
        table.record_failure(3, RecordError::handler_failed("d", anyhow!("boom")));
        table.record_success(0, None);
        table.record_failure(1, RecordError::handler_failed("b", anyhow!("boom")));

        assert_eq!(table.success_count(), 2);
        let result = table.into_result(
            records(&["a", "b", "c", "d"]),
            ErrorHandlingPolicy::ContinueOnFailure,
        );

        let success_ids: Vec<_> = result.successes().iter().map(|s| s.record_id.as_str()).collect();
        assert_eq!(success_ids, vec!["a", "c"]);
        assert_eq!(result.failed_record_ids(), vec!["b", "d"]);
        assert_eq!(result.successes()[1].data, Some(serde_json::json!("ok")));
        assert_eq!(result.batch_size(), 4);
        assert_eq!(result.failures()[0].record, "payload-b");
    }

    #[test]
    fn test_records_move_into_outcomes_without_cloning() {
        // Deliberately not Clone
        #[derive(Debug, PartialEq)]
        struct Payload(u32);

        let batch = vec![
            BatchRecord::new("a", Payload(1)),
            BatchRecord::new("b", Payload(2)),
            BatchRecord::new("c", Payload(3)),
        ];
        let mut table = OutcomeTable::new(3);
        table.record_success(0, None);
        table.record_failure(1, RecordError::handler_failed("b", anyhow!("boom")));

        let result = table.into_result(batch, ErrorHandlingPolicy::ContinueOnFailure);

        assert_eq!(result.successes()[0].record, Payload(1));
        assert_eq!(result.failures()[0].record, Payload(2));
        assert_eq!(result.failures()[1].record, Payload(3));
        let records: Vec<_> = result.batch_records().into_iter().map(|(_, r)| r.0).collect();
        assert_eq!(records, vec![1, 2, 3]);
    }

    #[test]
    fn test_mark_circuit_broken_only_relabels_failures() {
        let mut table = OutcomeTable::new(2);
        table.record_failure(0, RecordError::handler_failed("a", anyhow!("boom")));
        table.mark_circuit_broken(0);
        table.mark_circuit_broken(1);

        let result = table.into_result(records(&["a", "b"]), ErrorHandlingPolicy::StopOnFirstFailure);
        assert_eq!(result.failures()[0].kind(), FailureKind::CircuitBroken);
        assert_eq!(result.failures()[1].kind(), FailureKind::Unprocessed);
    }

    #[test]
    fn test_aggregate_error_covers_every_record() {
        let mut table = OutcomeTable::new(3);
        table.record_failure(0, RecordError::handler_failed("a", anyhow!("boom")));
        table.mark_circuit_broken(0);

        let aggregate = table.into_aggregate_error(&records(&["a", "b", "c"]));
        assert_eq!(aggregate.record_ids(), vec!["a", "b", "c"]);
        let kinds: Vec<_> = aggregate.errors().iter().map(RecordError::kind).collect();
        assert_eq!(
            kinds,
            vec![
                FailureKind::CircuitBroken,
                FailureKind::Unprocessed,
                FailureKind::Unprocessed
            ]
        );
    }
}
