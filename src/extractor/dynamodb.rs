use crate::constants::event_sources;
use crate::extractor::RecordExtractor;
use crate::models::{DynamoDbEvent, DynamoDbEventRecord};
use crate::processing::policy::SourceOrdering;

/// Table change records identified by `SequenceNumber`. Always ordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamoDbStreamExtractor;

impl RecordExtractor for DynamoDbStreamExtractor {
    type Event = DynamoDbEvent;
    type Record = DynamoDbEventRecord;

    fn source_name(&self) -> &'static str {
        event_sources::DYNAMODB
    }

    fn records(&self, event: &DynamoDbEvent) -> Vec<DynamoDbEventRecord> {
        event.records.clone()
    }

    fn record_id(&self, record: &DynamoDbEventRecord) -> Option<String> {
        record.dynamodb.sequence_number.clone()
    }

    fn ordering(&self, _event: &DynamoDbEvent) -> SourceOrdering {
        SourceOrdering::Ordered
    }
}
