use crate::constants::event_sources;
use crate::extractor::RecordExtractor;
use crate::models::{KinesisEvent, KinesisEventRecord};
use crate::processing::policy::SourceOrdering;

/// Stream records identified by their sequence number. Always ordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct KinesisExtractor;

impl RecordExtractor for KinesisExtractor {
    type Event = KinesisEvent;
    type Record = KinesisEventRecord;

    fn source_name(&self) -> &'static str {
        event_sources::KINESIS
    }

    fn records(&self, event: &KinesisEvent) -> Vec<KinesisEventRecord> {
        event.records.clone()
    }

    fn record_id(&self, record: &KinesisEventRecord) -> Option<String> {
        record.kinesis.sequence_number.clone()
    }

    fn ordering(&self, _event: &KinesisEvent) -> SourceOrdering {
        SourceOrdering::Ordered
    }
}
