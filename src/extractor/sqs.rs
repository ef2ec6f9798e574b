use crate::constants::event_sources;
use crate::extractor::RecordExtractor;
use crate::models::{SqsEvent, SqsMessage};
use crate::processing::policy::SourceOrdering;

/// Queue messages identified by `messageId`. FIFO queues are ordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqsExtractor;

impl RecordExtractor for SqsExtractor {
    type Event = SqsEvent;
    type Record = SqsMessage;

    fn source_name(&self) -> &'static str {
        event_sources::SQS
    }

    fn records(&self, event: &SqsEvent) -> Vec<SqsMessage> {
        event.records.clone()
    }

    fn record_id(&self, record: &SqsMessage) -> Option<String> {
        record.message_id.clone()
    }

    fn ordering(&self, event: &SqsEvent) -> SourceOrdering {
        if event.is_fifo() {
            SourceOrdering::Ordered
        } else {
            SourceOrdering::Unordered
        }
    }
}
