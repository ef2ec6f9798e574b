//! Event builders and a recording handler shared by the integration suites.

use anyhow::bail;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use batch_core::models::{
    DynamoDbEvent, DynamoDbEventRecord, KinesisEvent, KinesisEventRecord, KinesisRecord,
    SqsEvent, SqsMessage, StreamRecord,
};
use batch_core::processing::{HandlerError, RecordContext, RecordHandler, RecordHandlerResult};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const STANDARD_QUEUE_ARN: &str = "arn:aws:sqs:us-east-1:123456789012:orders";
pub const FIFO_QUEUE_ARN: &str = "arn:aws:sqs:us-east-1:123456789012:orders.fifo";

/// Builds a queue event whose messages carry `{"order_id": <id>}` bodies
pub fn sqs_event(ids: &[&str], queue_arn: &str) -> SqsEvent {
    SqsEvent {
        records: ids
            .iter()
            .map(|id| SqsMessage {
                message_id: Some(id.to_string()),
                body: json!({"order_id": id}).to_string(),
                event_source: Some("aws:sqs".to_string()),
                event_source_arn: Some(queue_arn.to_string()),
                ..Default::default()
            })
            .collect(),
    }
}

pub fn kinesis_event(records: &[(&str, serde_json::Value)]) -> KinesisEvent {
    KinesisEvent {
        records: records
            .iter()
            .map(|(sequence_number, payload)| KinesisEventRecord {
                event_source: Some("aws:kinesis".to_string()),
                kinesis: KinesisRecord {
                    data: STANDARD.encode(payload.to_string()),
                    partition_key: "partition-1".to_string(),
                    sequence_number: Some(sequence_number.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            })
            .collect(),
    }
}

/// Builds a change stream of inserts with a string `Name` attribute
pub fn dynamodb_event(records: &[(&str, &str)]) -> DynamoDbEvent {
    DynamoDbEvent {
        records: records
            .iter()
            .map(|(sequence_number, name)| DynamoDbEventRecord {
                event_name: Some("INSERT".to_string()),
                event_source: Some("aws:dynamodb".to_string()),
                dynamodb: StreamRecord {
                    sequence_number: Some(sequence_number.to_string()),
                    new_image: Some(HashMap::from([
                        ("Name".to_string(), json!({"S": name})),
                        ("Sequence".to_string(), json!({"N": sequence_number})),
                    ])),
                    ..Default::default()
                },
                ..Default::default()
            })
            .collect(),
    }
}

/// Handler that records the ids it was invoked with and fails on demand
#[derive(Default)]
pub struct RecordingHandler {
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, ids: &[&str]) -> Self {
        self.failing.extend(ids.iter().map(|id| id.to_string()));
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    /// Ids in invocation order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait::async_trait]
impl<R: Send + Sync> RecordHandler<R> for RecordingHandler {
    async fn handle(
        &self,
        _record: &R,
        context: &RecordContext,
    ) -> Result<RecordHandlerResult, HandlerError> {
        self.calls.lock().push(context.record_id.clone());
        if let Some(delay) = self.delays.get(&context.record_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&context.record_id) {
            bail!("induced failure for {}", context.record_id);
        }
        Ok(RecordHandlerResult::with_data(
            json!({"processed": context.record_id}),
        ))
    }
}
