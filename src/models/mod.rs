//! # Event Models
//!
//! Serde shapes of the batch events the engine understands out of the box.
//! Each record type implements [`RecordBody`] so that typed handlers can
//! decode its payload.

pub mod dynamodb;
pub mod kinesis;
pub mod sqs;

pub use dynamodb::{DynamoDbEvent, DynamoDbEventRecord, StreamRecord};
pub use kinesis::{KinesisEvent, KinesisEventRecord, KinesisRecord};
pub use sqs::{SqsEvent, SqsMessage, SqsMessageAttribute};

use crate::processing::errors::HandlerError;
use serde::de::DeserializeOwned;

/// Records that carry a JSON payload
pub trait RecordBody {
    fn deserialize_body<T: DeserializeOwned>(&self) -> Result<T, HandlerError>;
}
