//! Stream batch event. Record payloads arrive base64 encoded.

use crate::models::RecordBody;
use crate::processing::errors::HandlerError;
use anyhow::Context as _;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KinesisEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<KinesisEventRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisEventRecord {
    #[serde(default)]
    pub aws_region: Option<String>,
    #[serde(rename = "eventID", default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub event_source: Option<String>,
    #[serde(rename = "eventSourceARN", default)]
    pub event_source_arn: Option<String>,
    #[serde(default)]
    pub event_version: Option<String>,
    #[serde(rename = "invokeIdentityArn", default)]
    pub invoke_identity_arn: Option<String>,
    pub kinesis: KinesisRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisRecord {
    #[serde(default)]
    pub approximate_arrival_timestamp: Option<f64>,
    /// Base64 encoded payload
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub encryption_type: Option<String>,
    #[serde(default)]
    pub partition_key: String,
    #[serde(default)]
    pub sequence_number: Option<String>,
    #[serde(default)]
    pub kinesis_schema_version: Option<String>,
}

impl KinesisRecord {
    pub fn decoded_data(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

impl RecordBody for KinesisEventRecord {
    fn deserialize_body<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let bytes = self
            .kinesis
            .decoded_data()
            .context("record data is not valid base64")?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
