//! Table change stream event.
//!
//! Item images are delivered in the typed attribute-value encoding
//! (`{"S": "..."}`, `{"N": "..."}`, ...). [`unmarshal_image`] converts them to
//! plain JSON so they can be decoded like any other payload.

use crate::models::RecordBody;
use crate::processing::errors::HandlerError;
use anyhow::{anyhow, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

pub type AttributeMap = HashMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamoDbEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<DynamoDbEventRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamoDbEventRecord {
    #[serde(default)]
    pub aws_region: Option<String>,
    pub dynamodb: StreamRecord,
    #[serde(rename = "eventID", default)]
    pub event_id: Option<String>,
    /// `INSERT`, `MODIFY` or `REMOVE`
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub event_source: Option<String>,
    #[serde(rename = "eventSourceARN", default)]
    pub event_source_arn: Option<String>,
    #[serde(default)]
    pub event_version: Option<String>,
    #[serde(default)]
    pub user_identity: Option<Value>,
}

impl DynamoDbEventRecord {
    pub fn is_removal(&self) -> bool {
        self.event_name.as_deref() == Some("REMOVE")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamRecord {
    #[serde(default)]
    pub approximate_creation_date_time: Option<f64>,
    #[serde(default)]
    pub keys: AttributeMap,
    #[serde(default)]
    pub new_image: Option<AttributeMap>,
    #[serde(default)]
    pub old_image: Option<AttributeMap>,
    #[serde(default)]
    pub sequence_number: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub stream_view_type: Option<String>,
}

impl RecordBody for DynamoDbEventRecord {
    /// Decodes `NewImage`, or `OldImage` for removals
    fn deserialize_body<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let image = if self.is_removal() {
            self.dynamodb.old_image.as_ref()
        } else {
            self.dynamodb.new_image.as_ref()
        };
        let image = image.ok_or_else(|| anyhow!("stream record carries no item image"))?;
        Ok(serde_json::from_value(unmarshal_image(image)?)?)
    }
}

/// Converts an attribute-value encoded item into plain JSON
pub fn unmarshal_image(image: &AttributeMap) -> Result<Value, HandlerError> {
    let mut object = Map::with_capacity(image.len());
    for (name, attribute) in image {
        object.insert(name.clone(), unmarshal_attribute(attribute)?);
    }
    Ok(Value::Object(object))
}

fn unmarshal_attribute(attribute: &Value) -> Result<Value, HandlerError> {
    let Some((tag, value)) = attribute.as_object().and_then(|o| o.iter().next()) else {
        bail!("malformed attribute value: {attribute}");
    };

    match (tag.as_str(), value) {
        ("S", Value::String(_)) | ("B", Value::String(_)) => Ok(value.clone()),
        ("BOOL", Value::Bool(_)) => Ok(value.clone()),
        ("NULL", _) => Ok(Value::Null),
        ("N", Value::String(n)) => parse_number(n),
        ("SS", Value::Array(_)) | ("BS", Value::Array(_)) => Ok(value.clone()),
        ("NS", Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(n) => parse_number(n),
                other => Err(anyhow!("number set member is not a string: {other}")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        ("L", Value::Array(items)) => items
            .iter()
            .map(unmarshal_attribute)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        ("M", Value::Object(map)) => {
            let mut object = Map::with_capacity(map.len());
            for (name, nested) in map {
                object.insert(name.clone(), unmarshal_attribute(nested)?);
            }
            Ok(Value::Object(object))
        }
        _ => bail!("unsupported attribute value: {attribute}"),
    }
}

fn parse_number(raw: &str) -> Result<Value, HandlerError> {
    if let Ok(int) = raw.parse::<i64>() {
        return Ok(Value::Number(int.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| anyhow!("invalid number attribute: {raw}"))
}
