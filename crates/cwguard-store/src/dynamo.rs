use crate::error::{Result, StoreError};
use crate::{OverrideRecord, OverrideStore};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Partition-key attribute of the overrides table unless configured otherwise.
pub const DEFAULT_KEY_ATTRIBUTE: &str = "AlarmName";

/// Override store backed by a DynamoDB table partitioned by alarm name.
pub struct DynamoOverrideStore {
    client: aws_sdk_dynamodb::Client,
    table: String,
    key_attribute: String,
    label: String,
}

impl DynamoOverrideStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            client,
            label: format!("dynamodb:{table}"),
            table,
            key_attribute: DEFAULT_KEY_ATTRIBUTE.to_string(),
        }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig, table: impl Into<String>) -> Self {
        Self::new(aws_sdk_dynamodb::Client::new(config), table)
    }

    pub fn with_key_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.key_attribute = attribute.into();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl OverrideStore for DynamoOverrideStore {
    fn name(&self) -> &str {
        &self.label
    }

    async fn query(&self, key: &str) -> Result<Vec<OverrideRecord>> {
        let output = self
            .client
            .query()
            .table_name(&self.table)
            .key_condition_expression("#k = :name")
            .expression_attribute_names("#k", &self.key_attribute)
            .expression_attribute_values(":name", AttributeValue::S(key.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable {
                store: self.label.clone(),
                message: aws_sdk_dynamodb::error::DisplayErrorContext(&e).to_string(),
            })?;

        first_record(key, output.items.unwrap_or_default(), &self.key_attribute)
    }
}

/// Decodes the first returned item only; later items are never looked at.
pub fn first_record(
    key: &str,
    items: Vec<HashMap<String, AttributeValue>>,
    key_attribute: &str,
) -> Result<Vec<OverrideRecord>> {
    match items.into_iter().next() {
        Some(item) => Ok(vec![item_to_record(key, item, key_attribute)?]),
        None => Ok(Vec::new()),
    }
}

/// Converts one table item into an override record, dropping the key
/// attribute.
pub fn item_to_record(
    key: &str,
    item: HashMap<String, AttributeValue>,
    key_attribute: &str,
) -> Result<OverrideRecord> {
    let mut record = Map::new();
    for (name, value) in item {
        if name == key_attribute {
            continue;
        }
        record.insert(name, attribute_to_json(key, value)?);
    }
    Ok(record)
}

fn attribute_to_json(key: &str, value: AttributeValue) -> Result<Value> {
    let decoded = match value {
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::N(n) => number_to_json(key, &n)?,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(
            items
                .into_iter()
                .map(|v| attribute_to_json(key, v))
                .collect::<Result<_>>()?,
        ),
        AttributeValue::M(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| attribute_to_json(key, v).map(|v| (k, v)))
                .collect::<Result<_>>()?,
        ),
        AttributeValue::Ss(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Array(
            items
                .iter()
                .map(|n| number_to_json(key, n))
                .collect::<Result<_>>()?,
        ),
        other => {
            return Err(StoreError::Decode {
                key: key.to_string(),
                message: format!("unsupported attribute type: {other:?}"),
            })
        }
    };
    Ok(decoded)
}

/// Integral numbers become JSON integers, everything else a float.
pub(crate) fn number_to_json(key: &str, raw: &str) -> Result<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Ok(Value::from(int));
    }
    let float: f64 = raw.parse().map_err(|_| StoreError::Decode {
        key: key.to_string(),
        message: format!("invalid number '{raw}'"),
    })?;
    if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        return Ok(Value::from(float as i64));
    }
    Number::from_f64(float)
        .map(Value::Number)
        .ok_or_else(|| StoreError::Decode {
            key: key.to_string(),
            message: format!("non-finite number '{raw}'"),
        })
}
