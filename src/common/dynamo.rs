use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info};

use crate::common::errors::NoteStoreError;
use crate::common::note_store::{NotePage, NoteTable};
use crate::common::{Note, NoteId};

pub const NOTE_ID_ATTRIBUTE: &str = "noteId";
pub const CONTENT_ATTRIBUTE: &str = "content";

const VALIDATION_EXCEPTION: &str = "ValidationException";

const OPERATION_TIMEOUT: Duration = Duration::from_secs(5);
const OPERATION_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Loads the shared SDK config with bounded timeouts and no SDK-side retries.
pub async fn load_client() -> aws_sdk_dynamodb::Client {
    let timeout_config = TimeoutConfig::builder()
        .operation_timeout(OPERATION_TIMEOUT)
        .operation_attempt_timeout(OPERATION_ATTEMPT_TIMEOUT)
        .build();

    let config = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::disabled())
        .timeout_config(timeout_config)
        .load()
        .await;

    aws_sdk_dynamodb::Client::new(&config)
}

#[derive(Debug, Clone)]
pub struct DynamoNoteTable {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
    page_limit: Option<i32>,
}

impl DynamoNoteTable {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            page_limit: None,
        }
    }

    /// Caps items per scan request; by default DynamoDB's 1 MB page applies.
    pub fn with_page_limit(mut self, page_limit: i32) -> Self {
        self.page_limit = Some(page_limit);
        self
    }
}

#[async_trait]
impl NoteTable for DynamoNoteTable {
    async fn put_new(&self, note: &Note) -> Result<(), NoteStoreError> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(note.into()))
            .condition_expression("attribute_not_exists(#id)")
            .expression_attribute_names("#id", NOTE_ID_ATTRIBUTE)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(val)) => match val.err() {
                PutItemError::ConditionalCheckFailedException(_) => {
                    error!("Note id collision: {}", note.id);
                    Err(NoteStoreError::StorageUnavailable(format!(
                        "note id collision: {}",
                        note.id
                    )))
                }
                // Oversized items and out-of-range numbers fail the same way on every attempt.
                err if err.code() == Some(VALIDATION_EXCEPTION) => {
                    let message = err.message().unwrap_or("item rejected by table").to_string();
                    error!("Note {} rejected: {}", note.id, message);
                    Err(NoteStoreError::InvalidInput(message))
                }
                _ => Err(storage_error(SdkError::ServiceError(val))),
            },
            Err(err) => Err(storage_error(err)),
        }
    }

    async fn delete_existing(&self, id: &NoteId) -> Result<(), NoteStoreError> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(NOTE_ID_ATTRIBUTE, AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(#id)")
            .expression_attribute_names("#id", NOTE_ID_ATTRIBUTE)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(val)) => match val.err() {
                DeleteItemError::ConditionalCheckFailedException(_) => {
                    Err(NoteStoreError::NotFound(id.to_string()))
                }
                _ => Err(storage_error(SdkError::ServiceError(val))),
            },
            Err(err) => Err(storage_error(err)),
        }
    }

    async fn scan_page(&self, start_after: Option<&NoteId>) -> Result<NotePage, NoteStoreError> {
        let start_key = start_after.map(|id| {
            HashMap::from([(
                NOTE_ID_ATTRIBUTE.to_string(),
                AttributeValue::S(id.to_string()),
            )])
        });

        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .set_limit(self.page_limit)
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(storage_error)?;

        let notes = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(Note::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        info!("Scanned page with {} items", notes.len());

        let last_key = output
            .last_evaluated_key
            .map(|key| note_id_from_item(&key))
            .transpose()?;

        Ok(NotePage { notes, last_key })
    }
}

fn storage_error<E, R>(err: SdkError<E, R>) -> NoteStoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    error!("DynamoDB request failed: {}", message);
    NoteStoreError::StorageUnavailable(message)
}

fn corrupt_item(detail: impl std::fmt::Display) -> NoteStoreError {
    NoteStoreError::StorageUnavailable(format!("unreadable item: {detail}"))
}

fn note_id_from_item(item: &HashMap<String, AttributeValue>) -> Result<NoteId, NoteStoreError> {
    match item.get(NOTE_ID_ATTRIBUTE) {
        Some(AttributeValue::S(id)) => id.parse().map_err(corrupt_item),
        _ => Err(corrupt_item(format!("missing {NOTE_ID_ATTRIBUTE}"))),
    }
}

impl From<&Note> for HashMap<String, AttributeValue> {
    fn from(note: &Note) -> Self {
        HashMap::from([
            (
                NOTE_ID_ATTRIBUTE.to_string(),
                AttributeValue::S(note.id.to_string()),
            ),
            (
                CONTENT_ATTRIBUTE.to_string(),
                to_attribute_value(&note.content),
            ),
        ])
    }
}

impl TryFrom<HashMap<String, AttributeValue>> for Note {
    type Error = NoteStoreError;

    fn try_from(mut item: HashMap<String, AttributeValue>) -> Result<Self, Self::Error> {
        let id = note_id_from_item(&item)?;
        let content = item
            .remove(CONTENT_ATTRIBUTE)
            .ok_or_else(|| corrupt_item(format!("note {id} has no {CONTENT_ATTRIBUTE}")))?;

        Ok(Note {
            content: from_attribute_value(content)?,
            id,
        })
    }
}

pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(key, value)| (key.clone(), to_attribute_value(value)))
                .collect(),
        ),
    }
}

pub fn from_attribute_value(value: AttributeValue) -> Result<Value, NoteStoreError> {
    let value = match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::N(n) => {
            Value::Number(serde_json::from_str::<Number>(&n).map_err(corrupt_item)?)
        }
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::L(values) => Value::Array(
            values
                .into_iter()
                .map(from_attribute_value)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| Ok((key, from_attribute_value(value)?)))
                .collect::<Result<Map<_, _>, NoteStoreError>>()?,
        ),
        other => return Err(corrupt_item(format!("unsupported attribute {other:?}"))),
    };

    Ok(value)
}
