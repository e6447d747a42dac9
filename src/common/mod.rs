pub mod dynamo;
pub mod errors;
pub mod memory;
pub mod note_store;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::common::errors::NoteStoreError;

pub const TABLE_NAME_DEFAULT: &str = "notes-table";
pub const TABLE_NAME_ENV: &str = "NOTES_TABLE";

const ID_SUFFIX_LEN: usize = 32;

/// Store-assigned note identifier: `<unix-millis>-<32 hex chars>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoteId(String);

impl NoteId {
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();

        Self(format!("{}-{}", millis, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NoteId {
    type Err = NoteStoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || NoteStoreError::InvalidInput(format!("malformed note id: {value:?}"));

        let (millis, suffix) = value.split_once('-').ok_or_else(malformed)?;
        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if suffix.len() != ID_SUFFIX_LEN
            || !suffix.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(malformed());
        }

        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for NoteId {
    type Error = NoteStoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NoteId> for String {
    fn from(id: NoteId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub content: serde_json::Value,
}

pub fn table_name() -> String {
    std::env::var(TABLE_NAME_ENV).unwrap_or(TABLE_NAME_DEFAULT.into())
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time() // CloudWatch will add the ingestion time
        .with_target(false)
        .init();
}
