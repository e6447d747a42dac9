use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

use crate::common::errors::NoteStoreError;
use crate::common::note_store::{NotePage, NoteTable};
use crate::common::{Note, NoteId};

const PAGE_SIZE_DEFAULT: usize = 100;

/// In-process table with the same conditional-write and paged-scan
/// behaviour as the DynamoDB table.
#[derive(Debug)]
pub struct MemoryNoteTable {
    items: RwLock<BTreeMap<NoteId, Value>>,
    page_size: usize,
}

impl MemoryNoteTable {
    pub fn new() -> Self {
        Self::with_page_size(PAGE_SIZE_DEFAULT)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

impl Default for MemoryNoteTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteTable for MemoryNoteTable {
    async fn put_new(&self, note: &Note) -> Result<(), NoteStoreError> {
        let mut items = self.items.write().await;
        if items.contains_key(&note.id) {
            return Err(NoteStoreError::StorageUnavailable(format!(
                "note id collision: {}",
                note.id
            )));
        }

        items.insert(note.id.clone(), note.content.clone());
        Ok(())
    }

    async fn delete_existing(&self, id: &NoteId) -> Result<(), NoteStoreError> {
        match self.items.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(NoteStoreError::NotFound(id.to_string())),
        }
    }

    async fn scan_page(&self, start_after: Option<&NoteId>) -> Result<NotePage, NoteStoreError> {
        let items = self.items.read().await;
        let lower = match start_after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };

        let notes: Vec<Note> = items
            .range::<NoteId, _>((lower, Bound::Unbounded))
            .take(self.page_size)
            .map(|(id, content)| Note {
                id: id.clone(),
                content: content.clone(),
            })
            .collect();

        // Like DynamoDB, a full page always carries a continuation key even
        // when nothing follows it.
        let last_key = if notes.len() == self.page_size {
            notes.last().map(|note| note.id.clone())
        } else {
            None
        };

        Ok(NotePage { notes, last_key })
    }
}
