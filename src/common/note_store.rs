use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

use crate::common::errors::NoteStoreError;
use crate::common::{Note, NoteId};

/// One page of a full-table scan.
#[derive(Debug, Default)]
pub struct NotePage {
    pub notes: Vec<Note>,
    /// Continuation key; `None` once the table is exhausted.
    pub last_key: Option<NoteId>,
}

/// Primitive record operations a backing table must provide.
#[async_trait]
pub trait NoteTable: Send + Sync {
    /// Writes a new record; fails if the id is already taken.
    async fn put_new(&self, note: &Note) -> Result<(), NoteStoreError>;

    /// Removes an existing record; `NotFound` if there is none.
    async fn delete_existing(&self, id: &NoteId) -> Result<(), NoteStoreError>;

    /// Returns the page of records following `start_after`.
    async fn scan_page(&self, start_after: Option<&NoteId>) -> Result<NotePage, NoteStoreError>;
}

#[derive(Debug, Clone)]
pub struct NoteStore<T> {
    table: T,
}

impl<T: NoteTable> NoteStore<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    #[tracing::instrument(skip_all)]
    pub async fn create(&self, content: Option<Value>) -> Result<Note, NoteStoreError> {
        let content = validate_content(content)?;
        let note = Note {
            id: NoteId::generate(),
            content,
        };

        info!("Creating note with id: {}", note.id);
        self.table.put_new(&note).await.inspect_err(|err| {
            error!("Failed to create note {}: {}", note.id, err);
        })?;

        Ok(note)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: Option<&str>) -> Result<(), NoteStoreError> {
        let id: NoteId = id
            .ok_or_else(|| NoteStoreError::InvalidInput("note id is missing".into()))?
            .parse()?;

        info!("Deleting note");
        self.table.delete_existing(&id).await.inspect_err(|err| {
            error!("Failed to delete note {}: {}", id, err);
        })
    }

    #[tracing::instrument(skip_all)]
    pub async fn list(&self) -> Result<Vec<Note>, NoteStoreError> {
        let mut notes = Vec::new();
        let mut start_after: Option<NoteId> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .table
                .scan_page(start_after.as_ref())
                .await
                .inspect_err(|err| error!("Scan failed after {} pages: {}", pages, err))?;
            pages += 1;
            notes.extend(page.notes);

            match page.last_key {
                Some(key) => start_after = Some(key),
                None => break,
            }
        }

        notes.sort_by(|a, b| a.id.cmp(&b.id));
        notes.dedup_by(|a, b| a.id == b.id);

        info!("Listed {} notes in {} pages", notes.len(), pages);
        Ok(notes)
    }
}

fn validate_content(content: Option<Value>) -> Result<Value, NoteStoreError> {
    match content {
        None | Some(Value::Null) => Err(NoteStoreError::InvalidInput(
            "note content is missing".into(),
        )),
        Some(Value::String(text)) if text.is_empty() => Err(NoteStoreError::InvalidInput(
            "note content is empty".into(),
        )),
        Some(Value::Array(items)) if items.is_empty() => Err(NoteStoreError::InvalidInput(
            "note content is empty".into(),
        )),
        Some(Value::Object(fields)) if fields.is_empty() => Err(NoteStoreError::InvalidInput(
            "note content is empty".into(),
        )),
        Some(content) => Ok(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory::MemoryNoteTable;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store(page_size: usize) -> NoteStore<MemoryNoteTable> {
        NoteStore::new(MemoryNoteTable::with_page_size(page_size))
    }

    #[tokio::test]
    async fn hello_scenario() {
        let store = store(10);

        let note = store.create(Some(json!("hello"))).await.unwrap();
        assert_eq!(note.content, json!("hello"));

        assert_eq!(store.list().await.unwrap(), vec![note.clone()]);

        store.delete(Some(note.id.as_str())).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        let err = store.delete(Some(note.id.as_str())).await.unwrap_err();
        assert!(matches!(err, NoteStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_missing_or_empty_content() {
        let store = store(10);

        for content in [
            None,
            Some(Value::Null),
            Some(json!("")),
            Some(json!([])),
            Some(json!({})),
        ] {
            let err = store.create(content).await.unwrap_err();
            assert!(matches!(err, NoteStoreError::InvalidInput(_)));
        }

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accepts_structured_content() {
        let store = store(10);
        let content = json!({"title": "groceries", "items": ["milk", 2, true], "tags": []});

        let note = store.create(Some(content.clone())).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, note.id);
        assert_eq!(listed[0].content, content);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = store(10);
        let mut ids = HashSet::new();

        for i in 0..50 {
            let note = store.create(Some(json!(i))).await.unwrap();
            assert!(ids.insert(note.id));
        }
    }

    #[tokio::test]
    async fn delete_rejects_missing_or_malformed_id() {
        let store = store(10);
        store.create(Some(json!("keep"))).await.unwrap();

        let err = store.delete(None).await.unwrap_err();
        assert!(matches!(err, NoteStoreError::InvalidInput(_)));

        let err = store.delete(Some("*")).await.unwrap_err();
        assert!(matches!(err, NoteStoreError::InvalidInput(_)));

        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_is_not_found() {
        let store = store(10);
        let id = NoteId::generate();

        let err = store.delete(Some(id.as_str())).await.unwrap_err();
        assert!(matches!(err, NoteStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_follows_every_page() {
        let store = store(3);
        let mut created = HashSet::new();
        for i in 0..10 {
            created.insert(store.create(Some(json!(i))).await.unwrap().id);
        }

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 10);
        let listed: HashSet<_> = listed.into_iter().map(|note| note.id).collect();
        assert_eq!(listed, created);
    }

    struct FlakyTable {
        inner: MemoryNoteTable,
        fail_on_page: usize,
        pages: AtomicUsize,
    }

    #[async_trait]
    impl NoteTable for FlakyTable {
        async fn put_new(&self, note: &Note) -> Result<(), NoteStoreError> {
            self.inner.put_new(note).await
        }

        async fn delete_existing(&self, id: &NoteId) -> Result<(), NoteStoreError> {
            self.inner.delete_existing(id).await
        }

        async fn scan_page(
            &self,
            start_after: Option<&NoteId>,
        ) -> Result<NotePage, NoteStoreError> {
            if self.pages.fetch_add(1, Ordering::SeqCst) == self.fail_on_page {
                return Err(NoteStoreError::StorageUnavailable("throttled".into()));
            }
            self.inner.scan_page(start_after).await
        }
    }

    #[tokio::test]
    async fn list_never_returns_partial_results() {
        let store = NoteStore::new(FlakyTable {
            inner: MemoryNoteTable::with_page_size(2),
            fail_on_page: 1,
            pages: AtomicUsize::new(0),
        });
        for i in 0..5 {
            store.create(Some(json!(i))).await.unwrap();
        }

        let err = store.list().await.unwrap_err();
        assert_eq!(err, NoteStoreError::StorageUnavailable("throttled".into()));
    }
}
