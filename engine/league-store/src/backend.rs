//! Record store trait and the in-memory implementation

use crate::config::is_valid_document_name;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

/// Document store holding whole JSON documents.
///
/// Writes replace the entire document; concurrent writers are last-write-wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point lookup; `None` when the document does not exist
    async fn get(&self, document: &str) -> Result<Option<Value>>;

    /// Replace the whole document and notify subscribers
    async fn set(&self, document: &str, value: Value) -> Result<()>;

    /// Watch a document. The receiver starts at the current value and sees every
    /// later replacement.
    async fn subscribe(&self, document: &str) -> Result<watch::Receiver<Option<Value>>>;
}

/// Decode a document, treating a missing document as empty
pub fn decode_document<T>(value: Option<Value>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match value {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(T::default()),
    }
}

/// Read and decode a document
pub async fn load_document<T>(store: &dyn RecordStore, document: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    decode_document(store.get(document).await?)
}

/// Encode and write a document
pub async fn save_document<T>(store: &dyn RecordStore, document: &str, value: &T) -> Result<()>
where
    T: Serialize + Sync,
{
    store.set(document, serde_json::to_value(value)?).await
}

pub(crate) fn check_document_name(document: &str) -> Result<()> {
    if is_valid_document_name(document) {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(document.to_string()))
    }
}

/// Per-document change channels shared by the backends
#[derive(Debug, Default)]
pub(crate) struct DocumentChannels {
    channels: DashMap<String, watch::Sender<Option<Value>>>,
}

impl DocumentChannels {
    pub(crate) fn is_open(&self, document: &str) -> bool {
        self.channels.contains_key(document)
    }

    pub(crate) fn current(&self, document: &str) -> Option<Value> {
        self.channels.get(document).and_then(|sender| sender.borrow().clone())
    }

    pub(crate) fn publish(&self, document: &str, value: Option<Value>) {
        self.channels
            .entry(document.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .send_replace(value);
    }

    /// Subscribe, seeding a new channel with `initial` when none exists yet
    pub(crate) fn subscribe_with<F>(&self, document: &str, initial: F) -> watch::Receiver<Option<Value>>
    where
        F: FnOnce() -> Option<Value>,
    {
        self.channels
            .entry(document.to_string())
            .or_insert_with(|| watch::channel(initial()).0)
            .subscribe()
    }
}

/// Process-local record store
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    documents: DocumentChannels,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, document: &str) -> Result<Option<Value>> {
        check_document_name(document)?;
        Ok(self.documents.current(document))
    }

    async fn set(&self, document: &str, value: Value) -> Result<()> {
        check_document_name(document)?;
        self.documents.publish(document, Some(value));
        Ok(())
    }

    async fn subscribe(&self, document: &str) -> Result<watch::Receiver<Option<Value>>> {
        check_document_name(document)?;
        Ok(self.documents.subscribe_with(document, || None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let store = InMemoryRecordStore::new();
        assert_eq!(store.get("results").await.unwrap(), None);

        store.set("results", json!({"1": {"podium": ["a", "b", "c"]}})).await.unwrap();
        assert_eq!(store.get("results").await.unwrap(), Some(json!({"1": {"podium": ["a", "b", "c"]}})));
    }

    #[tokio::test]
    async fn test_set_replaces_whole_document() {
        let store = InMemoryRecordStore::new();
        store.set("predictions", json!({"1": {}, "2": {}})).await.unwrap();
        store.set("predictions", json!({"3": {}})).await.unwrap();
        assert_eq!(store.get("predictions").await.unwrap(), Some(json!({"3": {}})));
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store = InMemoryRecordStore::new();
        store.set("results", json!({})).await.unwrap();

        let mut rx = store.subscribe("results").await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(json!({})));

        store.set("results", json!({"1": {"podium": []}})).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(json!({"1": {"podium": []}})));
    }

    #[tokio::test]
    async fn test_rejects_invalid_document_names() {
        let store = InMemoryRecordStore::new();
        let err = store.set("../etc/passwd", json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let store = InMemoryRecordStore::new();
        let empty: std::collections::BTreeMap<String, u32> = load_document(&store, "results").await.unwrap();
        assert!(empty.is_empty());

        let mut doc = std::collections::BTreeMap::new();
        doc.insert("1".to_string(), 7u32);
        save_document(&store, "results", &doc).await.unwrap();
        let loaded: std::collections::BTreeMap<String, u32> = load_document(&store, "results").await.unwrap();
        assert_eq!(loaded, doc);
    }
}
