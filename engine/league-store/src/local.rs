//! Local file-based record store

use crate::backend::{check_document_name, DocumentChannels, InMemoryRecordStore, RecordStore};
use crate::config::{StoreBackendKind, StoreConfig};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use dashmap::DashSet;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Stores each document as `<data_dir>/<document>.json`.
///
/// Writes through this store notify subscribers immediately. Writes made by
/// another store over the same directory, including one in another process, are
/// picked up by re-reading each subscribed document every poll interval.
#[derive(Debug)]
pub struct FileRecordStore {
    data_dir: PathBuf,
    documents: Arc<DocumentChannels>,
    write_lock: Arc<Mutex<()>>,
    poll_interval: Duration,
    watched: DashSet<String>,
}

impl FileRecordStore {
    /// Create a store rooted at `data_dir`, creating the directory if needed
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;

        tracing::info!("File record store initialized at: {:?}", data_dir);

        Ok(Self {
            data_dir,
            documents: Arc::new(DocumentChannels::default()),
            write_lock: Arc::new(Mutex::new(())),
            poll_interval: Duration::from_millis(1000),
            watched: DashSet::new(),
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn document_path(&self, document: &str) -> PathBuf {
        self.data_dir.join(format!("{document}.json"))
    }

    async fn read_file(&self, document: &str) -> Result<Option<Value>> {
        read_document(&self.document_path(document)).await
    }

    /// Poll the document file and publish whatever differs from the last known value.
    ///
    /// The task holds only a weak handle on the channels and ends once the store is
    /// dropped.
    fn spawn_watcher(&self, document: &str) {
        let document = document.to_string();
        let path = self.document_path(&document);
        let channels = Arc::downgrade(&self.documents);
        let write_lock = self.write_lock.clone();
        let poll_interval = self.poll_interval;

        debug!("Watching {:?} every {:?}", path, poll_interval);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let Some(channels) = channels.upgrade() else {
                    break;
                };

                // own writes publish under this lock, so the file never runs ahead of the channel
                let _guard = write_lock.lock().await;
                match read_document(&path).await {
                    Ok(value) => {
                        if value != channels.current(&document) {
                            debug!("Document {} changed on disk", document);
                            channels.publish(&document, value);
                        }
                    }
                    Err(e) => warn!("Failed to re-read document {}: {}", document, e),
                }
            }

            debug!("Stopped watching document {}", document);
        });
    }
}

async fn read_document(path: &Path) -> Result<Option<Value>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::Io(e)),
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn get(&self, document: &str) -> Result<Option<Value>> {
        check_document_name(document)?;
        self.read_file(document).await
    }

    async fn set(&self, document: &str, value: Value) -> Result<()> {
        check_document_name(document)?;
        let bytes = serde_json::to_vec_pretty(&value)?;

        let _guard = self.write_lock.lock().await;
        let path = self.document_path(document);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        debug!("Wrote document {} to {:?}", document, path);
        self.documents.publish(document, Some(value));
        Ok(())
    }

    async fn subscribe(&self, document: &str) -> Result<watch::Receiver<Option<Value>>> {
        check_document_name(document)?;
        let receiver = if self.documents.is_open(document) {
            self.documents.subscribe_with(document, || None)
        } else {
            let initial = self.read_file(document).await?;
            self.documents.subscribe_with(document, move || initial)
        };

        if self.watched.insert(document.to_string()) {
            self.spawn_watcher(document);
        }
        Ok(receiver)
    }
}

/// Create the record store selected by `config`
pub fn create_record_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    config.validate().map_err(StoreError::config)?;

    match config.backend {
        StoreBackendKind::Memory => Ok(Arc::new(InMemoryRecordStore::new())),
        StoreBackendKind::File => Ok(Arc::new(
            FileRecordStore::new(config.data_dir.clone())?.with_poll_interval(config.poll_interval()),
        )),
    }
}
