//! JSON file persistence for document collections.
//!
//! Each collection lives in `<root>/<collection>.json` as an array of
//! documents. Writes go through a temp file and a rename so a crash never
//! leaves a half-written collection behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::schema::is_valid_collection_name;
use crate::store::{Document, DocumentStore, NewDocument, StoreResult};

/// File-backed document store.
pub struct JsonFileStore {
    /// Root directory for collection files.
    root: PathBuf,

    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::CreateDirectory(format!("{}: {e}", root.display())))?;

        info!("Opened document store at {}", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the path for a collection file.
    fn collection_path(&self, collection: &str) -> StoreResult<PathBuf> {
        if !is_valid_collection_name(collection) {
            return Err(StorageError::InvalidCollection(collection.to_string()));
        }
        Ok(self.root.join(format!("{collection}.json")))
    }

    async fn load(&self, path: &Path) -> StoreResult<Vec<Document>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Read(format!("{}: {e}", path.display()))),
        };

        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, path: &Path, documents: &[Document]) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(documents)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .await
            .map_err(|e| StorageError::Write(format!("{}: {e}", temp_path.display())))?;

        fs::rename(&temp_path, path)
            .await
            .map_err(|e| StorageError::Write(format!("{}: {e}", path.display())))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let path = self.collection_path(collection)?;
        let documents = self.load(&path).await?;
        debug!("Loaded {} documents from {collection}", documents.len());
        Ok(documents)
    }

    async fn insert_batch(
        &self,
        collection: &str,
        documents: Vec<NewDocument>,
    ) -> StoreResult<Vec<String>> {
        let path = self.collection_path(collection)?;
        let _guard = self.write_lock.lock().await;

        let mut existing = self.load(&path).await?;
        let now = Utc::now();
        let start = existing.len();
        existing.extend(documents.into_iter().map(|d| Document::from_new(d, now)));

        self.save(&path, &existing).await?;

        let ids: Vec<String> = existing[start..].iter().map(|d| d.id.clone()).collect();
        debug!("Committed {} documents to {collection}", ids.len());
        Ok(ids)
    }
}
