use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use crate::errors::{ReviewerError, StoreError};
use crate::services::store_service::{ObjectStore, RecordStore};

pub fn get_app_data_dir() -> Result<PathBuf, ReviewerError> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ReviewerError::Config("Could not find data directory".to_string()))?
        .join("RepoReviewer");

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

/// Record and object store backed by a local directory:
///
/// ```text
/// <root>/tables/<table>/<url-encoded key>.json
/// <root>/buckets/<bucket>/<object key>
/// ```
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `data_dir`, or at the app data dir when unset.
    pub fn open(data_dir: Option<&Path>) -> Result<Self, ReviewerError> {
        let root = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => get_app_data_dir()?,
        };
        log::info!("Using local store at {}", root.display());
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get_table_dir(&self, table: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join("tables").join(safe_segment(table)?))
    }

    pub fn get_record_path(&self, table: &str, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() {
            return Err(StoreError::Rejected("Record key must not be empty".to_string()));
        }
        Ok(self
            .get_table_dir(table)?
            .join(format!("{}.json", urlencoding::encode(key))))
    }

    pub fn get_object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        let mut path = self.root.join("buckets").join(safe_segment(bucket)?);
        for segment in key.split('/') {
            path.push(safe_segment(segment)?);
        }
        Ok(path)
    }

    pub async fn load_record(&self, table: &str, key: &str) -> Result<Value, StoreError> {
        let path = self.get_record_path(table, key)?;
        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn load_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        Ok(fs::read(self.get_object_path(bucket, key)?).await?)
    }
}

fn safe_segment(segment: &str) -> Result<&str, StoreError> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains(['/', '\\']) {
        return Err(StoreError::Rejected(format!("Invalid path segment: {:?}", segment)));
    }
    Ok(segment)
}

async fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[async_trait]
impl RecordStore for FsStore {
    async fn put_record(&self, table: &str, key: &str, item: Value) -> Result<(), StoreError> {
        let path = self.get_record_path(table, key)?;
        ensure_parent(&path).await?;

        let content = serde_json::to_string_pretty(&item)?;
        fs::write(&path, content).await?;
        log::debug!("Wrote record {}/{}", table, key);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let path = self.get_object_path(bucket, key)?;
        ensure_parent(&path).await?;

        fs::write(&path, &body).await?;
        log::debug!("Wrote object {}/{} ({} bytes, {})", bucket, key, body.len(), content_type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        store
            .put_record("projects_db", "proj/1", json!({"grade": 90}))
            .await
            .unwrap();

        let path = store.get_record_path("projects_db", "proj/1").unwrap();
        assert!(path.ends_with("tables/projects_db/proj%2F1.json"));
        assert_eq!(
            store.load_record("projects_db", "proj/1").await.unwrap(),
            json!({"grade": 90})
        );
    }

    #[tokio::test]
    async fn objects_keep_their_key_hierarchy() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        store
            .put_object("files", "proj-1/1700000000000-abc.py", b"print(1)".to_vec(), "text/x-python")
            .await
            .unwrap();

        assert!(dir.path().join("buckets/files/proj-1/1700000000000-abc.py").is_file());
        assert_eq!(
            store.load_object("files", "proj-1/1700000000000-abc.py").await.unwrap(),
            b"print(1)"
        );
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let err = store
            .put_object("files", "../escape.txt", vec![], "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));

        assert!(store.put_record("..", "k", json!({})).await.is_err());
        assert!(store.put_record("t", "", json!({})).await.is_err());
    }
}
