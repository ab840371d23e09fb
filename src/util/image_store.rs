use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// A file received with a request, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("url is not managed by this store: {0}")]
    ForeignUrl(String),
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload_image(&self, bytes: &[u8], filename: &str) -> Result<String, ImageStoreError>;

    async fn delete_image(&self, url: &str) -> Result<(), ImageStoreError>;
}

/// Writes images under `root` and hands out urls below `base_url`.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn extension_of(filename: &str) -> String {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "jpg".to_string())
    }

    fn file_name_for(&self, url: &str) -> Result<String, ImageStoreError> {
        let name = url
            .strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| ImageStoreError::ForeignUrl(url.to_string()))?;

        if name.is_empty() || name.contains('/') || name.contains("..") {
            return Err(ImageStoreError::ForeignUrl(url.to_string()));
        }
        Ok(name.to_string())
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload_image(&self, bytes: &[u8], filename: &str) -> Result<String, ImageStoreError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let name = format!("{}.{}", Uuid::new_v4().simple(), Self::extension_of(filename));
        tokio::fs::write(self.root.join(&name), bytes).await?;
        info!(file = %name, size = bytes.len(), "image stored");

        Ok(format!("{}/{}", self.base_url, name))
    }

    async fn delete_image(&self, url: &str) -> Result<(), ImageStoreError> {
        let name = self.file_name_for(url)?;
        match tokio::fs::remove_file(self.root.join(&name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(file = %name, "image already gone");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
