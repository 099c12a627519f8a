pub mod analytics;
pub mod snapshot;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;

pub const SNAPSHOT_RESOURCE: &str = "data.json";
pub const ANALYTICS_RESOURCE: &str = "analysis.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unable to access {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: io::Error,
    },
    #[error("Malformed contents in {resource}: {source}")]
    Parse {
        resource: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Named text resources the stores read and write whole
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn read_text(&self, resource: &str) -> io::Result<String>;

    async fn write_text(&self, resource: &str, contents: &str) -> io::Result<()>;

    async fn exists(&self, resource: &str) -> bool {
        self.read_text(resource).await.is_ok()
    }
}

/// Resources are files inside a single directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Persistence for FileStore {
    async fn read_text(&self, resource: &str) -> io::Result<String> {
        fs::read_to_string(self.dir.join(resource)).await
    }

    async fn write_text(&self, resource: &str, contents: &str) -> io::Result<()> {
        // Temp file in the same directory, then renamed over the target
        let destination = self.dir.join(resource);
        let dir = self.dir.clone();
        let contents = contents.to_string();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let temp = NamedTempFile::new_in(&dir)?;
            std::fs::write(temp.path(), contents)?;
            temp.persist(&destination).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }

    async fn exists(&self, resource: &str) -> bool {
        fs::metadata(self.dir.join(resource)).await.is_ok()
    }
}

pub(crate) async fn load_json<T: DeserializeOwned>(
    persistence: &dyn Persistence,
    resource: &str,
) -> Result<T, StoreError> {
    let text = persistence
        .read_text(resource)
        .await
        .map_err(|source| StoreError::Io {
            resource: resource.to_string(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|source| StoreError::Parse {
        resource: resource.to_string(),
        source,
    })
}

pub(crate) async fn save_json<T: Serialize>(
    persistence: &dyn Persistence,
    resource: &str,
    value: &T,
) -> Result<(), StoreError> {
    let text = serde_json::to_string(value).map_err(|source| StoreError::Parse {
        resource: resource.to_string(),
        source,
    })?;
    persistence
        .write_text(resource, &text)
        .await
        .map_err(|source| StoreError::Io {
            resource: resource.to_string(),
            source,
        })
}
