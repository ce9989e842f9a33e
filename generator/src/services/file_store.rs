//! Artifact storage on the local file system

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use shared::SessionId;
use crate::error::{GeneratorError, GeneratorResult};
use crate::traits::ArtifactStore;
use crate::types::ImageFormat;

/// Stores each artifact as `<session>_<uuid>.<ext>` under one directory
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn save(&self, session: &SessionId, bytes: &[u8]) -> GeneratorResult<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            GeneratorError::storage(format!("failed to create {}: {}", self.root.display(), e))
        })?;

        let extension = ImageFormat::sniff(bytes).extension();
        let path = self
            .root
            .join(format!("{}_{}.{}", session.short(), Uuid::new_v4().simple(), extension));

        tokio::fs::write(&path, bytes).await?;
        debug!("💾 Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    async fn load(&self, path: &Path) -> GeneratorResult<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }

    async fn remove(&self, path: &Path) -> GeneratorResult<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("🗑️ Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
