//! Filesystem-backed ciphertext store.
//!
//! One file per blob, named by its asset reference. Writes go to a
//! `.partial` sibling first and are renamed into place, so a reader never
//! observes a half-written ciphertext.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use deadswitch_core::AssetRef;

use crate::error::{Result, StoreError};
use crate::traits::BlobStore;

/// Ciphertext store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (and create if needed) a blob directory.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// The directory blobs live in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // AssetRef only admits 64 lowercase hex chars, so this never escapes root.
    fn path_for(&self, asset: &AssetRef) -> PathBuf {
        self.root.join(asset.as_str())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, ciphertext: Bytes) -> Result<AssetRef> {
        let asset = AssetRef::for_content(&ciphertext);
        let path = self.path_for(&asset);

        if tokio::fs::try_exists(&path).await? {
            return Ok(asset);
        }

        let partial = path.with_extension("partial");
        tokio::fs::write(&partial, &ciphertext).await?;
        tokio::fs::rename(&partial, &path).await?;

        tracing::debug!(asset = %asset, len = ciphertext.len(), "stored ciphertext");
        Ok(asset)
    }

    async fn get(&self, asset: &AssetRef) -> Result<Option<Bytes>> {
        match tokio::fs::read(self.path_for(asset)).await {
            Ok(data) => {
                if AssetRef::for_content(&data) != *asset {
                    return Err(StoreError::Tampered(asset.clone()));
                }
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, asset: &AssetRef) -> Result<bool> {
        match tokio::fs::remove_file(self.path_for(asset)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
