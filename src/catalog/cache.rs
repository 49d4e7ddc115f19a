//! On-disk profile cache.
//!
//! Profiles never change once published, so a fetched file is kept
//! under the SHA-256 of its source name until it fails to decode.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{debug, warn};
use sha2::{Digest, Sha256};

use super::source::ByteSource;
use crate::error::LoadError;
use crate::profile::PROFILE_EXTENSION;

/// Wraps a [`ByteSource`] with a write-through disk cache.
#[derive(Debug, Clone)]
pub struct CachedSource<S> {
    inner: S,
    dir: PathBuf,
}

impl<S: ByteSource + Sync> CachedSource<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>) -> Self {
        CachedSource {
            inner,
            dir: dir.into(),
        }
    }

    /// Cache in the platform cache directory, e.g. `~/.cache/tubeamp/profiles`.
    pub fn in_user_cache(inner: S) -> Result<Self, LoadError> {
        let dirs = ProjectDirs::from("", "", "tubeamp").ok_or(LoadError::NoCacheDir)?;
        Ok(Self::new(inner, dirs.cache_dir().join("profiles")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Cache file for `source`.
    pub fn cache_path(&self, source: &str) -> PathBuf {
        let hash = Sha256::digest(source.as_bytes());
        self.dir.join(format!("{hash:x}.{PROFILE_EXTENSION}"))
    }

    async fn store(&self, path: &Path, bytes: &[u8]) -> Result<(), LoadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        // Write then rename so readers never see a partial file
        let tmp = path.with_extension("part");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

impl<S: ByteSource + Sync> ByteSource for CachedSource<S> {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.cache_path(source);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("profile '{source}' served from cache");
                return Ok(bytes);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("cache read failed for '{source}': {e}"),
        }

        let bytes = self.inner.fetch(source).await?;
        if let Err(e) = self.store(&path, &bytes).await {
            warn!("could not cache profile '{source}': {e}");
        }
        Ok(bytes)
    }

    async fn invalidate(&self, source: &str) -> Result<(), LoadError> {
        match tokio::fs::remove_file(self.cache_path(source)).await {
            Ok(()) => {
                debug!("evicted cached profile '{source}'");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
