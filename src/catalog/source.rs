//! Where profile bytes come from.

use std::future::Future;
use std::path::PathBuf;

use reqwest::{Client, Url};

use crate::error::LoadError;
use crate::profile::profile_file_name;

/// Directory the bundled profiles are published under, relative to the site root.
pub const PROFILE_DIR: &str = "tubeAmp_Profiles";

/// Fetches the raw `.tapf` bytes for a logical profile name.
pub trait ByteSource {
    fn fetch(&self, source: &str) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send;

    /// Forget any stored copy of `source` so the next fetch goes upstream.
    fn invalidate(&self, source: &str) -> impl Future<Output = Result<(), LoadError>> + Send {
        let _ = source;
        async { Ok(()) }
    }
}

/// Reject names that would escape the profile directory.
pub(crate) fn check_source(source: &str) -> Result<(), LoadError> {
    let bad_segment = source
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad_segment || source.contains('\\') {
        return Err(LoadError::InvalidUrl(format!("bad profile name '{source}'")));
    }
    Ok(())
}

/// Profiles served over HTTP at `{base}/{source}.tapf`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self, LoadError> {
        let base = Url::parse(base_url).map_err(|e| LoadError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(LoadError::InvalidUrl(base_url.to_string()));
        }
        Ok(HttpSource {
            client: Client::new(),
            base,
        })
    }

    /// Profiles under [`PROFILE_DIR`] of a site root.
    pub fn for_site(site_url: &str) -> Result<Self, LoadError> {
        let mut source = Self::new(site_url)?;
        if let Ok(mut segments) = source.base.path_segments_mut() {
            segments.pop_if_empty().push(PROFILE_DIR);
        }
        Ok(source)
    }

    /// Percent-encoded URL of a profile.
    pub fn profile_url(&self, source: &str) -> Result<Url, LoadError> {
        check_source(source)?;
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| LoadError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(profile_file_name(source).split('/'));
        Ok(url)
    }
}

impl ByteSource for HttpSource {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, LoadError> {
        let url = self.profile_url(source)?;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Profiles stored on disk at `{root}/{source}.tapf`.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSource { root: root.into() }
    }

    pub fn profile_path(&self, source: &str) -> Result<PathBuf, LoadError> {
        check_source(source)?;
        Ok(self.root.join(profile_file_name(source)))
    }
}

impl ByteSource for DirSource {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.profile_path(source)?;
        Ok(tokio::fs::read(path).await?)
    }
}
