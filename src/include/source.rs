//! Fragment sources.
//!
//! The engine only needs "give me the body behind this URL". Two sources
//! ship here:
//!
//! - [`HttpSource`]: real HTTP GET with caching disabled
//! - [`FileSource`]: maps URLs under the site URL onto files under the site
//!   root, so a tree can be assembled offline
//!
//! [`SiteSource`] picks one at runtime for the CLI.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use percent_encoding::percent_decode_str;
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use url::Url;

use super::IncludeError;
use crate::debug;

/// Something that can fetch fragment markup by absolute URL.
///
/// Only used with concrete types, so the futures' `Send`-ness is left to
/// the implementor.
#[allow(async_fn_in_trait)]
pub trait FragmentSource {
    /// Fetch the body behind `url`. Non-success responses are errors.
    async fn fetch(&self, url: &Url) -> Result<String, IncludeError>;
}

/// Fetch with a hard deadline.
pub async fn fetch_with_timeout<S: FragmentSource>(
    source: &S,
    url: &Url,
    timeout: Duration,
) -> Result<String, IncludeError> {
    tokio::time::timeout(timeout, source.fetch(url))
        .await
        .map_err(|_| IncludeError::Timeout(timeout))?
}

// ============================================================================
// HTTP
// ============================================================================

/// HTTP fragment source that always revalidates.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl FragmentSource for HttpSource {
    async fn fetch(&self, url: &Url) -> Result<String, IncludeError> {
        debug!("include"; "GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| IncludeError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IncludeError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|err| IncludeError::Network(err.to_string()))
    }
}

// ============================================================================
// Local files
// ============================================================================

/// Serves fragments from a directory as if it were deployed at `site`.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
    site: Url,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>, site: Url) -> Self {
        Self {
            root: root.into(),
            site,
        }
    }

    /// File backing `url`, if the URL lives under the site URL.
    ///
    /// `/dir/` maps to `dir/index.html`. Query and fragment are ignored.
    pub fn path_for(&self, url: &Url) -> Result<PathBuf, IncludeError> {
        let outside = || IncludeError::OutsideRoot(url.to_string());

        let mut bare = url.clone();
        bare.set_query(None);
        bare.set_fragment(None);

        let rel = bare
            .as_str()
            .strip_prefix(self.site.as_str())
            .ok_or_else(outside)?;
        let rel: Cow<'_, str> = percent_decode_str(rel)
            .decode_utf8()
            .map_err(|_| outside())?;

        let rel = Path::new(rel.as_ref());
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(outside());
        }

        let mut path = self.root.join(rel);
        if rel.as_os_str().is_empty() || bare.path().ends_with('/') {
            path.push("index.html");
        }
        Ok(path)
    }
}

impl FragmentSource for FileSource {
    async fn fetch(&self, url: &Url) -> Result<String, IncludeError> {
        let path = self.path_for(url)?;
        debug!("include"; "read {}", path.display());
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(body),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(IncludeError::not_found())
            }
            Err(source) => Err(IncludeError::Io { path, source }),
        }
    }
}

// ============================================================================
// Runtime choice
// ============================================================================

/// Local or remote fragments, chosen from configuration.
#[derive(Debug, Clone)]
pub enum SiteSource {
    Local(FileSource),
    Remote(HttpSource),
}

impl FragmentSource for SiteSource {
    async fn fetch(&self, url: &Url) -> Result<String, IncludeError> {
        match self {
            Self::Local(source) => source.fetch(url).await,
            Self::Remote(source) => source.fetch(url).await,
        }
    }
}

// ============================================================================
// tests
// ============================================================================
