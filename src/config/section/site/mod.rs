//! `[site]` section configuration.
//!
//! Where the static site lives on disk and where it is served from.
//!
//! # Example
//!
//! ```toml
//! [site]
//! url = "https://alice.github.io/handbook/"   # Public URL of the site root
//! root = "site"                               # Static site directory (relative to config)
//! ```
//!
//! Page locations are derived from `url`, so base-path detection sees the
//! same location a browser would.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSectionConfig {
    /// Public URL of the site root.
    pub url: String,

    /// Static site directory.
    pub root: PathBuf,
}

impl Default for SiteSectionConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost/".into(),
            root: ".".into(),
        }
    }
}

impl SiteSectionConfig {
    /// Parsed site URL, always ending with `/` so joins stay inside it.
    pub fn parsed_url(&self) -> Option<Url> {
        let mut url = Url::parse(&self.url).ok()?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Some(url)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        match Url::parse(&self.url) {
            Ok(url) if url.cannot_be_a_base() => {
                diag.error("site.url", format!("`{}` cannot be used as a base URL", self.url));
            }
            Ok(_) => {}
            Err(err) => diag.error_with_hint(
                "site.url",
                format!("invalid URL `{}`: {err}", self.url),
                "use an absolute URL such as \"https://example.com/\"",
            ),
        }
    }
}
