//! Command-line interface module.

mod args;
pub mod build;
pub mod page;

pub use args::{BuildArgs, Cli, Commands, IncludeArgs};

use std::path::Path;

use anyhow::{Context, Result};
use url::Url;

use crate::config::IncluderConfig;
use crate::include::{FileSource, HttpSource, SiteSource};

/// Public site URL from config, with a trailing slash.
pub fn site_url(config: &IncluderConfig) -> Result<Url> {
    config
        .site
        .parsed_url()
        .with_context(|| format!("invalid site url `{}`", config.site.url))
}

/// Fragment source for the configured mode.
pub fn site_source(config: &IncluderConfig, site: &Url) -> Result<SiteSource> {
    if config.build.remote {
        let http = HttpSource::new().context("Failed to create HTTP client")?;
        Ok(SiteSource::Remote(http))
    } else {
        Ok(SiteSource::Local(FileSource::new(config.site_root(), site.clone())))
    }
}

/// Where a file under the site root is served.
pub fn page_location(site: &Url, rel: &Path) -> Result<Url> {
    let rel_url: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    // "./" keeps names like `a:b.html` from parsing as a scheme
    site.join(&format!("./{}", rel_url.join("/")))
        .with_context(|| format!("cannot map {} to a URL", rel.display()))
}
