//! Single-page assembly.
//!
//! `includer page https://alice.github.io/handbook/` fetches a live page and
//! resolves its includes over HTTP; `includer page guide/intro.html` does the
//! same for a file under the site root.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use url::Url;

use super::{page_location, site_source, site_url};
use crate::config::IncluderConfig;
use crate::dom::Document;
use crate::include::{
    FragmentSource, HttpSource, InclusionReport, RecordingHost, SiteSource, fetch_with_timeout,
    include_document,
};
use crate::utils::plural_count;
use crate::{debug, log};

/// What `page` was pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Remote(Url),
    /// Relative to the site root.
    Local(PathBuf),
}

impl Target {
    fn parse(raw: &str, root: &Path) -> Result<Self> {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw).with_context(|| format!("invalid page URL `{raw}`"))?;
            return Ok(Self::Remote(url));
        }

        let path = Path::new(raw);
        let rel = if path.is_absolute() {
            path.strip_prefix(root)
                .with_context(|| format!("{raw} is not under the site root {}", root.display()))?
        } else {
            path
        };
        Ok(Self::Local(rel.to_path_buf()))
    }
}

/// Assemble one page and write it to `output` (stdout when `None`).
pub async fn assemble_page(
    config: &IncluderConfig,
    target: &str,
    output: Option<&Path>,
) -> Result<InclusionReport> {
    let (html, location, source) = match Target::parse(target, config.site_root())? {
        Target::Remote(url) => {
            let http = HttpSource::new().context("Failed to create HTTP client")?;
            let html = fetch_with_timeout(&http, &url, config.include.timeout())
                .await
                .with_context(|| format!("Failed to fetch {url}"))?;
            (html, url, SiteSource::Remote(http))
        }
        Target::Local(rel) => {
            let input = config.site_root().join(&rel);
            let html = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let site = site_url(config)?;
            let location = page_location(&site, &rel)?;
            (html, location, site_source(config, &site)?)
        }
    };

    let report = assemble_html(config, &html, location, source, output).await?;

    for failure in &report.failures {
        log!("error"; "{}: {}", failure.url, failure.reason);
    }
    log!(
        "page"; "{} in {}, {}",
        plural_count(report.included, "include"),
        plural_count(report.passes, "pass"),
        plural_count(report.failures.len(), "failure")
    );
    Ok(report)
}

async fn assemble_html<S: FragmentSource>(
    config: &IncluderConfig,
    html: &str,
    location: Url,
    source: S,
    output: Option<&Path>,
) -> Result<InclusionReport> {
    let mut doc = Document::parse(html);
    debug!("page"; "assembling {}", location);

    let (report, _) =
        include_document(&mut doc, location, &config.include, source, RecordingHost::default())
            .await;
    let assembled = doc.to_html();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, assembled)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = stdout
                .write_all(assembled.as_bytes())
                .and_then(|()| stdout.flush())
            {
                bail!("Failed to write page to stdout: {err}");
            }
        }
    }
    Ok(report)
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_target_parse() {
        let root = Path::new("/srv/site");
        assert_eq!(
            Target::parse("https://example.com/docs/", root).unwrap(),
            Target::Remote(Url::parse("https://example.com/docs/").unwrap())
        );
        assert_eq!(
            Target::parse("guide/intro.html", root).unwrap(),
            Target::Local(PathBuf::from("guide/intro.html"))
        );
        assert_eq!(
            Target::parse("/srv/site/index.html", root).unwrap(),
            Target::Local(PathBuf::from("index.html"))
        );
        assert!(Target::parse("/elsewhere/index.html", root).is_err());
    }

    #[tokio::test]
    async fn test_assemble_local_page_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("partials")).unwrap();
        fs::write(
            root.join("index.html"),
            r#"<html><head><script src="/docs/assets/includes.js"></script></head><body><div data-include="/partials/hello.html"></div></body></html>"#,
        )
        .unwrap();
        fs::write(root.join("partials/hello.html"), r#"<a href="/x">hello</a>"#).unwrap();

        let mut config = test_parse_config("[site]\nurl = \"https://example.com/docs/\"");
        config.site.root = root.to_path_buf();

        let out = root.join("out/index.html");
        let report = assemble_page(&config, "index.html", Some(&out)).await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.included, 1);

        let html = fs::read_to_string(out).unwrap();
        assert!(html.contains(r#"<a href="/docs/x">hello</a>"#));
        assert!(!html.contains("data-include="));
    }
}
