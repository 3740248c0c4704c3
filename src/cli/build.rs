//! Whole-site assembly.
//!
//! Build phases:
//! - **Collect** - walk the site root, split pages from assets
//! - **Copy** - assets land in the output verbatim
//! - **Assemble** - every page runs through the include engine as if served
//!   from `site.url`
//! - **Finalize** - summary, and a hard error under `strict` when anything
//!   failed to include

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use jwalk::WalkDir;
use url::Url;

use super::{page_location, site_source, site_url};
use crate::config::IncluderConfig;
use crate::dom::Document;
use crate::include::{IncludeFailure, InclusionReport, RecordingHost, SiteSource, include_document};
use crate::logger::ProgressLine;
use crate::utils::plural_count;
use crate::{debug, log};

/// Files never copied into the output.
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Files found under the site root, relative to it.
#[derive(Debug, Default)]
struct SiteFiles {
    pages: Vec<PathBuf>,
    assets: Vec<PathBuf>,
}

/// Failures of one page.
#[derive(Debug)]
pub struct PageFailures {
    pub page: PathBuf,
    pub failures: Vec<IncludeFailure>,
}

/// Outcome of a build.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub pages: usize,
    pub assets: usize,
    pub included: usize,
    pub failed: Vec<PageFailures>,
}

impl BuildSummary {
    pub fn failure_count(&self) -> usize {
        self.failed.iter().map(|p| p.failures.len()).sum()
    }
}

/// Assemble the whole site into `build.output`.
pub async fn build_site(config: &IncluderConfig) -> Result<BuildSummary> {
    let root = config.site_root();
    let output = &config.build.output;
    let site = site_url(config)?;
    let source = site_source(config, &site)?;

    let files = collect_site_files(root, output, config);
    debug!(
        "build"; "{} and {} under {}",
        plural_count(files.pages.len(), "page"),
        plural_count(files.assets.len(), "asset"),
        root.display()
    );

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let progress = ProgressLine::new(&[("pages", files.pages.len()), ("assets", files.assets.len())]);

    for rel in &files.assets {
        copy_asset(root, output, rel)?;
        progress.inc("assets");
    }

    let mut summary = BuildSummary {
        assets: files.assets.len(),
        ..BuildSummary::default()
    };
    for rel in &files.pages {
        let report = assemble_page(config, &site, &source, rel).await?;
        summary.pages += 1;
        summary.included += report.included;
        if !report.is_clean() {
            summary.failed.push(PageFailures {
                page: rel.clone(),
                failures: report.failures,
            });
        }
        progress.inc("pages");
    }
    progress.finish();

    report(&summary);

    if config.build.strict && !summary.failed.is_empty() {
        bail!(
            "{} (strict mode)",
            plural_count(summary.failure_count(), "include failure")
        );
    }
    Ok(summary)
}

/// Walk the site root, skipping the output directory and ignored files.
fn collect_site_files(root: &Path, output: &Path, config: &IncluderConfig) -> SiteFiles {
    let mut files = SiteFiles::default();

    let walked = WalkDir::new(root)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.path());

    for path in walked {
        if path.starts_with(output) || path == config.config_path {
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_path_buf();

        if !is_html(&rel) {
            files.assets.push(rel);
        } else if !config.build.is_fragment(&rel) {
            files.pages.push(rel);
        }
    }
    files
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

fn copy_asset(root: &Path, output: &Path, rel: &Path) -> Result<()> {
    let dest = output.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(root.join(rel), &dest)
        .with_context(|| format!("Failed to copy {}", rel.display()))?;
    Ok(())
}

/// Include fragments into one page and write it to the output.
async fn assemble_page(
    config: &IncluderConfig,
    site: &Url,
    source: &SiteSource,
    rel: &Path,
) -> Result<InclusionReport> {
    let input = config.site_root().join(rel);
    let html = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut doc = Document::parse(&html);

    let location = page_location(site, rel)?;
    let (report, host) = include_document(
        &mut doc,
        location,
        &config.include,
        source.clone(),
        RecordingHost::default(),
    )
    .await;
    debug!(
        "build"; "{}: {} in {}, {}",
        rel.display(),
        plural_count(report.included, "include"),
        plural_count(report.passes, "pass"),
        plural_count(host.scripts.len(), "script")
    );

    let dest = config.build.output.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&dest, doc.to_html()).with_context(|| format!("Failed to write {}", dest.display()))?;

    Ok(report)
}

fn report(summary: &BuildSummary) {
    for page in &summary.failed {
        for failure in &page.failures {
            log!("error"; "{}: {}: {}", page.page.display(), failure.url, failure.reason);
        }
    }
    log!(
        "build"; "{} assembled ({}), {} copied, {}",
        plural_count(summary.pages, "page"),
        plural_count(summary.included, "include"),
        plural_count(summary.assets, "asset"),
        plural_count(summary.failure_count(), "failure")
    );
}

// ============================================================================
// tests
// ============================================================================
