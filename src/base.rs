//! Base path detection.
//!
//! Works out the path prefix a site is deployed under (`/handbook` for
//! `https://alice.github.io/handbook/`), so root-absolute references in
//! fragments can be corrected.
//!
//! # Resolution Order
//!
//! | Rule            | Source                                              |
//! |-----------------|-----------------------------------------------------|
//! | `Override`      | `include.base` / `--base` / `INCLUDER_BASE`          |
//! | `BaseHref`      | `<base href>` path, directory-normalized             |
//! | `SelfLocation`  | `<script src>` ending in the loader asset suffix     |
//! | `Hosting`       | first path segment on `*.github.io`-style hosts      |
//!
//! The first rule that applies wins; nothing applying means the site root.
//! Detection never fails: a malformed URL anywhere falls back to the root.

use std::fmt;

use url::Url;

use crate::config::IncludeConfig;
use crate::core::LinkKind;
use crate::debug;
use crate::dom::Document;

// ============================================================================
// BasePath
// ============================================================================

/// Deployment path prefix.
///
/// Invariants (for detected values):
/// - Empty means the domain root
/// - Otherwise starts with `/` and has no trailing slash
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BasePath(String);

impl BasePath {
    /// The domain root (empty prefix).
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Normalize a detected URL path: trailing slash dropped, `/` is root.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        Self(trimmed.to_string())
    }

    /// Explicit override: kept verbatim apart from one trailing slash.
    pub fn verbatim(raw: &str) -> Self {
        Self(raw.strip_suffix('/').unwrap_or(raw).to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a root-absolute path already carries this prefix.
    pub fn is_prefixed(&self, path: &str) -> bool {
        if self.is_root() {
            return true;
        }
        path.strip_prefix(self.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
    }

    /// Prefix a root-absolute path. Idempotent.
    ///
    /// ```ignore
    /// let base = BasePath::from_path("/docs");
    /// assert_eq!(base.prefix("/about"), "/docs/about");
    /// assert_eq!(base.prefix("/docs/about"), "/docs/about");
    /// ```
    pub fn prefix(&self, path: &str) -> String {
        if self.is_prefixed(path) {
            path.to_string()
        } else {
            format!("{}{}", self.0, path)
        }
    }
}

impl fmt::Display for BasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(self.as_str())
        }
    }
}

// ============================================================================
// Page context
// ============================================================================

/// Everything base detection is allowed to look at.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Where the page is (or will be) served.
    pub location: Url,
    pub override_base: Option<String>,
    /// Raw `href` of the first `<base href>`.
    pub base_href: Option<String>,
    /// Raw `src` of every `<script src>`, in document order.
    pub script_srcs: Vec<String>,
}

impl PageContext {
    pub fn new(location: Url) -> Self {
        Self {
            location,
            override_base: None,
            base_href: None,
            script_srcs: Vec::new(),
        }
    }

    /// Collect `<base href>` and `<script src>` from a parsed page.
    pub fn from_document(doc: &Document, location: Url) -> Self {
        let base_href = doc
            .elements_by_name("base")
            .into_iter()
            .find_map(|id| doc.attr(id, "href").map(str::to_string));

        let script_srcs = doc
            .elements_by_name("script")
            .into_iter()
            .filter_map(|id| doc.attr(id, "src"))
            .filter(|src| !src.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            base_href,
            script_srcs,
            ..Self::new(location)
        }
    }

    pub fn with_override(mut self, base: Option<String>) -> Self {
        self.override_base = base;
        self
    }
}

/// Which rule produced a base path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSource {
    Override,
    BaseHref,
    SelfLocation,
    Hosting,
}

impl fmt::Display for BaseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Override => "explicit override",
            Self::BaseHref => "<base href>",
            Self::SelfLocation => "loader script location",
            Self::Hosting => "hosting heuristic",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the base path for one page. Never fails.
pub fn resolve_base_path(ctx: &PageContext, config: &IncludeConfig) -> BasePath {
    match detect_base(ctx, config) {
        Ok(Some((base, source))) => {
            debug!("base"; "{} (from {})", base, source);
            base
        }
        Ok(None) => BasePath::root(),
        Err(err) => {
            debug!("base"; "detection failed, assuming site root: {}", err);
            BasePath::root()
        }
    }
}

/// Apply the resolution rules in order.
pub fn detect_base(
    ctx: &PageContext,
    config: &IncludeConfig,
) -> Result<Option<(BasePath, BaseSource)>, url::ParseError> {
    if let Some(raw) = &ctx.override_base {
        return Ok(Some((BasePath::verbatim(raw), BaseSource::Override)));
    }

    if let Some(href) = &ctx.base_href {
        let url = ctx.location.join(href)?;
        return Ok(Some((
            BasePath::from_path(directory_of(url.path())),
            BaseSource::BaseHref,
        )));
    }

    for src in &ctx.script_srcs {
        let url = ctx.location.join(src)?;
        if let Some(root) = url.path().strip_suffix(config.asset_suffix.as_str()) {
            return Ok(Some((BasePath::from_path(root), BaseSource::SelfLocation)));
        }
    }

    if let Some(base) = hosting_base(&ctx.location, &config.hosting_suffix) {
        return Ok(Some((base, BaseSource::Hosting)));
    }

    Ok(None)
}

/// Directory part of a URL path.
///
/// A trailing slash is dropped; a last segment that looks like a file
/// (contains `.`) is dropped with it.
fn directory_of(path: &str) -> &str {
    if let Some(dir) = path.strip_suffix('/') {
        return dir;
    }
    match path.rsplit_once('/') {
        Some((dir, last)) if last.contains('.') => dir,
        _ => path,
    }
}

/// First path segment when the host matches the hosting suffix.
fn hosting_base(location: &Url, suffix: &str) -> Option<BasePath> {
    if suffix.is_empty() {
        return None;
    }
    let host = location.host_str()?.to_ascii_lowercase();
    if !host.ends_with(&suffix.to_ascii_lowercase()) {
        return None;
    }
    let first = location.path_segments()?.find(|seg| !seg.is_empty())?;
    Some(BasePath(format!("/{first}")))
}

/// Whether `value` is a root-absolute reference needing the prefix.
#[inline]
pub fn needs_prefix(value: &str, base: &BasePath) -> bool {
    LinkKind::is_site_root(value) && !base.is_prefixed(value)
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(location: &str) -> PageContext {
        PageContext::new(Url::parse(location).unwrap())
    }

    fn resolve(ctx: &PageContext) -> String {
        resolve_base_path(ctx, &IncludeConfig::default())
            .as_str()
            .to_string()
    }

    #[test]
    fn test_base_path_prefix() {
        let base = BasePath::from_path("/docs");
        assert_eq!(base.prefix("/about"), "/docs/about");
        assert_eq!(base.prefix("/"), "/docs/");
        // already prefixed
        assert_eq!(base.prefix("/docs/about"), "/docs/about");
        assert_eq!(base.prefix("/docs"), "/docs");
        assert_eq!(base.prefix("/docs#top"), "/docs#top");
        // shares a prefix string but not a segment
        assert_eq!(base.prefix("/docsearch"), "/docs/docsearch");
    }

    #[test]
    fn test_base_path_prefix_idempotent() {
        let base = BasePath::from_path("/docs/");
        let once = base.prefix("/img/a.png");
        assert_eq!(base.prefix(&once), once);
    }

    #[test]
    fn test_root_never_prefixes() {
        let base = BasePath::root();
        assert!(base.is_root());
        assert_eq!(base.prefix("/about"), "/about");
        assert_eq!(base.to_string(), "/");
        assert_eq!(BasePath::from_path("/"), BasePath::root());
    }

    #[test]
    fn test_override_wins() {
        let mut c = ctx("https://alice.github.io/handbook/guide/");
        c.base_href = Some("/elsewhere/".into());
        let c = c.with_override(Some("/forced/".into()));
        assert_eq!(resolve(&c), "/forced");
    }

    #[test]
    fn test_override_is_verbatim() {
        let c = ctx("https://example.com/").with_override(Some("cdn-root".into()));
        assert_eq!(resolve(&c), "cdn-root");
    }

    #[test]
    fn test_base_href() {
        let mut c = ctx("https://example.com/docs/guide/intro.html");
        c.base_href = Some("/docs/".into());
        assert_eq!(resolve(&c), "/docs");

        c.base_href = Some("/".into());
        assert_eq!(resolve(&c), "");

        // relative href resolves against the location
        c.base_href = Some("../".into());
        assert_eq!(resolve(&c), "/docs");

        // a file-looking last segment is dropped
        c.base_href = Some("/docs/index.html".into());
        assert_eq!(resolve(&c), "/docs");
    }

    #[test]
    fn test_base_href_beats_script() {
        let mut c = ctx("https://example.com/a/");
        c.base_href = Some("/from-base/".into());
        c.script_srcs = vec!["/from-script/assets/includes.js".into()];
        assert_eq!(resolve(&c), "/from-base");
    }

    #[test]
    fn test_self_location() {
        let mut c = ctx("https://example.com/site/page/");
        c.script_srcs = vec![
            "/site/js/other.js".into(),
            "../assets/includes.js?v=3".into(),
        ];
        assert_eq!(resolve(&c), "/site");
    }

    #[test]
    fn test_self_location_at_root() {
        let mut c = ctx("https://example.com/");
        c.script_srcs = vec!["/assets/includes.js".into()];
        let found = detect_base(&c, &IncludeConfig::default()).unwrap();
        assert_eq!(found, Some((BasePath::root(), BaseSource::SelfLocation)));
    }

    #[test]
    fn test_hosting_heuristic() {
        assert_eq!(resolve(&ctx("https://alice.github.io/handbook/guide/")), "/handbook");
        assert_eq!(resolve(&ctx("https://ALICE.GitHub.IO/handbook")), "/handbook");
        // nothing to take
        assert_eq!(resolve(&ctx("https://alice.github.io/")), "");
        // other hosts fall through
        assert_eq!(resolve(&ctx("https://example.com/handbook/")), "");
    }

    #[test]
    fn test_malformed_falls_back_to_root() {
        let mut c = ctx("https://alice.github.io/handbook/");
        c.script_srcs = vec!["http://[broken".into()];
        assert!(detect_base(&c, &IncludeConfig::default()).is_err());
        assert_eq!(resolve(&c), "");
    }

    #[test]
    fn test_from_document() {
        let doc = Document::parse(
            r#"<html><head><base href="/docs/"><script src="/docs/assets/includes.js"></script><script>inline()</script></head></html>"#,
        );
        let c = PageContext::from_document(&doc, Url::parse("https://example.com/docs/").unwrap());
        assert_eq!(c.base_href.as_deref(), Some("/docs/"));
        assert_eq!(c.script_srcs, ["/docs/assets/includes.js"]);
    }

    #[test]
    fn test_needs_prefix() {
        let base = BasePath::from_path("/docs");
        assert!(needs_prefix("/about", &base));
        assert!(!needs_prefix("/docs/about", &base));
        assert!(!needs_prefix("//cdn.example.com/a.js", &base));
        assert!(!needs_prefix("about", &base));
        assert!(!needs_prefix("/about", &BasePath::root()));
    }
}
