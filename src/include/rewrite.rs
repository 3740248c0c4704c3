//! Fragment URL fixups applied before insertion.
//!
//! Two passes over a parsed fragment:
//!
//! 1. Root-absolute values in URL-bearing attributes get the base prefix,
//!    so `/img/logo.png` keeps working on a sub-path deployment.
//! 2. Nested include directives become absolute URLs resolved against the
//!    fragment's own URL, so later passes don't depend on where the
//!    fragment ended up.

use std::borrow::Cow;

use url::Url;

use super::IncludeError;
use crate::base::{BasePath, needs_prefix};
use crate::core::LinkKind;
use crate::debug;
use crate::dom::{Document, Element};

/// URL-bearing attributes per tag. The include attribute is handled on
/// every element separately.
const URL_ATTRS: &[(&[&str], &str)] = &[
    (&["a", "area", "link", "use"], "href"),
    (&["use"], "xlink:href"),
    (
        &[
            "img", "script", "source", "video", "audio", "iframe", "embed", "track", "input",
        ],
        "src",
    ),
    (&["video"], "poster"),
    (&["form"], "action"),
];

/// Prefix root-absolute URL attributes with `base`. Returns how many
/// values changed.
pub fn prefix_root_urls(fragment: &mut Document, base: &BasePath, include_attr: &str) -> usize {
    if base.is_root() {
        return 0;
    }

    let mut changed = 0;
    for id in fragment.descendants(fragment.root()) {
        let Some(elem) = fragment.element_mut(id) else {
            continue;
        };
        for &(tags, attr) in URL_ATTRS {
            if tags.contains(&elem.name.as_str()) {
                changed += prefix_attr(elem, attr, base);
            }
        }
        changed += prefix_attr(elem, include_attr, base);
    }
    changed
}

fn prefix_attr(elem: &mut Element, attr: &str, base: &BasePath) -> usize {
    let Some(value) = elem.attr(attr) else {
        return 0;
    };
    if !needs_prefix(value, base) {
        return 0;
    }
    let prefixed = base.prefix(value);
    elem.set_attr(attr, prefixed);
    1
}

/// Turn a directive into the absolute URL to fetch.
///
/// Root-absolute directives are base-prefixed first; everything else
/// resolves against `against` as-is.
pub fn resolve_directive(
    directive: &str,
    base: &BasePath,
    against: &Url,
) -> Result<Url, IncludeError> {
    let value = match LinkKind::parse(directive) {
        LinkKind::SiteRoot(path) => Cow::Owned(base.prefix(path)),
        _ => Cow::Borrowed(directive),
    };
    against
        .join(&value)
        .map_err(|source| IncludeError::InvalidUrl {
            url: directive.to_string(),
            source,
        })
}

/// Rewrite nested directives to absolute URLs relative to `fragment_url`.
///
/// Empty and unresolvable directives are left untouched; the engine
/// reports them when it reaches them.
pub fn absolutize_directives(
    fragment: &mut Document,
    include_attr: &str,
    base: &BasePath,
    fragment_url: &Url,
) {
    for id in fragment.elements_with_attr(include_attr) {
        let Some(directive) = fragment
            .attr(id, include_attr)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        match resolve_directive(&directive, base, fragment_url) {
            Ok(url) => fragment.set_attr(id, include_attr, url.as_str()),
            Err(err) => debug!("include"; "leaving nested directive as-is: {}", err),
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> BasePath {
        BasePath::from_path("/docs")
    }

    fn fragment(html: &str) -> Document {
        Document::parse(html)
    }

    fn attr_of(doc: &Document, tag: &str, attr: &str) -> String {
        let id = doc.elements_by_name(tag)[0];
        doc.attr(id, attr).unwrap().to_string()
    }

    #[test]
    fn test_prefix_root_urls() {
        let mut doc = fragment(
            r#"<a href="/about">About</a><img src="/img/logo.png"><form action="/search"></form><video poster="/p.jpg" src="/v.mp4"></video>"#,
        );
        let changed = prefix_root_urls(&mut doc, &docs(), "data-include");
        assert_eq!(changed, 5);
        assert_eq!(attr_of(&doc, "a", "href"), "/docs/about");
        assert_eq!(attr_of(&doc, "img", "src"), "/docs/img/logo.png");
        assert_eq!(attr_of(&doc, "form", "action"), "/docs/search");
        assert_eq!(attr_of(&doc, "video", "poster"), "/docs/p.jpg");
        assert_eq!(attr_of(&doc, "video", "src"), "/docs/v.mp4");
    }

    #[test]
    fn test_prefix_skips_non_root_values() {
        let mut doc = fragment(
            r##"<a href="https://x.com/a">x</a><script src="//cdn.example.com/lib.js"></script><a href="rel.html">r</a><a href="#top">t</a><a href="/docs/ok">ok</a>"##,
        );
        let before = doc.to_html();
        assert_eq!(prefix_root_urls(&mut doc, &docs(), "data-include"), 0);
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn test_prefix_is_idempotent() {
        let mut doc = fragment(r#"<link href="/style.css"><div data-include="/partials/a.html"></div>"#);
        assert_eq!(prefix_root_urls(&mut doc, &docs(), "data-include"), 2);
        let once = doc.to_html();
        assert_eq!(prefix_root_urls(&mut doc, &docs(), "data-include"), 0);
        assert_eq!(doc.to_html(), once);
        assert!(!once.contains("/docs/docs"));
    }

    #[test]
    fn test_prefix_ignores_unlisted_attributes() {
        let mut doc = fragment(r#"<div src="/x" data-href="/y"></div><img href="/z">"#);
        assert_eq!(prefix_root_urls(&mut doc, &docs(), "data-include"), 0);
    }

    #[test]
    fn test_prefix_root_base_is_noop() {
        let mut doc = fragment(r#"<a href="/about">About</a>"#);
        assert_eq!(prefix_root_urls(&mut doc, &BasePath::root(), "data-include"), 0);
        assert_eq!(attr_of(&doc, "a", "href"), "/about");
    }

    #[test]
    fn test_resolve_directive() {
        let page = Url::parse("https://example.com/docs/guide/index.html").unwrap();
        let resolve = |d: &str| resolve_directive(d, &docs(), &page).unwrap().to_string();

        assert_eq!(resolve("/partials/nav.html"), "https://example.com/docs/partials/nav.html");
        assert_eq!(resolve("/docs/partials/nav.html"), "https://example.com/docs/partials/nav.html");
        assert_eq!(resolve("nav.html"), "https://example.com/docs/guide/nav.html");
        assert_eq!(resolve("../nav.html"), "https://example.com/docs/nav.html");
        assert_eq!(resolve("https://cdn.example.com/x.html"), "https://cdn.example.com/x.html");
        assert_eq!(resolve("//cdn.example.com/x.html"), "https://cdn.example.com/x.html");
    }

    #[test]
    fn test_resolve_directive_invalid() {
        let page = Url::parse("https://example.com/").unwrap();
        let err = resolve_directive("http://[oops", &BasePath::root(), &page).unwrap_err();
        assert!(matches!(err, IncludeError::InvalidUrl { .. }));
    }

    #[test]
    fn test_absolutize_directives() {
        let mut doc = fragment(
            r#"<div data-include="footer.html"></div><p><span data-include="/partials/x.html"></span></p><i data-include=""></i>"#,
        );
        let fragment_url = Url::parse("https://example.com/docs/partials/header.html").unwrap();
        absolutize_directives(&mut doc, "data-include", &docs(), &fragment_url);

        let values: Vec<_> = doc
            .elements_with_attr("data-include")
            .into_iter()
            .map(|id| doc.attr(id, "data-include").unwrap().to_string())
            .collect();
        assert_eq!(
            values,
            [
                "https://example.com/docs/partials/footer.html",
                "https://example.com/docs/partials/x.html",
                "",
            ]
        );
    }
}
