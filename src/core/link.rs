//! Link classification utilities.

/// Syntactic classification of URL attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind<'a> {
    /// Link with a URL scheme (https://, mailto:, data:, etc.)
    External(&'a str),
    /// Scheme-relative link (//cdn.example.com/x.js). Never base-prefixed.
    ProtocolRelative(&'a str),
    /// Pure fragment/anchor link (#section). Value is anchor without `#`.
    Fragment(&'a str),
    /// Site-root-relative path (/about, /partials/header.html).
    SiteRoot(&'a str),
    /// Document-relative path (./nav.html, ../other, nav.html).
    Relative(&'a str),
}

impl<'a> LinkKind<'a> {
    /// Parse a link string into its syntactic kind.
    #[inline]
    pub fn parse(link: &'a str) -> Self {
        if is_external_link(link) {
            Self::External(link)
        } else if link.starts_with("//") {
            Self::ProtocolRelative(link)
        } else if let Some(anchor) = link.strip_prefix('#') {
            Self::Fragment(anchor)
        } else if link.starts_with('/') {
            Self::SiteRoot(link)
        } else {
            Self::Relative(link)
        }
    }

    /// Check if link is root-absolute, i.e. subject to base prefixing.
    #[inline]
    pub fn is_site_root(link: &str) -> bool {
        matches!(LinkKind::parse(link), LinkKind::SiteRoot(_))
    }
}

/// Check if a link has a URL scheme (http:, mailto:, etc.)
///
/// A valid scheme must:
/// - Have at least 1 character before the colon
/// - Only contain ASCII alphanumeric or `+`, `-`, `.`
#[inline]
pub fn is_external_link(link: &str) -> bool {
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}
