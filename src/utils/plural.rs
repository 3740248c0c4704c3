//! Count formatting for log lines.

/// `"1 page"`, `"3 pages"`, `"0 pages"`.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "page"), "0 pages");
        assert_eq!(plural_count(1, "failure"), "1 failure");
        assert_eq!(plural_count(12, "asset"), "12 assets");
    }
}
