//! Plain-text helpers for rich survey titles.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
}

/// Removes HTML tags, keeping the text between them.
pub fn strip_tags(input: &str) -> String {
    TAG_RE.replace_all(input, "").trim().to_string()
}

/// Replaces every non-ASCII character with `?`.
pub fn ascii_safe(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<h1>Staff <em>survey</em></h1>"), "Staff survey");
        assert_eq!(strip_tags("Plain"), "Plain");
        assert_eq!(strip_tags("<p\nclass=\"x\">A</p>"), "A");
    }

    #[test]
    fn test_ascii_safe() {
        assert_eq!(ascii_safe("Region ኦሮሚያ"), "Region ????");
        assert_eq!(ascii_safe("plain"), "plain");
    }
}
