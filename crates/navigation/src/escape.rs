//! HTML escaping and attribute serialization.

use std::fmt::Write;

/// Escape special HTML characters to prevent XSS.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Serialize attributes as ` key="value"` pairs.
///
/// Attributes whose value is `None` or empty are left out, so callers can
/// pass optional page fields straight through.
pub fn html_attribs<'a, I>(attribs: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut out = String::new();
    for (key, value) in attribs {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        // Writing into a String cannot fail.
        let _ = write!(out, " {}=\"{}\"", html_escape(key), html_escape(value));
    }
    out
}
