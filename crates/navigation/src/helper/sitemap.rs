//! XML sitemaps (sitemaps.org protocol 0.9).

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::HelperOptions;
use crate::container::{Container, Page};
use crate::error::{NavigationError, NavigationResult};

/// Sitemap XML namespace.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

const CHANGEFREQS: [&str; 7] = [
    "always", "hourly", "daily", "weekly", "monthly", "yearly", "never",
];

#[allow(clippy::expect_used)]
static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z]+:").expect("valid regex literal"));

#[allow(clippy::expect_used)]
static W3C_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])(T([01]\d|2[0-3]):[0-5]\d(:[0-5]\d)?(Z|[+-]([01]\d|2[0-3]):[0-5]\d))?$",
    )
    .expect("valid regex literal")
});

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: Option<String>,
    pub priority: Option<String>,
}

/// Sitemap helper.
#[derive(Debug, Clone)]
pub struct Sitemap {
    pub options: HelperOptions,
    /// Scheme and host prepended to root-relative hrefs.
    pub server_url: String,
    /// Base path prepended to document-relative hrefs.
    pub base_path: String,
    /// Pretty-print the XML.
    pub format_output: bool,
    pub use_xml_declaration: bool,
    /// Reject invalid locations and drop invalid `lastmod`, `changefreq`
    /// and `priority` values.
    pub use_sitemap_validators: bool,
}

impl Default for Sitemap {
    fn default() -> Self {
        Self {
            options: HelperOptions::default(),
            server_url: "http://localhost".to_string(),
            base_path: "/".to_string(),
            format_output: false,
            use_xml_declaration: true,
            use_sitemap_validators: true,
        }
    }
}

impl Sitemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: HelperOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_format_output(mut self, format_output: bool) -> Self {
        self.format_output = format_output;
        self
    }

    pub fn with_xml_declaration(mut self, use_xml_declaration: bool) -> Self {
        self.use_xml_declaration = use_xml_declaration;
        self
    }

    pub fn with_validators(mut self, use_sitemap_validators: bool) -> Self {
        self.use_sitemap_validators = use_sitemap_validators;
        self
    }

    /// Render the sitemap document.
    pub fn render(&self, container: &Container) -> NavigationResult<String> {
        let entries = self.entries(container)?;
        let body = self.write_urlset(&entries)?;

        if self.use_xml_declaration {
            Ok(format!("{XML_DECLARATION}\n{body}"))
        } else {
            Ok(body)
        }
    }

    /// Collect one entry per accepted page with an href, in traversal order.
    ///
    /// URLs already emitted are skipped.
    pub fn entries(&self, container: &Container) -> NavigationResult<Vec<SitemapEntry>> {
        let opts = &self.options;
        let min_depth = opts.min_depth();
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for (id, depth) in container.iter(None, opts.max_depth) {
            if depth < min_depth || !opts.accept(container, id, true) {
                continue;
            }
            let Some(page) = container.page(id) else {
                continue;
            };
            let Some(href) = page.href() else {
                continue;
            };

            let loc = self.absolute_url(&href);
            if !seen.insert(loc.clone()) {
                continue;
            }

            if self.use_sitemap_validators && !is_valid_loc(&loc) {
                return Err(NavigationError::InvalidSitemapUrl(loc));
            }

            entries.push(SitemapEntry {
                lastmod: self.lastmod(page),
                changefreq: self.changefreq(page),
                priority: self.priority(page),
                loc,
            });
        }

        debug!(urls = entries.len(), "collected sitemap entries");
        Ok(entries)
    }

    /// Turn a page href into an absolute URL.
    pub fn absolute_url(&self, href: &str) -> String {
        let server = self.server_url.trim_end_matches('/');

        if href.starts_with('/') {
            format!("{server}{href}")
        } else if SCHEME.is_match(href) {
            href.to_string()
        } else {
            let base = self.base_path.trim_matches('/');
            if base.is_empty() {
                format!("{server}/{href}")
            } else {
                format!("{server}/{base}/{href}")
            }
        }
    }

    fn lastmod(&self, page: &Page) -> Option<String> {
        let raw = page.properties.get("lastmod")?;
        match parse_lastmod(raw) {
            Some(lastmod) if !self.use_sitemap_validators || W3C_DATETIME.is_match(&lastmod) => {
                Some(lastmod)
            }
            None if !self.use_sitemap_validators => Some(value_text(raw)),
            _ => {
                warn!(label = %page.label, lastmod = %raw, "skipping invalid sitemap lastmod");
                None
            }
        }
    }

    fn changefreq(&self, page: &Page) -> Option<String> {
        let value = value_text(page.properties.get("changefreq")?);
        if !self.use_sitemap_validators || CHANGEFREQS.contains(&value.as_str()) {
            Some(value)
        } else {
            warn!(label = %page.label, changefreq = %value, "skipping invalid sitemap changefreq");
            None
        }
    }

    fn priority(&self, page: &Page) -> Option<String> {
        let value = value_text(page.properties.get("priority")?);
        let valid = value
            .parse::<f64>()
            .is_ok_and(|p| (0.0..=1.0).contains(&p));
        if !self.use_sitemap_validators || valid {
            Some(value)
        } else {
            warn!(label = %page.label, priority = %value, "skipping invalid sitemap priority");
            None
        }
    }

    fn write_urlset(&self, entries: &[SitemapEntry]) -> NavigationResult<String> {
        let mut writer = if self.format_output {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };

        let mut urlset = BytesStart::new("urlset");
        urlset.push_attribute(("xmlns", SITEMAP_NS));

        if entries.is_empty() {
            write_event(&mut writer, Event::Empty(urlset))?;
        } else {
            write_event(&mut writer, Event::Start(urlset))?;
            for entry in entries {
                write_event(&mut writer, Event::Start(BytesStart::new("url")))?;
                write_text_element(&mut writer, "loc", &entry.loc)?;
                if let Some(lastmod) = &entry.lastmod {
                    write_text_element(&mut writer, "lastmod", lastmod)?;
                }
                if let Some(changefreq) = &entry.changefreq {
                    write_text_element(&mut writer, "changefreq", changefreq)?;
                }
                if let Some(priority) = &entry.priority {
                    write_text_element(&mut writer, "priority", priority)?;
                }
                write_event(&mut writer, Event::End(BytesEnd::new("url")))?;
            }
            write_event(&mut writer, Event::End(BytesEnd::new("urlset")))?;
        }

        String::from_utf8(writer.into_inner()).map_err(|e| NavigationError::Xml(e.to_string()))
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> NavigationResult<()> {
    writer
        .write_event(event)
        .map_err(|e| NavigationError::Xml(e.to_string()))
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> NavigationResult<()> {
    write_event(writer, Event::Start(BytesStart::new(name)))?;
    write_event(writer, Event::Text(BytesText::new(text)))?;
    write_event(writer, Event::End(BytesEnd::new(name)))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Absolute http(s) URL with a host.
fn is_valid_loc(loc: &str) -> bool {
    Url::parse(loc).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

const LOCAL_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Normalize a `lastmod` property to an ISO 8601 timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (with a space or `T`),
/// `YYYY-MM-DD` (all read as UTC when no offset is given) and unix
/// timestamps.
fn parse_lastmod(value: &Value) -> Option<String> {
    let utc: DateTime<Utc> = match value {
        Value::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0)?,
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.to_rfc3339_opts(SecondsFormat::Secs, false));
            }
            if let Some(dt) = LOCAL_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            {
                dt.and_utc()
            } else if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                date.and_hms_opt(0, 0, 0)?.and_utc()
            } else if let Ok(ts) = s.parse::<i64>() {
                DateTime::from_timestamp(ts, 0)?
            } else {
                return None;
            }
        }
        _ => return None,
    };

    Some(utc.to_rfc3339_opts(SecondsFormat::Secs, false))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sitemap() -> Sitemap {
        Sitemap::new().with_server_url("http://www.example.com")
    }

    #[test]
    fn absolute_urls() {
        let s = sitemap();
        assert_eq!(s.absolute_url("/about"), "http://www.example.com/about");
        assert_eq!(s.absolute_url("https://other.org/x"), "https://other.org/x");
        assert_eq!(s.absolute_url("MAILTO:x@y.z"), "MAILTO:x@y.z");
        assert_eq!(s.absolute_url("about"), "http://www.example.com/about");

        let s = sitemap().with_base_path("/app/");
        assert_eq!(s.absolute_url("about"), "http://www.example.com/app/about");
        assert_eq!(s.absolute_url("/about"), "http://www.example.com/about");
    }

    #[test]
    fn lastmod_formats() {
        let rfc = parse_lastmod(&Value::from("2024-05-06T07:08:09+02:00")).unwrap();
        assert_eq!(rfc, "2024-05-06T07:08:09+02:00");

        let date = parse_lastmod(&Value::from("2024-01-02")).unwrap();
        assert_eq!(date, "2024-01-02T00:00:00+00:00");

        let datetime = parse_lastmod(&Value::from("2024-01-02 03:04:05")).unwrap();
        assert_eq!(datetime, "2024-01-02T03:04:05+00:00");

        let ts = parse_lastmod(&Value::from(0)).unwrap();
        assert_eq!(ts, "1970-01-01T00:00:00+00:00");

        let local = parse_lastmod(&Value::from("2024-01-02T03:04:05.250")).unwrap();
        assert_eq!(local, "2024-01-02T03:04:05+00:00");

        assert!(parse_lastmod(&Value::from("next tuesday")).is_none());
        assert!(W3C_DATETIME.is_match(&date));
    }

    #[test]
    fn toml_native_dates() {
        let toml = r#"
[[pages]]
label = "Home"
uri = "/"
lastmod = 2024-03-01

[[pages]]
label = "News"
uri = "/news"
lastmod = 2024-03-02T08:30:00
"#;
        let c = Container::from_toml_str(toml).unwrap();

        let entries = sitemap().entries(&c).unwrap();
        assert_eq!(entries[0].lastmod.as_deref(), Some("2024-03-01T00:00:00+00:00"));
        assert_eq!(entries[1].lastmod.as_deref(), Some("2024-03-02T08:30:00+00:00"));

        let xml = sitemap().with_validators(false).render(&c).unwrap();
        assert!(xml.contains("<lastmod>2024-03-01T00:00:00+00:00</lastmod>"));
        assert!(!xml.contains("toml"));
    }

    #[test]
    fn loc_validation() {
        assert!(is_valid_loc("http://www.example.com/a?b=c"));
        assert!(!is_valid_loc("mailto:x@example.com"));
        assert!(!is_valid_loc("not a url"));
    }

    #[test]
    fn empty_urlset() {
        let xml = sitemap().render(&Container::new()).unwrap();
        assert_eq!(
            xml,
            format!("{XML_DECLARATION}\n<urlset xmlns=\"{SITEMAP_NS}\"/>")
        );
    }

    #[test]
    fn entries_with_metadata() {
        let mut c = Container::new();
        c.add_page(
            None,
            Page::uri("Home", "/")
                .with_property("lastmod", "2024-01-02")
                .with_property("changefreq", "weekly")
                .with_property("priority", 0.5),
        )
        .unwrap();
        c.add_page(
            None,
            Page::uri("News", "/news")
                .with_property("changefreq", "sometimes")
                .with_property("priority", "1.5")
                .with_property("lastmod", "yesterday-ish"),
        )
        .unwrap();

        let xml = sitemap().with_xml_declaration(false).render(&c).unwrap();
        assert_eq!(
            xml,
            format!(
                "<urlset xmlns=\"{SITEMAP_NS}\"><url><loc>http://www.example.com/</loc><lastmod>2024-01-02T00:00:00+00:00</lastmod><changefreq>weekly</changefreq><priority>0.5</priority></url><url><loc>http://www.example.com/news</loc></url></urlset>"
            )
        );
    }

    #[test]
    fn validators_off_copies_values() {
        let mut c = Container::new();
        c.add_page(
            None,
            Page::uri("News", "/news")
                .with_property("changefreq", "sometimes")
                .with_property("lastmod", "yesterday-ish"),
        )
        .unwrap();

        let entries = sitemap().with_validators(false).entries(&c).unwrap();
        assert_eq!(entries[0].changefreq.as_deref(), Some("sometimes"));
        assert_eq!(entries[0].lastmod.as_deref(), Some("yesterday-ish"));
    }

    #[test]
    fn invalid_loc_is_an_error() {
        let mut c = Container::new();
        c.add_page(None, Page::uri("Mail", "mailto:team@example.com"))
            .unwrap();

        let err = sitemap().render(&c).unwrap_err();
        assert!(matches!(
            err,
            NavigationError::InvalidSitemapUrl(url) if url == "mailto:team@example.com"
        ));

        assert!(sitemap().with_validators(false).render(&c).is_ok());
    }

    #[test]
    fn duplicates_and_hrefless_pages_skipped() {
        let mut c = Container::new();
        c.add_page(None, Page::uri("A", "/a")).unwrap();
        c.add_page(None, Page::new("Heading")).unwrap();
        c.add_page(None, Page::uri("A again", "/a")).unwrap();
        c.add_page(None, Page::uri("Escaped", "/search?q=a&page=2"))
            .unwrap();

        let entries = sitemap().entries(&c).unwrap();
        let locs: Vec<&str> = entries.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            vec!["http://www.example.com/a", "http://www.example.com/search?q=a&page=2"]
        );

        let xml = sitemap().render(&c).unwrap();
        assert!(xml.contains("<loc>http://www.example.com/search?q=a&amp;page=2</loc>"));
    }

    #[test]
    fn formatted_output_is_indented() {
        let mut c = Container::new();
        c.add_page(None, Page::uri("A", "/a")).unwrap();

        let xml = sitemap().with_format_output(true).render(&c).unwrap();
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains("\n  <url>\n    <loc>http://www.example.com/a</loc>\n  </url>\n"));
        assert!(xml.ends_with("</urlset>"));
    }
}
