//! Page nodes and their serializable definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single navigable entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Display label.
    pub label: String,
    /// Link destination. Pages without a uri (and fragment) render as `<span>`.
    pub uri: Option<String>,
    /// Fragment appended to the uri as `#fragment`.
    pub fragment: Option<String>,
    /// HTML `id` attribute.
    pub id: Option<String>,
    /// CSS class for the anchor (or the list item, see `Menu`).
    pub class: Option<String>,
    /// HTML `title` attribute.
    pub title: Option<String>,
    /// Link target (e.g. `_blank`).
    pub target: Option<String>,
    /// Forward relations, keyed by relation name (e.g. `alternate`).
    pub rel: BTreeMap<String, Relation>,
    /// Reverse relations, keyed by relation name.
    pub rev: BTreeMap<String, Relation>,
    /// Explicit sort position among siblings.
    pub order: Option<i32>,
    /// ACL resource guarding this page.
    pub resource: Option<String>,
    /// ACL privilege required on `resource`.
    pub privilege: Option<String>,
    /// Explicitly marked as the current page.
    pub active: bool,
    /// Whether the page appears in rendered output.
    pub visible: bool,
    /// Extra HTML attributes emitted on the rendered link.
    pub attributes: BTreeMap<String, String>,
    /// Free-form properties (`lastmod`, `changefreq`, `priority`, ...).
    pub properties: BTreeMap<String, Value>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            label: String::new(),
            uri: None,
            fragment: None,
            id: None,
            class: None,
            title: None,
            target: None,
            rel: BTreeMap::new(),
            rev: BTreeMap::new(),
            order: None,
            resource: None,
            privilege: None,
            active: false,
            visible: true,
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }
}

impl Page {
    /// Create a visible page with a label and no destination.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Create a page pointing at a uri.
    pub fn uri(label: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::new(label).with_uri(uri)
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_privilege(mut self, privilege: impl Into<String>) -> Self {
        self.privilege = Some(privilege.into());
        self
    }

    pub fn with_rel(mut self, name: impl Into<String>, relation: Relation) -> Self {
        self.rel.insert(name.into(), relation);
        self
    }

    pub fn with_rev(mut self, name: impl Into<String>, relation: Relation) -> Self {
        self.rev.insert(name.into(), relation);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Mark the page as the current one.
    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }

    /// Hide the page from rendering.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// The link destination: uri plus fragment.
    pub fn href(&self) -> Option<String> {
        let uri = self.uri.as_deref().unwrap_or_default();
        match self.fragment.as_deref() {
            Some(fragment) if uri.ends_with('#') => Some(format!("{uri}{fragment}")),
            Some(fragment) => Some(format!("{uri}#{fragment}")),
            None if uri.is_empty() => None,
            None => Some(uri.to_string()),
        }
    }

    /// Look up a property by name for searching.
    ///
    /// Named fields (`label`, `uri`, `id`, ...) take precedence over custom
    /// properties. Non-string custom values are compared by their JSON text.
    pub fn property(&self, name: &str) -> Option<String> {
        let field = match name {
            "label" => Some(&self.label),
            "uri" => self.uri.as_ref(),
            "fragment" => self.fragment.as_ref(),
            "id" => self.id.as_ref(),
            "class" => self.class.as_ref(),
            "title" => self.title.as_ref(),
            "target" => self.target.as_ref(),
            "resource" => self.resource.as_ref(),
            "privilege" => self.privilege.as_ref(),
            "order" => return self.order.map(|o| o.to_string()),
            _ => {
                return self.properties.get(name).map(|value| match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
            }
        };
        field.cloned()
    }

    /// Relations for `rel` or `rev`.
    pub fn relations(&self, reverse: bool) -> &BTreeMap<String, Relation> {
        if reverse { &self.rev } else { &self.rel }
    }
}

/// Target of a `rel`/`rev` relation declared on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Relation {
    /// A bare uri; becomes an unlabeled page.
    Uri(String),
    /// Several targets for the same relation.
    Many(Vec<Relation>),
    /// An inline page definition.
    Page(Box<PageSpec>),
}

impl Relation {
    /// Flatten into standalone pages.
    pub fn to_pages(&self) -> Vec<Page> {
        match self {
            Self::Uri(uri) => vec![Page::default().with_uri(uri.clone())],
            Self::Many(items) => items.iter().flat_map(Relation::to_pages).collect(),
            Self::Page(spec) => vec![spec.to_page()],
        }
    }
}

impl From<&str> for Relation {
    fn from(uri: &str) -> Self {
        Self::Uri(uri.to_string())
    }
}

/// Serializable, nested page definition.
///
/// Keys that are not page fields are collected into `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rel: BTreeMap<String, Relation>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rev: BTreeMap<String, Relation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privilege: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Child pages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageSpec>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

fn default_true() -> bool {
    true
}

/// Key the `toml` deserializer wraps native dates and times in.
const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

/// Replace TOML date/time wrappers with their string form.
fn plain_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => match map.get(TOML_DATETIME_KEY) {
            Some(Value::String(s)) if map.len() == 1 => Value::String(s.clone()),
            _ => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), plain_value(v)))
                    .collect(),
            ),
        },
        Value::Array(items) => Value::Array(items.iter().map(plain_value).collect()),
        other => other.clone(),
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            label: String::new(),
            uri: None,
            fragment: None,
            id: None,
            class: None,
            title: None,
            target: None,
            rel: BTreeMap::new(),
            rev: BTreeMap::new(),
            order: None,
            resource: None,
            privilege: None,
            active: false,
            visible: true,
            attributes: BTreeMap::new(),
            pages: Vec::new(),
            properties: BTreeMap::new(),
        }
    }
}

impl PageSpec {
    /// Build the page node described by this spec, without its children.
    pub fn to_page(&self) -> Page {
        Page {
            label: self.label.clone(),
            uri: self.uri.clone(),
            fragment: self.fragment.clone(),
            id: self.id.clone(),
            class: self.class.clone(),
            title: self.title.clone(),
            target: self.target.clone(),
            rel: self.rel.clone(),
            rev: self.rev.clone(),
            order: self.order,
            resource: self.resource.clone(),
            privilege: self.privilege.clone(),
            active: self.active,
            visible: self.visible,
            attributes: self.attributes.clone(),
            properties: self
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), plain_value(v)))
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::format::DocumentFormat;

    #[test]
    fn toml_dates_become_strings() {
        let toml = r#"
label = "Home"
uri = "/"
lastmod = 2024-03-01
published = 1979-05-27T07:32:00Z
"#;
        let spec: PageSpec = DocumentFormat::Toml.parse(toml).unwrap();
        let page = spec.to_page();
        assert_eq!(page.properties["lastmod"], Value::from("2024-03-01"));
        assert_eq!(page.properties["published"], Value::from("1979-05-27T07:32:00Z"));
    }

    #[test]
    fn href_joins_fragment() {
        let page = Page::uri("Docs", "/docs").with_fragment("install");
        assert_eq!(page.href().as_deref(), Some("/docs#install"));

        let page = Page::uri("Docs", "/docs#").with_fragment("install");
        assert_eq!(page.href().as_deref(), Some("/docs#install"));

        let page = Page::new("Anchor").with_fragment("top");
        assert_eq!(page.href().as_deref(), Some("#top"));
    }

    #[test]
    fn href_missing_without_uri() {
        assert!(Page::new("Label only").href().is_none());
        assert!(Page::uri("Empty", "").href().is_none());
    }

    #[test]
    fn property_prefers_fields() {
        let page = Page::uri("Home", "/")
            .with_property("label", "shadowed")
            .with_property("priority", 0.8)
            .with_property("changefreq", "daily");
        assert_eq!(page.property("label").as_deref(), Some("Home"));
        assert_eq!(page.property("priority").as_deref(), Some("0.8"));
        assert_eq!(page.property("changefreq").as_deref(), Some("daily"));
        assert!(page.property("missing").is_none());
    }

    #[test]
    fn spec_collects_unknown_keys() {
        let json = r#"{
            "label": "Blog",
            "uri": "/blog",
            "lastmod": "2024-03-01",
            "pages": [{"label": "Post", "uri": "/blog/post", "visible": false}]
        }"#;
        let spec: PageSpec = serde_json::from_str(json).unwrap();
        assert!(spec.visible);
        assert_eq!(spec.pages.len(), 1);
        assert!(!spec.pages[0].visible);
        assert_eq!(
            spec.properties.get("lastmod"),
            Some(&Value::String("2024-03-01".to_string()))
        );
        assert!(!spec.properties.contains_key("pages"));
    }

    #[test]
    fn relation_variants_flatten() {
        let json = r#"{
            "alternate": "/feed.xml",
            "bookmark": ["/a", {"label": "B", "uri": "/b"}]
        }"#;
        let rels: BTreeMap<String, Relation> = serde_json::from_str(json).unwrap();

        let alternate = rels["alternate"].to_pages();
        assert_eq!(alternate.len(), 1);
        assert_eq!(alternate[0].href().as_deref(), Some("/feed.xml"));
        assert!(alternate[0].label.is_empty());

        let bookmarks = rels["bookmark"].to_pages();
        assert_eq!(bookmarks.len(), 2);
        assert_eq!(bookmarks[1].label, "B");
    }
}
