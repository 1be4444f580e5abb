//! Navigation helpers and the traversal they share.
//!
//! Every helper walks a [`Container`] under the same rules: a page is
//! rendered only if it (and each of its ancestors) is visible and allowed by
//! the access policy, and the current page is the deepest active one inside
//! a depth window.

mod breadcrumbs;
mod links;
mod menu;
mod sitemap;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::acl::AccessPolicy;
use crate::container::{Container, Page, PageId};
use crate::escape::{html_attribs, html_escape};
use crate::partial::PartialRenderer;

pub use breadcrumbs::Breadcrumbs;
pub use links::{Doctype, FoundRelation, LinkAttribute, LinkTarget, Links, RenderFlags};
pub use menu::Menu;
pub use sitemap::{SITEMAP_NS, Sitemap, SitemapEntry};

/// The deepest active page and its depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePage {
    pub id: PageId,
    pub depth: usize,
}

/// Options shared by all helpers.
#[derive(Clone)]
pub struct HelperOptions {
    /// Pages above this depth are not rendered (default 0).
    pub min_depth: Option<usize>,
    /// Pages below this depth are not rendered (default unbounded).
    pub max_depth: Option<usize>,
    /// Prefix for every rendered line.
    pub indent: String,
    /// Render pages whose `visible` flag is off.
    pub render_invisible: bool,
    /// Consult `policy` when accepting pages.
    pub use_acl: bool,
    pub policy: Option<Arc<dyn AccessPolicy>>,
    pub role: Option<String>,
    pub partials: Option<Arc<PartialRenderer>>,
}

impl Default for HelperOptions {
    fn default() -> Self {
        Self {
            min_depth: None,
            max_depth: None,
            indent: String::new(),
            render_invisible: false,
            use_acl: true,
            policy: None,
            role: None,
            partials: None,
        }
    }
}

impl fmt::Debug for HelperOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperOptions")
            .field("min_depth", &self.min_depth)
            .field("max_depth", &self.max_depth)
            .field("indent", &self.indent)
            .field("render_invisible", &self.render_invisible)
            .field("use_acl", &self.use_acl)
            .field("policy", &self.policy.is_some())
            .field("role", &self.role)
            .field("partials", &self.partials.is_some())
            .finish()
    }
}

impl HelperOptions {
    /// Effective minimum depth.
    pub fn min_depth(&self) -> usize {
        self.min_depth.unwrap_or(0)
    }

    /// Indent by `width` spaces.
    pub fn set_indent_width(&mut self, width: usize) {
        self.indent = " ".repeat(width);
    }

    /// Whether a page passes the visibility and ACL checks.
    ///
    /// With `recursive`, every ancestor must pass as well.
    pub fn accept(&self, container: &Container, id: PageId, recursive: bool) -> bool {
        let Some(page) = container.page(id) else {
            return false;
        };

        if !self.accept_page(page) {
            return false;
        }

        match container.parent(id) {
            Some(parent) if recursive => self.accept(container, parent, true),
            _ => true,
        }
    }

    /// Visibility and ACL check for a single page, ignoring ancestors.
    pub fn accept_page(&self, page: &Page) -> bool {
        if !page.visible && !self.render_invisible {
            return false;
        }

        match &self.policy {
            Some(policy) if self.use_acl => policy.allows(page, self.role.as_deref()),
            _ => true,
        }
    }

    /// Find the deepest accepted active page at or below `min_depth`.
    ///
    /// Equal depths keep the first page in traversal order. When the page is
    /// deeper than `max_depth`, its ancestor at `max_depth` is returned
    /// instead, unless that ancestor sits above `min_depth`.
    pub fn find_active(
        &self,
        container: &Container,
        min_depth: usize,
        max_depth: Option<usize>,
    ) -> Option<ActivePage> {
        let mut found: Option<ActivePage> = None;

        for (id, depth) in container.iter(None, None) {
            if depth < min_depth || !self.accept(container, id, true) {
                continue;
            }
            if container.is_active(id, false) && found.is_none_or(|f| depth > f.depth) {
                found = Some(ActivePage { id, depth });
            }
        }

        let mut found = found?;
        if let Some(max_depth) = max_depth {
            while found.depth > max_depth {
                found.depth -= 1;
                if found.depth < min_depth {
                    return None;
                }
                found.id = container.parent(found.id)?;
            }
        }

        Some(found)
    }
}

/// Render a page as `<a>` (when it has an href) or `<span>`.
///
/// `include_class` puts the page class on the element; the menu turns this
/// off when the class goes on the list item instead.
pub fn htmlify(page: &Page, escape_label: bool, include_class: bool) -> String {
    let href = page.href();

    let mut attribs: Vec<(&str, Option<&str>)> = vec![
        ("id", page.id.as_deref()),
        ("title", page.title.as_deref()),
    ];
    if include_class {
        attribs.push(("class", page.class.as_deref()));
    }

    let element = match href.as_deref() {
        Some(href) => {
            attribs.push(("href", Some(href)));
            attribs.push(("target", page.target.as_deref()));
            "a"
        }
        None => "span",
    };
    attribs.extend(
        page.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), Some(v.as_str()))),
    );

    let label = if escape_label {
        html_escape(&page.label)
    } else {
        page.label.clone()
    };

    format!("<{element}{}>{label}</{element}>", html_attribs(attribs))
}

/// Serializable snapshot of a page for partial templates.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub label: String,
    pub href: Option<String>,
    pub id: Option<String>,
    pub class: Option<String>,
    pub title: Option<String>,
    pub target: Option<String>,
    pub active: bool,
    pub depth: usize,
    /// Pre-rendered link markup.
    pub html: String,
    pub properties: BTreeMap<String, Value>,
    pub pages: Vec<PageView>,
}

impl PageView {
    pub fn new(container: &Container, id: PageId, depth: usize) -> Option<Self> {
        let page = container.page(id)?;
        Some(Self {
            label: page.label.clone(),
            href: page.href(),
            id: page.id.clone(),
            class: page.class.clone(),
            title: page.title.clone(),
            target: page.target.clone(),
            active: container.is_active(id, true),
            depth,
            html: htmlify(page, true, true),
            properties: page.properties.clone(),
            pages: Vec::new(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::acl::Acl;

    fn container() -> (Container, Vec<PageId>) {
        let mut c = Container::new();
        let a = c.add_page(None, Page::uri("A", "/a")).unwrap();
        let a1 = c.add_page(Some(a), Page::uri("A1", "/a/1")).unwrap();
        let a1x = c.add_page(Some(a1), Page::uri("A1x", "/a/1/x")).unwrap();
        let b = c.add_page(None, Page::uri("B", "/b").hidden()).unwrap();
        let b1 = c.add_page(Some(b), Page::uri("B1", "/b/1")).unwrap();
        (c, vec![a, a1, a1x, b, b1])
    }

    #[test]
    fn htmlify_anchor() {
        let page = Page::uri("Home & Away", "/home")
            .with_id("home")
            .with_title("Go home")
            .with_class("nav-home")
            .with_target("_self");
        assert_eq!(
            htmlify(&page, true, true),
            "<a id=\"home\" title=\"Go home\" class=\"nav-home\" href=\"/home\" target=\"_self\">Home &amp; Away</a>"
        );
        assert_eq!(
            htmlify(&page, false, false),
            "<a id=\"home\" title=\"Go home\" href=\"/home\" target=\"_self\">Home & Away</a>"
        );
    }

    #[test]
    fn htmlify_span_without_href() {
        let page = Page::new("Section").with_class("heading").with_target("_blank");
        assert_eq!(
            htmlify(&page, true, true),
            "<span class=\"heading\">Section</span>"
        );
    }

    #[test]
    fn htmlify_custom_attributes() {
        let page = Page::uri("Docs", "/docs").with_attribute("data-track", "nav");
        assert_eq!(
            htmlify(&page, true, true),
            "<a href=\"/docs\" data-track=\"nav\">Docs</a>"
        );
    }

    #[test]
    fn accept_respects_ancestor_visibility() {
        let (c, ids) = container();
        let opts = HelperOptions::default();
        assert!(opts.accept(&c, ids[4], false));
        assert!(!opts.accept(&c, ids[4], true));

        let opts = HelperOptions {
            render_invisible: true,
            ..HelperOptions::default()
        };
        assert!(opts.accept(&c, ids[4], true));
    }

    #[test]
    fn accept_consults_policy() {
        let mut c = Container::new();
        let admin = c
            .add_page(None, Page::uri("Admin", "/admin").with_resource("admin"))
            .unwrap();

        let mut acl = Acl::new();
        acl.add_role("guest", &[]).unwrap();
        acl.add_role("admin", &[]).unwrap();
        acl.add_resource("admin", None).unwrap();
        acl.allow(&["admin"], &["admin"], &[]).unwrap();

        let mut opts = HelperOptions {
            policy: Some(Arc::new(acl)),
            role: Some("guest".to_string()),
            ..HelperOptions::default()
        };
        assert!(!opts.accept(&c, admin, true));

        opts.role = Some("admin".to_string());
        assert!(opts.accept(&c, admin, true));

        opts.role = Some("guest".to_string());
        opts.use_acl = false;
        assert!(opts.accept(&c, admin, true));
    }

    #[test]
    fn find_active_deepest() {
        let (mut c, ids) = container();
        c.page_mut(ids[1]).unwrap().active = true;
        c.page_mut(ids[2]).unwrap().active = true;
        let opts = HelperOptions::default();

        let found = opts.find_active(&c, 0, None).unwrap();
        assert_eq!(found, ActivePage { id: ids[2], depth: 2 });
    }

    #[test]
    fn find_active_tie_keeps_first_in_order() {
        let mut c = Container::new();
        let x = c.add_page(None, Page::uri("X", "/x").activated()).unwrap();
        let y = c.add_page(None, Page::uri("Y", "/y").activated()).unwrap();
        let opts = HelperOptions::default();

        let found = opts.find_active(&c, 0, None).unwrap();
        assert_eq!(found, ActivePage { id: x, depth: 0 });

        // ordering decides traversal, not insertion
        c.page_mut(y).unwrap().order = Some(-1);
        let found = opts.find_active(&c, 0, None).unwrap();
        assert_eq!(found, ActivePage { id: y, depth: 0 });
    }

    #[test]
    fn find_active_clamps_to_max_depth() {
        let (mut c, ids) = container();
        c.set_request_path("/a/1/x");
        let opts = HelperOptions::default();

        let found = opts.find_active(&c, 0, Some(1)).unwrap();
        assert_eq!(found, ActivePage { id: ids[1], depth: 1 });

        let found = opts.find_active(&c, 0, Some(0)).unwrap();
        assert_eq!(found, ActivePage { id: ids[0], depth: 0 });

        // climbing to depth 0 would leave the window
        assert!(opts.find_active(&c, 1, Some(0)).is_none());
    }

    #[test]
    fn find_active_below_min_depth() {
        let (mut c, _) = container();
        c.set_request_path("/a");
        let opts = HelperOptions::default();
        assert!(opts.find_active(&c, 1, None).is_none());
        assert!(opts.find_active(&c, 0, None).is_some());
    }

    #[test]
    fn find_active_skips_rejected_pages() {
        let (mut c, _) = container();
        c.set_request_path("/b/1");
        let opts = HelperOptions::default();
        assert!(opts.find_active(&c, 0, None).is_none());
    }

    #[test]
    fn page_view_snapshot() {
        let (mut c, ids) = container();
        c.set_request_path("/a/1");
        let view = PageView::new(&c, ids[0], 0).unwrap();
        assert!(view.active);
        assert_eq!(view.href.as_deref(), Some("/a"));
        assert_eq!(view.html, "<a href=\"/a\">A</a>");
    }
}
