//! Navigation container: an ordered tree of page nodes.
//!
//! Pages live in an arena and are addressed by [`PageId`]. The container
//! itself is the root; its direct children are at depth 0.

mod page;

use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NavigationError, NavigationResult};
use crate::format::DocumentFormat;

pub use page::{Page, PageSpec, Relation};

/// Handle of a page inside one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PageId(usize);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page#{}", self.0)
    }
}

/// Top-level layout of a container definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerSpec {
    #[serde(default)]
    pub pages: Vec<PageSpec>,
}

#[derive(Debug, Clone)]
struct Node {
    page: Page,
    parent: Option<PageId>,
    /// Children in insertion order; sorting happens on read.
    children: Vec<PageId>,
    attached: bool,
}

/// In-memory navigation tree.
#[derive(Debug, Clone, Default)]
pub struct Container {
    nodes: Vec<Node>,
    roots: Vec<PageId>,
    request_path: Option<String>,
}

impl Container {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a container from nested page definitions.
    pub fn from_specs(specs: &[PageSpec]) -> NavigationResult<Self> {
        let mut container = Self::new();
        for spec in specs {
            container.add_spec(None, spec)?;
        }
        debug!(pages = container.len(), "built navigation container");
        Ok(container)
    }

    pub fn from_yaml_str(text: &str) -> NavigationResult<Self> {
        Self::from_document(DocumentFormat::Yaml, text)
    }

    pub fn from_json_str(text: &str) -> NavigationResult<Self> {
        Self::from_document(DocumentFormat::Json, text)
    }

    pub fn from_toml_str(text: &str) -> NavigationResult<Self> {
        Self::from_document(DocumentFormat::Toml, text)
    }

    /// Load a container definition, picking the format by file extension.
    pub fn from_path(path: &Path) -> NavigationResult<Self> {
        let spec: ContainerSpec = DocumentFormat::load(path)?;
        Self::from_specs(&spec.pages)
    }

    fn from_document(format: DocumentFormat, text: &str) -> NavigationResult<Self> {
        let spec: ContainerSpec = format.parse(text)?;
        Self::from_specs(&spec.pages)
    }

    /// Add a page under `parent` (or at the root when `None`).
    pub fn add_page(&mut self, parent: Option<PageId>, page: Page) -> NavigationResult<PageId> {
        if let Some(parent) = parent
            && !self.contains(parent)
        {
            return Err(NavigationError::UnknownPage(parent));
        }

        let id = PageId(self.nodes.len());
        self.nodes.push(Node {
            page,
            parent,
            children: Vec::new(),
            attached: true,
        });

        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }

        Ok(id)
    }

    /// Add several sibling pages under `parent`.
    pub fn add_pages<I>(
        &mut self,
        parent: Option<PageId>,
        pages: I,
    ) -> NavigationResult<Vec<PageId>>
    where
        I: IntoIterator<Item = Page>,
    {
        pages
            .into_iter()
            .map(|page| self.add_page(parent, page))
            .collect()
    }

    /// Add a page definition and all of its children.
    pub fn add_spec(
        &mut self,
        parent: Option<PageId>,
        spec: &PageSpec,
    ) -> NavigationResult<PageId> {
        let id = self.add_page(parent, spec.to_page())?;
        for child in &spec.pages {
            self.add_spec(Some(id), child)?;
        }
        Ok(id)
    }

    /// Detach a page and its subtree. Returns false if the page was not present.
    pub fn remove_page(&mut self, id: PageId) -> bool {
        if !self.contains(id) {
            return false;
        }

        match self.nodes[id.0].parent {
            Some(parent) => self.nodes[parent.0].children.retain(|c| *c != id),
            None => self.roots.retain(|c| *c != id),
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.0];
            node.attached = false;
            stack.extend(node.children.iter().copied());
        }

        true
    }

    /// Whether `id` refers to a page currently in the tree.
    pub fn contains(&self, id: PageId) -> bool {
        self.nodes.get(id.0).is_some_and(|n| n.attached)
    }

    fn node(&self, id: PageId) -> Option<&Node> {
        self.nodes.get(id.0).filter(|n| n.attached)
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.node(id).map(|n| &n.page)
    }

    pub fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.nodes
            .get_mut(id.0)
            .filter(|n| n.attached)
            .map(|n| &mut n.page)
    }

    /// Parent page, or `None` for root-level pages.
    pub fn parent(&self, id: PageId) -> Option<PageId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Children of `parent` (root level when `None`) in display order.
    ///
    /// Pages with an explicit `order` sort by it; the rest sort by their
    /// position among unordered siblings. Ties keep insertion order.
    pub fn children(&self, parent: Option<PageId>) -> Vec<PageId> {
        let ids = match parent {
            None => &self.roots,
            Some(parent) => match self.node(parent) {
                Some(node) => &node.children,
                None => return Vec::new(),
            },
        };

        let mut unordered = 0i64;
        let mut keyed: Vec<(i64, PageId)> = ids
            .iter()
            .map(|&id| {
                let key = match self.nodes[id.0].page.order {
                    Some(order) => i64::from(order),
                    None => {
                        let key = unordered;
                        unordered += 1;
                        key
                    }
                };
                (key, id)
            })
            .collect();

        keyed.sort_by_key(|(key, _)| *key);
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    /// Whether `id` is a child of `parent` (any descendant when `recursive`).
    pub fn has_page(&self, parent: Option<PageId>, id: PageId, recursive: bool) -> bool {
        if !self.contains(id) {
            return false;
        }

        let direct = self.parent(id);
        if direct == parent {
            return true;
        }
        if !recursive {
            return false;
        }

        match parent {
            None => true,
            Some(parent) => self.ancestors(id).contains(&parent),
        }
    }

    /// Whether `parent` has children, optionally counting only visible ones.
    pub fn has_pages(&self, parent: Option<PageId>, only_visible: bool) -> bool {
        let children = self.children(parent);
        if only_visible {
            children
                .iter()
                .any(|&c| self.page(c).is_some_and(|p| p.visible))
        } else {
            !children.is_empty()
        }
    }

    /// Ancestors of a page, nearest first.
    pub fn ancestors(&self, id: PageId) -> Vec<PageId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// Depth of a page (root-level pages are at depth 0).
    pub fn depth(&self, id: PageId) -> usize {
        self.ancestors(id).len()
    }

    /// Pre-order traversal under `root` yielding `(page, depth)`.
    ///
    /// Depth is relative to `root`: its children are at depth 0. Pages deeper
    /// than `max_depth` are not visited.
    pub fn iter(&self, root: Option<PageId>, max_depth: Option<usize>) -> Iter<'_> {
        let mut stack: Vec<(PageId, usize)> =
            self.children(root).into_iter().map(|id| (id, 0)).collect();
        stack.reverse();
        Iter {
            container: self,
            stack,
            max_depth,
        }
    }

    /// Number of pages in the tree.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.attached).count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Record the path of the current request.
    ///
    /// Pages whose uri equals this path are considered active.
    pub fn set_request_path(&mut self, path: impl Into<String>) {
        self.request_path = Some(path.into());
    }

    pub fn request_path(&self) -> Option<&str> {
        self.request_path.as_deref()
    }

    /// Whether a page is active; with `recursive`, also if any descendant is.
    pub fn is_active(&self, id: PageId, recursive: bool) -> bool {
        let Some(page) = self.page(id) else {
            return false;
        };

        if page.active
            || (self.request_path.is_some() && page.uri.as_deref() == self.request_path())
        {
            return true;
        }

        recursive
            && self
                .children(Some(id))
                .into_iter()
                .any(|child| self.is_active(child, true))
    }

    /// Whether a page is visible; with `recursive`, its ancestors must be too.
    pub fn is_visible(&self, id: PageId, recursive: bool) -> bool {
        let Some(page) = self.page(id) else {
            return false;
        };

        if recursive
            && let Some(parent) = self.parent(id)
            && !self.is_visible(parent, true)
        {
            return false;
        }

        page.visible
    }

    /// Link destination of a page.
    pub fn href(&self, id: PageId) -> Option<String> {
        self.page(id).and_then(Page::href)
    }

    /// First page whose `property` equals `value`.
    pub fn find_one_by(&self, property: &str, value: &str) -> Option<PageId> {
        self.iter(None, None)
            .map(|(id, _)| id)
            .find(|&id| self.property_matches(id, property, |v| v == value))
    }

    /// All pages whose `property` equals `value`, in traversal order.
    pub fn find_all_by(&self, property: &str, value: &str) -> Vec<PageId> {
        self.iter(None, None)
            .map(|(id, _)| id)
            .filter(|&id| self.property_matches(id, property, |v| v == value))
            .collect()
    }

    /// All pages whose `property` matches `pattern`, in traversal order.
    pub fn find_by_regex(&self, property: &str, pattern: &Regex) -> Vec<PageId> {
        self.iter(None, None)
            .map(|(id, _)| id)
            .filter(|&id| self.property_matches(id, property, |v| pattern.is_match(v)))
            .collect()
    }

    fn property_matches(&self, id: PageId, property: &str, pred: impl Fn(&str) -> bool) -> bool {
        self.page(id)
            .and_then(|p| p.property(property))
            .is_some_and(|v| pred(&v))
    }
}

/// Pre-order iterator over a container subtree.
pub struct Iter<'a> {
    container: &'a Container,
    stack: Vec<(PageId, usize)>,
    max_depth: Option<usize>,
}

impl Iterator for Iter<'_> {
    type Item = (PageId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;

        if self.max_depth.is_none_or(|max| depth < max) {
            let children = self.container.children(Some(id));
            self.stack
                .extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }

        Some((id, depth))
    }
}
