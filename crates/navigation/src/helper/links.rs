//! `<link>` head elements describing the active page's relations.
//!
//! Relations come from the page's own `rel`/`rev` definitions first and are
//! otherwise derived from the tree: `start`, `next`, `prev`, `chapter`,
//! `section`, `subsection` for `rel`; `section`, `subsection` for `rev`.

use std::fmt;
use std::ops::BitOr;

use tracing::debug;

use super::HelperOptions;
use crate::container::{Container, Page, PageId};
use crate::escape::html_attribs;

/// Which relations to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFlags(u32);

impl RenderFlags {
    pub const ALTERNATE: Self = Self(0x0001);
    pub const STYLESHEET: Self = Self(0x0002);
    pub const START: Self = Self(0x0004);
    pub const NEXT: Self = Self(0x0008);
    pub const PREV: Self = Self(0x0010);
    pub const CONTENTS: Self = Self(0x0020);
    pub const INDEX: Self = Self(0x0040);
    pub const GLOSSARY: Self = Self(0x0080);
    pub const COPYRIGHT: Self = Self(0x0100);
    pub const CHAPTER: Self = Self(0x0200);
    pub const SECTION: Self = Self(0x0400);
    pub const SUBSECTION: Self = Self(0x0800);
    pub const APPENDIX: Self = Self(0x1000);
    pub const HELP: Self = Self(0x2000);
    pub const BOOKMARK: Self = Self(0x4000);
    pub const CUSTOM: Self = Self(0x10000);
    pub const ALL: Self = Self(0xffffff);

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flag for a relation name, `custom` or `all`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "custom" => Some(Self::CUSTOM),
            "all" => Some(Self::ALL),
            _ => NATIVE_RELATIONS
                .iter()
                .find(|(native, _)| *native == name.as_str())
                .map(|(_, flag)| *flag),
        }
    }
}

impl BitOr for RenderFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Relations known by name, in render order.
const NATIVE_RELATIONS: [(&str, RenderFlags); 15] = [
    ("alternate", RenderFlags::ALTERNATE),
    ("stylesheet", RenderFlags::STYLESHEET),
    ("start", RenderFlags::START),
    ("next", RenderFlags::NEXT),
    ("prev", RenderFlags::PREV),
    ("contents", RenderFlags::CONTENTS),
    ("index", RenderFlags::INDEX),
    ("glossary", RenderFlags::GLOSSARY),
    ("copyright", RenderFlags::COPYRIGHT),
    ("chapter", RenderFlags::CHAPTER),
    ("section", RenderFlags::SECTION),
    ("subsection", RenderFlags::SUBSECTION),
    ("appendix", RenderFlags::APPENDIX),
    ("help", RenderFlags::HELP),
    ("bookmark", RenderFlags::BOOKMARK),
];

/// Forward (`rel`) or reverse (`rev`) relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAttribute {
    Rel,
    Rev,
}

impl LinkAttribute {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rel => "rel",
            Self::Rev => "rev",
        }
    }
}

impl fmt::Display for LinkAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markup flavour, which decides how `<link>` is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Doctype {
    #[default]
    Html5,
    Xhtml,
}

impl Doctype {
    fn closing_bracket(self) -> &'static str {
        match self {
            Self::Html5 => ">",
            Self::Xhtml => " />",
        }
    }
}

/// A relation target: a page in the container, or one declared inline.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    Page(PageId),
    Detached(Page),
}

impl LinkTarget {
    pub fn resolve<'a>(&'a self, container: &'a Container) -> Option<&'a Page> {
        match self {
            Self::Page(id) => container.page(*id),
            Self::Detached(page) => Some(page),
        }
    }
}

/// All targets found for one relation.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundRelation {
    pub attribute: LinkAttribute,
    pub relation: String,
    pub targets: Vec<LinkTarget>,
}

/// Links helper.
#[derive(Debug, Clone)]
pub struct Links {
    pub options: HelperOptions,
    pub render_flags: RenderFlags,
    pub doctype: Doctype,
}

impl Default for Links {
    fn default() -> Self {
        Self {
            options: HelperOptions::default(),
            render_flags: RenderFlags::ALL,
            doctype: Doctype::default(),
        }
    }
}

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: HelperOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_render_flags(mut self, flags: RenderFlags) -> Self {
        self.render_flags = flags;
        self
    }

    pub fn with_doctype(mut self, doctype: Doctype) -> Self {
        self.doctype = doctype;
        self
    }

    /// Render one `<link>` per relation target of the active page.
    pub fn render(&self, container: &Container) -> String {
        let opts = &self.options;
        let Some(active) = opts.find_active(container, opts.min_depth(), opts.max_depth) else {
            debug!("no active page, no links rendered");
            return String::new();
        };

        let mut lines = Vec::new();
        for found in self.find_all_relations(container, active.id, self.render_flags) {
            for target in &found.targets {
                let link = self.render_link(container, target, found.attribute, &found.relation);
                if !link.is_empty() {
                    lines.push(format!("{}{link}", opts.indent));
                }
            }
        }

        lines.join("\n")
    }

    /// Render a single `<link>`; empty when the target has no href.
    pub fn render_link(
        &self,
        container: &Container,
        target: &LinkTarget,
        attribute: LinkAttribute,
        relation: &str,
    ) -> String {
        let Some(page) = target.resolve(container) else {
            return String::new();
        };
        let Some(href) = page.href() else {
            return String::new();
        };

        let attribs = html_attribs([
            (attribute.as_str(), Some(relation)),
            ("href", Some(href.as_str())),
            ("title", Some(page.label.as_str())),
        ]);
        format!("<link{attribs}{}", self.doctype.closing_bracket())
    }

    /// Every relation of `page` enabled by `flags`, `rel` before `rev`.
    pub fn find_all_relations(
        &self,
        container: &Container,
        page: PageId,
        flags: RenderFlags,
    ) -> Vec<FoundRelation> {
        let mut out = Vec::new();

        for attribute in [LinkAttribute::Rel, LinkAttribute::Rev] {
            for (relation, flag) in NATIVE_RELATIONS {
                if !flags.contains(flag) {
                    continue;
                }
                let targets = self.find_relation(container, page, attribute, relation);
                if !targets.is_empty() {
                    out.push(FoundRelation {
                        attribute,
                        relation: relation.to_string(),
                        targets,
                    });
                }
            }

            if !flags.contains(RenderFlags::CUSTOM) {
                continue;
            }

            let Some(defined) = container.page(page) else {
                continue;
            };
            let custom = defined
                .relations(attribute == LinkAttribute::Rev)
                .keys()
                .filter(|name| {
                    !NATIVE_RELATIONS
                        .iter()
                        .any(|(native, _)| *native == name.as_str())
                });
            for relation in custom {
                let targets = self.find_from_property(container, page, attribute, relation);
                if !targets.is_empty() {
                    out.push(FoundRelation {
                        attribute,
                        relation: relation.clone(),
                        targets,
                    });
                }
            }
        }

        out
    }

    /// Targets of one relation: declared on the page, else searched for.
    pub fn find_relation(
        &self,
        container: &Container,
        page: PageId,
        attribute: LinkAttribute,
        relation: &str,
    ) -> Vec<LinkTarget> {
        let declared = self.find_from_property(container, page, attribute, relation);
        if !declared.is_empty() {
            return declared;
        }
        self.find_from_search(container, page, attribute, relation)
    }

    fn find_from_property(
        &self,
        container: &Container,
        page: PageId,
        attribute: LinkAttribute,
        relation: &str,
    ) -> Vec<LinkTarget> {
        let Some(defined) = container
            .page(page)
            .and_then(|p| p.relations(attribute == LinkAttribute::Rev).get(relation))
        else {
            return Vec::new();
        };

        defined
            .to_pages()
            .into_iter()
            .filter(|p| self.options.accept_page(p))
            .map(LinkTarget::Detached)
            .collect()
    }

    fn find_from_search(
        &self,
        container: &Container,
        page: PageId,
        attribute: LinkAttribute,
        relation: &str,
    ) -> Vec<LinkTarget> {
        let found: Vec<PageId> = match (attribute, relation) {
            (LinkAttribute::Rel, "start") => {
                self.search_rel_start(container, page).into_iter().collect()
            }
            (LinkAttribute::Rel, "next") => {
                self.search_rel_next(container, page).into_iter().collect()
            }
            (LinkAttribute::Rel, "prev") => {
                self.search_rel_prev(container, page).into_iter().collect()
            }
            (LinkAttribute::Rel, "chapter") => self.search_rel_chapter(container, page),
            (LinkAttribute::Rel, "section") => self.search_rel_section(container, page),
            (LinkAttribute::Rel, "subsection") => self.search_rel_subsection(container, page),
            (LinkAttribute::Rev, "section") => {
                self.search_rev_section(container, page).into_iter().collect()
            }
            (LinkAttribute::Rev, "subsection") => {
                self.search_rev_subsection(container, page).into_iter().collect()
            }
            _ => Vec::new(),
        };

        found
            .into_iter()
            .filter(|&id| self.options.accept(container, id, true))
            .map(LinkTarget::Page)
            .collect()
    }

    /// First root-level page, unless it is the page itself.
    fn search_rel_start(&self, container: &Container, page: PageId) -> Option<PageId> {
        container
            .children(None)
            .first()
            .copied()
            .filter(|&first| first != page)
    }

    /// Next accepted page in document order.
    fn search_rel_next(&self, container: &Container, page: PageId) -> Option<PageId> {
        container
            .iter(None, None)
            .map(|(id, _)| id)
            .skip_while(|&id| id != page)
            .skip(1)
            .find(|&id| self.options.accept(container, id, true))
    }

    /// Previous accepted page in document order.
    fn search_rel_prev(&self, container: &Container, page: PageId) -> Option<PageId> {
        let mut prev = None;
        for (id, _) in container.iter(None, None) {
            if !self.options.accept(container, id, true) {
                continue;
            }
            if id == page {
                return prev;
            }
            prev = Some(id);
        }
        None
    }

    /// Root-level pages other than the page itself and the start page(s).
    fn search_rel_chapter(&self, container: &Container, page: PageId) -> Vec<PageId> {
        let start = self.find_relation(container, page, LinkAttribute::Rel, "start");
        container
            .children(None)
            .into_iter()
            .filter(|&chapter| chapter != page && !start.contains(&LinkTarget::Page(chapter)))
            .collect()
    }

    /// Children of a root-level page.
    fn search_rel_section(&self, container: &Container, page: PageId) -> Vec<PageId> {
        if container.has_page(None, page, false) {
            container.children(Some(page))
        } else {
            Vec::new()
        }
    }

    /// Children of a page directly under a root-level page.
    fn search_rel_subsection(&self, container: &Container, page: PageId) -> Vec<PageId> {
        match container.parent(page) {
            Some(parent) if container.has_page(None, parent, false) => {
                container.children(Some(page))
            }
            _ => Vec::new(),
        }
    }

    /// The root-level parent of a section page.
    fn search_rev_section(&self, container: &Container, page: PageId) -> Option<PageId> {
        container
            .parent(page)
            .filter(|&parent| container.has_page(None, parent, false))
    }

    /// The section a subsection page belongs to.
    fn search_rev_subsection(&self, container: &Container, page: PageId) -> Option<PageId> {
        let parent = container.parent(page)?;
        let grandparent = container.parent(parent)?;
        container
            .has_page(None, grandparent, false)
            .then_some(parent)
    }
}
