//! Nested `<ul>` menus.

use tera::Context;
use tracing::debug;

use super::{ActivePage, HelperOptions, PageView, htmlify};
use crate::container::{Container, PageId};
use crate::error::{NavigationError, NavigationResult};
use crate::escape::html_escape;

/// One indentation step per menu level.
const LEVEL_INDENT: &str = "        ";

/// Menu helper.
#[derive(Debug, Clone)]
pub struct Menu {
    pub options: HelperOptions,
    /// Class of the outermost `<ul>`.
    pub ul_class: String,
    /// Class added to every `<li>`.
    pub li_class: String,
    /// Class added to `<li>` elements on the active branch.
    pub li_active_class: String,
    /// Only render the branch leading to the active page.
    pub only_active_branch: bool,
    /// With `only_active_branch`, also render the active page's ancestors.
    pub render_parents: bool,
    pub escape_labels: bool,
    /// Move the page class from the link to its `<li>`.
    pub add_class_to_list_item: bool,
    /// Partial template to render through instead of the built-in markup.
    pub partial: Option<String>,
}

impl Default for Menu {
    fn default() -> Self {
        Self {
            options: HelperOptions::default(),
            ul_class: "navigation".to_string(),
            li_class: String::new(),
            li_active_class: "active".to_string(),
            only_active_branch: false,
            render_parents: true,
            escape_labels: true,
            add_class_to_list_item: false,
            partial: None,
        }
    }
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: HelperOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_ul_class(mut self, class: impl Into<String>) -> Self {
        self.ul_class = class.into();
        self
    }

    pub fn with_li_class(mut self, class: impl Into<String>) -> Self {
        self.li_class = class.into();
        self
    }

    pub fn with_li_active_class(mut self, class: impl Into<String>) -> Self {
        self.li_active_class = class.into();
        self
    }

    pub fn with_only_active_branch(mut self, only_active_branch: bool) -> Self {
        self.only_active_branch = only_active_branch;
        self
    }

    pub fn with_render_parents(mut self, render_parents: bool) -> Self {
        self.render_parents = render_parents;
        self
    }

    pub fn with_escape_labels(mut self, escape_labels: bool) -> Self {
        self.escape_labels = escape_labels;
        self
    }

    pub fn with_add_class_to_list_item(mut self, add: bool) -> Self {
        self.add_class_to_list_item = add;
        self
    }

    pub fn with_partial(mut self, partial: impl Into<String>) -> Self {
        self.partial = Some(partial.into());
        self
    }

    /// Render through the partial if one is set, else as plain markup.
    pub fn render(&self, container: &Container) -> NavigationResult<String> {
        match &self.partial {
            Some(partial) => self.render_partial(container, partial),
            None => Ok(self.render_menu(container)),
        }
    }

    /// Render the menu markup.
    ///
    /// An active-branch menu without parents renders only the deepest level;
    /// everything else renders as a nested list.
    pub fn render_menu(&self, container: &Container) -> String {
        if self.only_active_branch && !self.render_parents {
            self.render_deepest_menu(container)
        } else {
            self.render_normal_menu(container)
        }
    }

    /// Render the list of pages next to or under the active page.
    pub fn render_sub_menu(
        &self,
        container: &Container,
        ul_class: Option<&str>,
        indent: Option<&str>,
        li_active_class: Option<&str>,
    ) -> String {
        let mut menu = self.clone();
        menu.only_active_branch = true;
        menu.render_parents = false;
        menu.escape_labels = true;
        menu.add_class_to_list_item = false;
        menu.options.min_depth = None;
        menu.options.max_depth = None;
        if let Some(ul_class) = ul_class {
            menu.ul_class = ul_class.to_string();
        }
        if let Some(indent) = indent {
            menu.options.indent = indent.to_string();
        }
        if let Some(li_active_class) = li_active_class {
            menu.li_active_class = li_active_class.to_string();
        }
        menu.render_menu(container)
    }

    fn li_class_attr(&self, container: &Container, id: PageId, is_active: bool) -> String {
        let mut classes: Vec<&str> = Vec::new();
        if !self.li_class.is_empty() {
            classes.push(&self.li_class);
        }
        if is_active && !self.li_active_class.is_empty() {
            classes.push(&self.li_active_class);
        }
        if self.add_class_to_list_item
            && let Some(class) = container.page(id).and_then(|p| p.class.as_deref())
            && !class.is_empty()
        {
            classes.push(class);
        }

        if classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", html_escape(&classes.join(" ")))
        }
    }

    fn link(&self, container: &Container, id: PageId) -> String {
        container
            .page(id)
            .map(|page| htmlify(page, self.escape_labels, !self.add_class_to_list_item))
            .unwrap_or_default()
    }

    /// Whether a non-active page belongs to the active branch.
    ///
    /// Children of the deepest active page are kept. Its siblings are kept
    /// when it has no children to show at the next level.
    fn in_active_branch(
        &self,
        container: &Container,
        id: PageId,
        found: Option<ActivePage>,
    ) -> bool {
        let Some(found) = found else {
            return false;
        };

        if container.has_page(Some(found.id), id, false) {
            return true;
        }

        if container.has_page(container.parent(found.id), id, false) {
            let has_children = container.has_pages(Some(found.id), !self.options.render_invisible);
            let children_too_deep = self
                .options
                .max_depth
                .is_some_and(|max| found.depth + 1 > max);
            return !has_children || children_too_deep;
        }

        false
    }

    fn render_normal_menu(&self, container: &Container) -> String {
        let opts = &self.options;
        let min_depth = opts.min_depth();
        let indent = opts.indent.as_str();
        let found = opts.find_active(container, min_depth, opts.max_depth);

        let mut html = String::new();
        let mut prev_depth: Option<usize> = None;

        for (id, depth) in container.iter(None, opts.max_depth) {
            let is_active = container.is_active(id, true);
            if depth < min_depth || !opts.accept(container, id, true) {
                continue;
            }
            if self.only_active_branch
                && !is_active
                && !self.in_active_branch(container, id, found)
            {
                continue;
            }

            let depth = depth - min_depth;
            let my_indent = format!("{indent}{}", LEVEL_INDENT.repeat(depth));

            match prev_depth {
                Some(prev) if prev == depth => {
                    html.push_str(&format!("{my_indent}    </li>\n"));
                }
                Some(prev) if prev > depth => {
                    for level in (depth + 1..=prev).rev() {
                        let ind = format!("{indent}{}", LEVEL_INDENT.repeat(level));
                        html.push_str(&format!("{ind}    </li>\n{ind}</ul>\n"));
                    }
                    html.push_str(&format!("{my_indent}    </li>\n"));
                }
                _ => {
                    let ul_class = if depth == 0 && !self.ul_class.is_empty() {
                        format!(" class=\"{}\"", html_escape(&self.ul_class))
                    } else {
                        String::new()
                    };
                    html.push_str(&format!("{my_indent}<ul{ul_class}>\n"));
                }
            }

            let li_class = self.li_class_attr(container, id, is_active);
            html.push_str(&format!(
                "{my_indent}    <li{li_class}>\n{my_indent}{LEVEL_INDENT}{}\n",
                self.link(container, id)
            ));

            prev_depth = Some(depth);
        }

        if let Some(prev) = prev_depth {
            for level in (0..=prev).rev() {
                let ind = format!("{indent}{}", LEVEL_INDENT.repeat(level));
                html.push_str(&format!("{ind}    </li>\n{ind}</ul>\n"));
            }
            html.truncate(html.trim_end_matches('\n').len());
        }

        html
    }

    fn render_deepest_menu(&self, container: &Container) -> String {
        let opts = &self.options;
        let min_depth = opts.min_depth();
        let only_visible = !opts.render_invisible;

        let Some(active) = opts.find_active(container, min_depth.saturating_sub(1), opts.max_depth)
        else {
            debug!("no active page, sub menu left empty");
            return String::new();
        };

        let has_children = container.has_pages(Some(active.id), only_visible);
        let branch = if active.depth < min_depth {
            if !has_children {
                return String::new();
            }
            Some(active.id)
        } else if !has_children || opts.max_depth.is_some_and(|max| active.depth + 1 > max) {
            // nothing to show below the active page; show its siblings
            container.parent(active.id)
        } else {
            Some(active.id)
        };

        let indent = opts.indent.as_str();
        let ul_class = if self.ul_class.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", html_escape(&self.ul_class))
        };

        let mut html = format!("{indent}<ul{ul_class}>\n");
        for id in container.children(branch) {
            if !opts.accept(container, id, true) {
                continue;
            }
            let li_class = self.li_class_attr(container, id, container.is_active(id, true));
            html.push_str(&format!(
                "{indent}    <li{li_class}>\n{indent}{LEVEL_INDENT}{}\n{indent}    </li>\n",
                self.link(container, id)
            ));
        }
        html.push_str(&format!("{indent}</ul>"));
        html
    }

    /// Render through a partial template.
    ///
    /// The template receives `pages`, the accepted pages in the depth window
    /// as a nested tree, plus `ul_class` and `li_active_class`.
    pub fn render_partial(&self, container: &Container, partial: &str) -> NavigationResult<String> {
        let partials = self
            .options
            .partials
            .as_ref()
            .ok_or(NavigationError::NoPartialRenderer)?;

        let pages = self.page_views(container, None, 0);

        let mut ctx = Context::new();
        ctx.insert("pages", &pages);
        ctx.insert("ul_class", &self.ul_class);
        ctx.insert("li_active_class", &self.li_active_class);
        partials.render(partial, &ctx)
    }

    /// Accepted pages under `parent`, pages above `min_depth` flattened away.
    fn page_views(
        &self,
        container: &Container,
        parent: Option<PageId>,
        depth: usize,
    ) -> Vec<PageView> {
        let opts = &self.options;
        if opts.max_depth.is_some_and(|max| depth > max) {
            return Vec::new();
        }

        let mut views = Vec::new();
        for id in container.children(parent) {
            if !opts.accept(container, id, false) {
                continue;
            }
            if depth < opts.min_depth() {
                views.extend(self.page_views(container, Some(id), depth + 1));
                continue;
            }
            if let Some(mut view) = PageView::new(container, id, depth - opts.min_depth()) {
                view.pages = self.page_views(container, Some(id), depth + 1);
                views.push(view);
            }
        }
        views
    }
}
