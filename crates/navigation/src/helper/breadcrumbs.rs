//! Breadcrumb trail from the root to the active page.

use tera::Context;
use tracing::debug;

use super::{HelperOptions, PageView, htmlify};
use crate::container::Container;
use crate::error::{NavigationError, NavigationResult};
use crate::escape::html_escape;

/// Breadcrumbs helper.
#[derive(Debug, Clone)]
pub struct Breadcrumbs {
    pub options: HelperOptions,
    /// Emitted between crumbs as-is (not escaped).
    pub separator: String,
    /// Render the active page as a link rather than plain text.
    pub link_last: bool,
    /// Partial template to render through instead of the built-in markup.
    pub partial: Option<String>,
}

impl Default for Breadcrumbs {
    fn default() -> Self {
        Self {
            options: HelperOptions {
                min_depth: Some(1),
                ..HelperOptions::default()
            },
            separator: " &gt; ".to_string(),
            link_last: false,
            partial: None,
        }
    }
}

impl Breadcrumbs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: HelperOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_link_last(mut self, link_last: bool) -> Self {
        self.link_last = link_last;
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
            None => Ok(self.render_straight(container)),
        }
    }

    /// Render crumbs joined by the separator, prefixed with the indent.
    ///
    /// Empty when no accepted page is active inside the depth window.
    pub fn render_straight(&self, container: &Container) -> String {
        let opts = &self.options;
        let Some(active) = opts.find_active(container, opts.min_depth(), opts.max_depth) else {
            debug!("no active page, breadcrumbs left empty");
            return String::new();
        };
        let Some(page) = container.page(active.id) else {
            return String::new();
        };

        let mut html = if self.link_last {
            htmlify(page, true, true)
        } else {
            html_escape(&page.label)
        };

        for ancestor in container.ancestors(active.id) {
            if let Some(parent) = container.page(ancestor) {
                html = format!("{}{}{html}", htmlify(parent, true, true), self.separator);
            }
        }

        if html.is_empty() {
            html
        } else {
            format!("{}{html}", opts.indent)
        }
    }

    /// Render through a partial template.
    ///
    /// The template receives `pages` (root first, active page last) and
    /// `separator`.
    pub fn render_partial(&self, container: &Container, partial: &str) -> NavigationResult<String> {
        let partials = self
            .options
            .partials
            .as_ref()
            .ok_or(NavigationError::NoPartialRenderer)?;

        let opts = &self.options;
        let mut pages = Vec::new();
        if let Some(active) = opts.find_active(container, opts.min_depth(), opts.max_depth) {
            let mut trail = container.ancestors(active.id);
            trail.reverse();
            trail.push(active.id);
            pages = trail
                .into_iter()
                .enumerate()
                .filter_map(|(depth, id)| PageView::new(container, id, depth))
                .collect();
        }

        let mut ctx = Context::new();
        ctx.insert("pages", &pages);
        ctx.insert("separator", &self.separator);
        ctx.insert("link_last", &self.link_last);
        partials.render(partial, &ctx)
    }
}
