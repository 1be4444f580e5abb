//! Entry point tying a container to its helpers.
//!
//! A [`Navigation`] owns the container along with the access policy, role and
//! partial renderer every helper should see, and hands out helpers already
//! configured with them.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::acl::AccessPolicy;
use crate::container::Container;
use crate::error::NavigationResult;
use crate::helper::{Breadcrumbs, HelperOptions, Links, Menu, Sitemap};
use crate::partial::PartialRenderer;

/// Which helper [`Navigation::render`] delegates to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HelperKind {
    #[default]
    Menu,
    Breadcrumbs,
    Links,
    Sitemap,
}

impl HelperKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Breadcrumbs => "breadcrumbs",
            Self::Links => "links",
            Self::Sitemap => "sitemap",
        }
    }
}

impl fmt::Display for HelperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HelperKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "menu" => Ok(Self::Menu),
            "breadcrumbs" => Ok(Self::Breadcrumbs),
            "links" => Ok(Self::Links),
            "sitemap" => Ok(Self::Sitemap),
            other => Err(format!("unknown navigation helper: {other}")),
        }
    }
}

/// A container plus the settings shared by its helpers.
#[derive(Debug, Clone, Default)]
pub struct Navigation {
    container: Container,
    options: HelperOptions,
    default_proxy: HelperKind,
}

impl Navigation {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.options.policy = Some(policy);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.options.role = Some(role.into());
        self
    }

    pub fn with_use_acl(mut self, use_acl: bool) -> Self {
        self.options.use_acl = use_acl;
        self
    }

    pub fn with_render_invisible(mut self, render_invisible: bool) -> Self {
        self.options.render_invisible = render_invisible;
        self
    }

    pub fn with_partials(mut self, partials: Arc<PartialRenderer>) -> Self {
        self.options.partials = Some(partials);
        self
    }

    pub fn with_default_proxy(mut self, kind: HelperKind) -> Self {
        self.default_proxy = kind;
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    pub fn default_proxy(&self) -> HelperKind {
        self.default_proxy
    }

    /// Options a freshly handed out helper starts from.
    ///
    /// Depth window and indent stay at the helper's own defaults.
    fn inject(&self, mut options: HelperOptions) -> HelperOptions {
        options.policy.clone_from(&self.options.policy);
        options.role.clone_from(&self.options.role);
        options.partials.clone_from(&self.options.partials);
        options.use_acl = self.options.use_acl;
        options.render_invisible = self.options.render_invisible;
        options
    }

    pub fn menu(&self) -> Menu {
        let menu = Menu::new();
        let options = self.inject(menu.options.clone());
        menu.with_options(options)
    }

    pub fn breadcrumbs(&self) -> Breadcrumbs {
        let crumbs = Breadcrumbs::new();
        let options = self.inject(crumbs.options.clone());
        crumbs.with_options(options)
    }

    pub fn links(&self) -> Links {
        let links = Links::new();
        let options = self.inject(links.options.clone());
        links.with_options(options)
    }

    pub fn sitemap(&self) -> Sitemap {
        let sitemap = Sitemap::new();
        let options = self.inject(sitemap.options.clone());
        sitemap.with_options(options)
    }

    /// Render the container with the default helper.
    pub fn render(&self) -> NavigationResult<String> {
        debug!(helper = %self.default_proxy, "rendering navigation");
        self.render_with(self.default_proxy)
    }

    /// Render the container with a freshly configured helper of `kind`.
    pub fn render_with(&self, kind: HelperKind) -> NavigationResult<String> {
        match kind {
            HelperKind::Menu => self.menu().render(&self.container),
            HelperKind::Breadcrumbs => self.breadcrumbs().render(&self.container),
            HelperKind::Links => Ok(self.links().render(&self.container)),
            HelperKind::Sitemap => self.sitemap().render(&self.container),
        }
    }
}
