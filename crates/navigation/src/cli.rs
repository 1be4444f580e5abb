//! Command-line interface for rendering a navigation file.
//!
//! Each subcommand loads a container (and optionally an ACL), builds the
//! matching helper and returns the rendered fragment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::acl::Acl;
use crate::config::Config;
use crate::container::Container;
use crate::helper::{Doctype, HelperOptions, RenderFlags};
use crate::navigation::Navigation;
use crate::partial::PartialRenderer;

/// Render navigation menus, breadcrumbs, head links and sitemaps.
#[derive(Parser, Debug)]
#[command(name = "waymark", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a nested `<ul>` menu.
    Menu {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        partial: PartialArgs,

        /// Class on the top-level `<ul>`.
        #[arg(long, default_value = "navigation")]
        ul_class: String,

        /// Class on every `<li>`.
        #[arg(long, default_value = "")]
        li_class: String,

        /// Class on `<li>` elements in the active branch.
        #[arg(long, default_value = "active")]
        li_active_class: String,

        /// Only render the branch leading to the active page.
        #[arg(long)]
        only_active_branch: bool,

        /// With --only-active-branch, render just the deepest level.
        #[arg(long)]
        no_parents: bool,

        /// Emit labels without HTML escaping.
        #[arg(long)]
        raw_labels: bool,

        /// Put page classes on `<li>` instead of the link.
        #[arg(long)]
        class_on_li: bool,
    },

    /// Render the trail from the root to the active page.
    Breadcrumbs {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        partial: PartialArgs,

        /// Markup placed between crumbs.
        #[arg(long, default_value = " &gt; ")]
        separator: String,

        /// Render the active page as a link.
        #[arg(long)]
        link_last: bool,
    },

    /// Render `<link>` head elements for the active page.
    Links {
        #[command(flatten)]
        common: CommonArgs,

        /// Comma-separated relations to render (default: all).
        #[arg(long, value_delimiter = ',')]
        relations: Vec<String>,

        #[arg(long, value_enum, default_value_t = DoctypeArg::Html5)]
        doctype: DoctypeArg,
    },

    /// Render an XML sitemap.
    Sitemap {
        #[command(flatten)]
        common: CommonArgs,

        /// Scheme and host prefixed to page URLs (overrides WAYMARK_SERVER_URL).
        #[arg(long)]
        server_url: Option<String>,

        /// Base path for relative page URLs (overrides WAYMARK_BASE_PATH).
        #[arg(long)]
        base_path: Option<String>,

        /// Pretty-print the XML.
        #[arg(long)]
        format_output: bool,

        /// Omit the XML declaration.
        #[arg(long)]
        no_declaration: bool,

        /// Copy lastmod, changefreq and priority through unchecked.
        #[arg(long)]
        no_validators: bool,
    },
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Navigation file (.yaml, .yml, .json or .toml).
    #[arg(long)]
    pub container: PathBuf,

    /// ACL file in the same formats.
    #[arg(long)]
    pub acl: Option<PathBuf>,

    /// Role used for ACL checks (overrides WAYMARK_DEFAULT_ROLE).
    #[arg(long)]
    pub role: Option<String>,

    /// Request path used to find the active page.
    #[arg(long)]
    pub active: Option<String>,

    #[arg(long)]
    pub min_depth: Option<usize>,

    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Indent width in spaces (overrides WAYMARK_INDENT).
    #[arg(long)]
    pub indent: Option<usize>,

    /// Render pages marked invisible.
    #[arg(long)]
    pub render_invisible: bool,
}

/// Partial template options, for the helpers that render through one.
#[derive(Args, Debug, Clone, Default)]
pub struct PartialArgs {
    /// Render through this partial template.
    #[arg(long)]
    pub partial: Option<String>,

    /// Directory of partial templates (overrides WAYMARK_TEMPLATES_DIR).
    #[arg(long, requires = "partial")]
    pub templates: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoctypeArg {
    Html5,
    Xhtml,
}

impl From<DoctypeArg> for Doctype {
    fn from(arg: DoctypeArg) -> Self {
        match arg {
            DoctypeArg::Html5 => Doctype::Html5,
            DoctypeArg::Xhtml => Doctype::Xhtml,
        }
    }
}

/// Run a parsed command and return what should be printed.
pub fn run(cli: Cli, config: &Config) -> Result<String> {
    match cli.command {
        Command::Menu {
            common,
            partial,
            ul_class,
            li_class,
            li_active_class,
            only_active_branch,
            no_parents,
            raw_labels,
            class_on_li,
        } => cmd_menu(
            &common,
            &partial,
            config,
            MenuArgs {
                ul_class,
                li_class,
                li_active_class,
                only_active_branch,
                render_parents: !no_parents,
                escape_labels: !raw_labels,
                add_class_to_list_item: class_on_li,
            },
        ),
        Command::Breadcrumbs {
            common,
            partial,
            separator,
            link_last,
        } => cmd_breadcrumbs(&common, &partial, config, &separator, link_last),
        Command::Links {
            common,
            relations,
            doctype,
        } => cmd_links(&common, config, &relations, doctype.into()),
        Command::Sitemap {
            common,
            server_url,
            base_path,
            format_output,
            no_declaration,
            no_validators,
        } => cmd_sitemap(
            &common,
            config,
            SitemapArgs {
                server_url,
                base_path,
                format_output,
                use_xml_declaration: !no_declaration,
                use_sitemap_validators: !no_validators,
            },
        ),
    }
}

/// Menu-specific settings.
#[derive(Debug, Clone)]
pub struct MenuArgs {
    pub ul_class: String,
    pub li_class: String,
    pub li_active_class: String,
    pub only_active_branch: bool,
    pub render_parents: bool,
    pub escape_labels: bool,
    pub add_class_to_list_item: bool,
}

/// Sitemap-specific settings.
#[derive(Debug, Clone, Default)]
pub struct SitemapArgs {
    pub server_url: Option<String>,
    pub base_path: Option<String>,
    pub format_output: bool,
    pub use_xml_declaration: bool,
    pub use_sitemap_validators: bool,
}

pub fn cmd_menu(
    common: &CommonArgs,
    partial: &PartialArgs,
    config: &Config,
    args: MenuArgs,
) -> Result<String> {
    let nav = load_navigation(common, Some(partial), config)?;
    let mut menu = nav.menu();
    apply_common(&mut menu.options, common, config);
    menu.ul_class = args.ul_class;
    menu.li_class = args.li_class;
    menu.li_active_class = args.li_active_class;
    menu.only_active_branch = args.only_active_branch;
    menu.render_parents = args.render_parents;
    menu.escape_labels = args.escape_labels;
    menu.add_class_to_list_item = args.add_class_to_list_item;
    menu.partial.clone_from(&partial.partial);

    menu.render(nav.container())
        .context("failed to render menu")
}

pub fn cmd_breadcrumbs(
    common: &CommonArgs,
    partial: &PartialArgs,
    config: &Config,
    separator: &str,
    link_last: bool,
) -> Result<String> {
    let nav = load_navigation(common, Some(partial), config)?;
    let mut crumbs = nav
        .breadcrumbs()
        .with_separator(separator)
        .with_link_last(link_last);
    apply_common(&mut crumbs.options, common, config);
    crumbs.partial.clone_from(&partial.partial);

    crumbs
        .render(nav.container())
        .context("failed to render breadcrumbs")
}

pub fn cmd_links(
    common: &CommonArgs,
    config: &Config,
    relations: &[String],
    doctype: Doctype,
) -> Result<String> {
    let flags = parse_relations(relations)?;
    let nav = load_navigation(common, None, config)?;
    let mut links = nav.links().with_render_flags(flags).with_doctype(doctype);
    apply_common(&mut links.options, common, config);

    Ok(links.render(nav.container()))
}

pub fn cmd_sitemap(common: &CommonArgs, config: &Config, args: SitemapArgs) -> Result<String> {
    let nav = load_navigation(common, None, config)?;
    let mut sitemap = nav
        .sitemap()
        .with_server_url(args.server_url.unwrap_or_else(|| config.server_url.clone()))
        .with_base_path(args.base_path.unwrap_or_else(|| config.base_path.clone()))
        .with_format_output(args.format_output)
        .with_xml_declaration(args.use_xml_declaration)
        .with_validators(args.use_sitemap_validators);
    apply_common(&mut sitemap.options, common, config);

    sitemap
        .render(nav.container())
        .context("failed to render sitemap")
}

fn parse_relations(relations: &[String]) -> Result<RenderFlags> {
    if relations.is_empty() {
        return Ok(RenderFlags::ALL);
    }

    let mut flags = RenderFlags::empty();
    for name in relations {
        let Some(flag) = RenderFlags::from_name(name) else {
            bail!("unknown relation '{name}'");
        };
        flags = flags | flag;
    }
    Ok(flags)
}

/// Depth window and indent. Leaves each helper's defaults alone unless given.
fn apply_common(options: &mut HelperOptions, common: &CommonArgs, config: &Config) {
    if common.min_depth.is_some() {
        options.min_depth = common.min_depth;
    }
    if common.max_depth.is_some() {
        options.max_depth = common.max_depth;
    }
    options.set_indent_width(common.indent.unwrap_or(config.indent));
}

fn load_navigation(
    common: &CommonArgs,
    partial: Option<&PartialArgs>,
    config: &Config,
) -> Result<Navigation> {
    let mut container = load_container(&common.container)?;
    if let Some(active) = &common.active {
        container.set_request_path(active.as_str());
    }
    info!(pages = container.len(), file = %common.container.display(), "loaded navigation");

    let mut nav = Navigation::new(container).with_render_invisible(common.render_invisible);

    if let Some(path) = &common.acl {
        let acl = Acl::from_path(path)
            .with_context(|| format!("failed to load ACL from {}", path.display()))?;
        nav = nav.with_policy(Arc::new(acl));
    }

    if let Some(role) = common.role.as_ref().or(config.default_role.as_ref()) {
        nav = nav.with_role(role.as_str());
    }

    if let Some(partial) = partial.filter(|p| p.partial.is_some()) {
        let Some(dir) = partial.templates.as_ref().or(config.templates_dir.as_ref()) else {
            bail!("--partial needs a template directory (--templates or WAYMARK_TEMPLATES_DIR)");
        };
        let partials = PartialRenderer::new(dir)
            .with_context(|| format!("failed to load templates from {}", dir.display()))?;
        nav = nav.with_partials(Arc::new(partials));
    }

    Ok(nav)
}

fn load_container(path: &Path) -> Result<Container> {
    Container::from_path(path)
        .with_context(|| format!("failed to load navigation from {}", path.display()))
}
