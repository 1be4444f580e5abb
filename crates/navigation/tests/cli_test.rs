#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end tests of the `waymark` subcommands on navigation files.

use std::path::PathBuf;

use clap::Parser;
use waymark_navigation::cli::{self, Cli};
use waymark_navigation::config::Config;
use waymark_test_utils::{SAMPLE_ACL_YAML, SAMPLE_YAML, write_fixture};

fn fixtures(prefix: &str) -> (PathBuf, PathBuf) {
    let nav = write_fixture(&format!("{prefix}-nav.yaml"), SAMPLE_YAML);
    let acl = write_fixture(&format!("{prefix}-acl.yml"), SAMPLE_ACL_YAML);
    (nav, acl)
}

fn run(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(std::iter::once("waymark").chain(args.iter().copied())).unwrap();
    cli::run(cli, &Config::default()).unwrap()
}

#[test]
fn test_cli_menu_with_roles() {
    let (nav, acl) = fixtures("menu");
    let nav = nav.to_str().unwrap();
    let acl = acl.to_str().unwrap();

    let guest = run(&["menu", "--container", nav, "--acl", acl, "--role", "guest"]);
    assert!(guest.contains("<a href=\"/products/widgets\">Widgets</a>"));
    assert!(!guest.contains("Admin"));
    assert!(!guest.contains("Drafts"));

    let admin = run(&["menu", "--container", nav, "--acl", acl, "--role", "admin"]);
    assert!(admin.contains("<a href=\"/admin\">Admin</a>"));
    assert!(admin.contains("<a href=\"/admin/reports\">Reports</a>"));
}

#[test]
fn test_cli_menu_indent() {
    let (nav, _) = fixtures("indent");
    let html = run(&[
        "menu",
        "--container",
        nav.to_str().unwrap(),
        "--max-depth",
        "0",
        "--indent",
        "2",
    ]);
    assert!(html.starts_with("  <ul class=\"navigation\">\n      <li>\n"));
    assert!(!html.contains("Widgets"));
}

#[test]
fn test_cli_breadcrumbs() {
    let (nav, _) = fixtures("crumbs");
    let html = run(&[
        "breadcrumbs",
        "--container",
        nav.to_str().unwrap(),
        "--active",
        "/products/widgets",
        "--separator",
        " / ",
    ]);
    assert_eq!(html, "<a href=\"/products\">Products</a> / Widgets");
}

#[test]
fn test_cli_links_declared_relation() {
    let (nav, _) = fixtures("links");
    let html = run(&[
        "links",
        "--container",
        nav.to_str().unwrap(),
        "--active",
        "/products/widgets",
        "--relations",
        "alternate",
        "--doctype",
        "xhtml",
    ]);
    assert_eq!(html, "<link rel=\"alternate\" href=\"/products/widgets.pdf\" />");
}

#[test]
fn test_cli_sitemap() {
    let (nav, acl) = fixtures("sitemap");
    let xml = run(&[
        "sitemap",
        "--container",
        nav.to_str().unwrap(),
        "--acl",
        acl.to_str().unwrap(),
        "--role",
        "guest",
        "--server-url",
        "https://shop.example",
        "--no-declaration",
    ]);

    assert!(xml.starts_with("<urlset"));
    assert!(xml.contains("<loc>https://shop.example/products/gadgets</loc>"));
    assert!(xml.contains("<lastmod>2024-03-01T00:00:00+00:00</lastmod>"));
    assert!(!xml.contains("/admin"));
    assert!(!xml.contains("/drafts"));
}

#[test]
fn test_cli_unknown_relation() {
    let (nav, _) = fixtures("badrel");
    let cli = Cli::try_parse_from([
        "waymark",
        "links",
        "--container",
        nav.to_str().unwrap(),
        "--relations",
        "sideways",
    ])
    .unwrap();
    assert!(cli::run(cli, &Config::default()).is_err());
}

#[test]
fn test_cli_missing_container_file() {
    let cli =
        Cli::try_parse_from(["waymark", "menu", "--container", "/nonexistent/nav.yaml"]).unwrap();
    let err = cli::run(cli, &Config::default()).unwrap_err();
    assert!(err.to_string().contains("failed to load navigation"));
}
