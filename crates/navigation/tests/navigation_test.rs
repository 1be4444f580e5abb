#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Helper tests against the shared sample site.

use std::sync::Arc;

use waymark_navigation::helper::RenderFlags;
use waymark_navigation::{HelperKind, Navigation};
use waymark_test_utils::{sample_acl, sample_container_at};

fn navigation(active: &str, role: &str) -> Navigation {
    Navigation::new(sample_container_at(active))
        .with_policy(Arc::new(sample_acl()))
        .with_role(role)
}

#[test]
fn test_menu_marks_active_branch() {
    let html = navigation("/page2/page2_2", "guest").render().unwrap();

    assert!(html.starts_with(
        "<ul class=\"navigation\">\n    <li>\n        <a href=\"/\">Home</a>\n"
    ));
    assert!(html.contains("    <li class=\"active\">\n        <a href=\"/page2\">Page 2</a>\n"));
    assert!(html.contains(
        "            <li class=\"active\">\n                <a href=\"/page2/page2_2\">Page 2.2</a>\n"
    ));
    assert!(html.contains("<a class=\"special\" href=\"/page2/page2_3\">Page 2.3</a>"));
    assert!(html.ends_with("</ul>"));
}

#[test]
fn test_menu_hides_denied_and_invisible_pages() {
    let guest = navigation("/", "guest").render().unwrap();
    assert!(!guest.contains("Page 3"));
    assert!(!guest.contains("Hidden"));

    let member = navigation("/", "member").render().unwrap();
    assert!(!member.contains("Page 3"));

    let admin = navigation("/", "admin").render().unwrap();
    assert!(admin.contains("<a href=\"/page3\">Page 3</a>"));
    assert!(admin.contains("<a href=\"/page3/page3_1\">Page 3.1</a>"));
    assert!(!admin.contains("Hidden"));

    let everything = navigation("/", "guest")
        .with_use_acl(false)
        .with_render_invisible(true)
        .render()
        .unwrap();
    assert!(everything.contains("Page 3.1"));
    assert!(everything.contains("<a href=\"/hidden\">Hidden</a>"));
}

#[test]
fn test_menu_root_order() {
    let html = navigation("/", "guest").render().unwrap();
    let home = html.find("Home").unwrap();
    let page1 = html.find("Page 1").unwrap();
    let page2 = html.find("Page 2").unwrap();
    assert!(home < page1 && page1 < page2);
}

#[test]
fn test_sub_menu_lists_children_of_active_page() {
    let nav = navigation("/page2", "guest");
    let html = nav
        .menu()
        .render_sub_menu(nav.container(), Some("sub"), None, None);

    assert_eq!(
        html,
        "<ul class=\"sub\">\n    <li>\n        <a href=\"/page2/page2_1\">Page 2.1</a>\n    </li>\n    <li>\n        <a href=\"/page2/page2_2\">Page 2.2</a>\n    </li>\n    <li>\n        <a class=\"special\" href=\"/page2/page2_3\">Page 2.3</a>\n    </li>\n</ul>"
    );
}

#[test]
fn test_breadcrumbs_trail() {
    let html = navigation("/page2/page2_2/page2_2_1", "guest")
        .render_with(HelperKind::Breadcrumbs)
        .unwrap();
    assert_eq!(
        html,
        "<a href=\"/page2\">Page 2</a> &gt; <a href=\"/page2/page2_2\">Page 2.2</a> &gt; Page 2.2.1"
    );
}

#[test]
fn test_breadcrumbs_respect_acl() {
    let guest = navigation("/page3/page3_1", "guest")
        .render_with(HelperKind::Breadcrumbs)
        .unwrap();
    assert_eq!(guest, "");

    let admin = navigation("/page3/page3_1", "admin")
        .render_with(HelperKind::Breadcrumbs)
        .unwrap();
    assert_eq!(admin, "<a href=\"/page3\">Page 3</a> &gt; Page 3.1");
}

#[test]
fn test_links_next_and_prev() {
    let nav = navigation("/page2/page2_2", "guest");
    let html = nav
        .links()
        .with_render_flags(RenderFlags::NEXT | RenderFlags::PREV)
        .render(nav.container());

    assert_eq!(
        html,
        "<link rel=\"next\" href=\"/page2/page2_2/page2_2_1\" title=\"Page 2.2.1\">\n<link rel=\"prev\" href=\"/page2/page2_1\" title=\"Page 2.1\">"
    );
}

#[test]
fn test_links_next_skips_denied_pages() {
    let guest = navigation("/page2/page2_3", "guest");
    let html = guest
        .links()
        .with_render_flags(RenderFlags::NEXT)
        .render(guest.container());
    assert_eq!(html, "");

    let admin = navigation("/page2/page2_3", "admin");
    let html = admin
        .links()
        .with_render_flags(RenderFlags::NEXT)
        .render(admin.container());
    assert_eq!(html, "<link rel=\"next\" href=\"/page3\" title=\"Page 3\">");
}
