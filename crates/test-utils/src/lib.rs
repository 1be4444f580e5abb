//! Waymark test utilities.
//!
//! Fixture containers, ACLs and navigation files shared by integration
//! tests.

use std::path::PathBuf;

use serde_json::json;
use waymark_navigation::acl::Acl;
use waymark_navigation::container::{Container, Page, PageId};

/// Sample site used across helper tests.
///
/// ```text
/// Home                /           (order -1)
/// Page 1              /page1
///   Page 1.1          /page1/page1_1
/// Page 2              /page2
///   Page 2.1          /page2/page2_1
///   Page 2.2          /page2/page2_2
///     Page 2.2.1      /page2/page2_2/page2_2_1
///     Page 2.2.2      /page2/page2_2/page2_2_2
///   Page 2.3          /page2/page2_3  (class "special")
/// Page 3              /page3          (resource "admin")
///   Page 3.1          /page3/page3_1
/// Hidden              /hidden         (invisible)
/// ```
pub fn sample_container() -> Container {
    let mut c = Container::new();

    let p1 = add(&mut c, None, Page::uri("Page 1", "/page1"));
    add(&mut c, Some(p1), Page::uri("Page 1.1", "/page1/page1_1"));

    let p2 = add(&mut c, None, Page::uri("Page 2", "/page2"));
    add(&mut c, Some(p2), Page::uri("Page 2.1", "/page2/page2_1"));
    let p22 = add(&mut c, Some(p2), Page::uri("Page 2.2", "/page2/page2_2"));
    add(
        &mut c,
        Some(p22),
        Page::uri("Page 2.2.1", "/page2/page2_2/page2_2_1"),
    );
    add(
        &mut c,
        Some(p22),
        Page::uri("Page 2.2.2", "/page2/page2_2/page2_2_2"),
    );
    add(
        &mut c,
        Some(p2),
        Page::uri("Page 2.3", "/page2/page2_3").with_class("special"),
    );

    let p3 = add(
        &mut c,
        None,
        Page::uri("Page 3", "/page3").with_resource("admin"),
    );
    add(&mut c, Some(p3), Page::uri("Page 3.1", "/page3/page3_1"));

    add(&mut c, None, Page::uri("Hidden", "/hidden").hidden());

    // added last, sorted first
    add(
        &mut c,
        None,
        Page::uri("Home", "/")
            .with_order(-1)
            .with_property("lastmod", "2024-03-01")
            .with_property("changefreq", "daily")
            .with_property("priority", json!(1.0)),
    );

    c
}

fn add(c: &mut Container, parent: Option<PageId>, page: Page) -> PageId {
    c.add_page(parent, page)
        .unwrap_or_else(|e| panic!("fixture page rejected: {e}"))
}

/// [`sample_container`] with `path` as the current request path.
pub fn sample_container_at(path: &str) -> Container {
    let mut c = sample_container();
    c.set_request_path(path);
    c
}

/// Roles `guest` < `member` < `admin`; only `admin` may see the `admin`
/// resource, and `member` may see `reports` (a child of `admin`).
pub fn sample_acl() -> Acl {
    let mut acl = Acl::new();
    let ok = |r: waymark_navigation::NavigationResult<()>| {
        r.unwrap_or_else(|e| panic!("fixture ACL rejected: {e}"));
    };

    ok(acl.add_role("guest", &[]));
    ok(acl.add_role("member", &["guest"]));
    ok(acl.add_role("admin", &["member"]));
    ok(acl.add_resource("admin", None));
    ok(acl.add_resource("reports", Some("admin")));
    ok(acl.allow(&["admin"], &["admin"], &[]));
    ok(acl.allow(&["member"], &["reports"], &["view"]));

    acl
}

/// A small shop navigation file in YAML, guarded by [`SAMPLE_ACL_YAML`].
pub const SAMPLE_YAML: &str = r#"
pages:
  - label: Home
    uri: /
    lastmod: "2024-03-01"
    changefreq: daily
  - label: Products
    uri: /products
    pages:
      - label: Widgets
        uri: /products/widgets
        rel:
          alternate: /products/widgets.pdf
      - label: Gadgets
        uri: /products/gadgets
  - label: Admin
    uri: /admin
    resource: admin
    pages:
      - label: Reports
        uri: /admin/reports
        resource: reports
        privilege: view
  - label: Drafts
    uri: /drafts
    visible: false
"#;

/// ACL matching [`sample_acl`] in YAML form.
pub const SAMPLE_ACL_YAML: &str = r#"
roles:
  - name: guest
  - name: member
    parents: [guest]
  - name: admin
    parents: [member]
resources:
  - name: admin
  - name: reports
    parent: admin
allow:
  - roles: [admin]
    resources: [admin]
  - roles: [member]
    resources: [reports]
    privileges: [view]
"#;

/// Write `contents` to `name` in a temp directory unique to this process.
pub fn write_fixture(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("waymark-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir)
        .unwrap_or_else(|e| panic!("cannot create {}: {e}", dir.display()));
    let path = dir.join(name);
    std::fs::write(&path, contents)
        .unwrap_or_else(|e| panic!("cannot write {}: {e}", path.display()));
    path
}
