//! Menus loaded from a document, cached per deployment mode and rendered
//! inside a page for different users.

use std::io::Write;
use std::sync::Arc;

use horizon_trellis::menu::{MenuCache, MenuControl};
use horizon_trellis::{DeploymentMode, Page, Principal, Request, TrellisConfig, TrellisError};

const MENU: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<menu>
  <menu name="customers" label="Customers" path="customers.htm">
    <menu name="edit" label="Edit &amp; Review" path="edit-customer.htm" pages="new-customer.htm"/>
  </menu>
  <menu separator="true"/>
  <menu name="admin" label="Admin" roles="admin">
    <menu name="users" label="Users" path="users.htm"/>
  </menu>
</menu>
"#;

fn menu_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn config(file: &tempfile::NamedTempFile, mode: DeploymentMode) -> TrellisConfig {
    let mut config = TrellisConfig::default().with_mode(mode);
    config.menu.source = Some(file.path().to_path_buf());
    config
}

fn render(cache: &MenuCache, config: &TrellisConfig, request: &Request) -> String {
    let tree = cache.load(config).unwrap();
    let mut page = Page::new(request.path().to_string());
    page.add(MenuControl::new("nav", tree)).unwrap();
    page.process(request, config).unwrap().body
}

#[test]
fn test_guest_sees_public_items_only() {
    let file = menu_file(MENU);
    let config = config(&file, DeploymentMode::Development);
    let body = render(&MenuCache::new(), &config, &Request::get("/new-customer.htm"));

    assert!(body.contains(
        r#"<li class="selected"><a href="/customers.htm">Customers</a><ul><li class="selected"><a href="/edit-customer.htm">Edit &amp; Review</a></li></ul></li>"#
    ));
    assert!(body.contains(r#"<li class="menu-separator"></li>"#));
    assert!(!body.contains("Admin"));
    assert!(!body.contains("users.htm"));
    assert!(body.contains("/trellis/menu/menu.css"));
}

#[test]
fn test_admin_sees_protected_subtree() {
    let file = menu_file(MENU);
    let config = config(&file, DeploymentMode::Development);
    let request = Request::get("/users.htm")
        .with_context_path("/shop")
        .with_principal(Principal::new("ann", ["admin"]));
    let body = render(&MenuCache::new(), &config, &request);

    assert!(body.contains(r#"<a href="/shop/users.htm">Users</a>"#));
    assert!(body.contains(r##"<li class="selected"><a href="#">Admin</a>"##));
}

#[test]
fn test_production_serves_cached_tree() {
    let file = menu_file(MENU);
    let config = config(&file, DeploymentMode::Production);
    let cache = MenuCache::new();

    let first = cache.load(&config).unwrap();
    std::fs::write(file.path(), r#"<menu><menu name="other" path="other.htm"/></menu>"#).unwrap();
    let second = cache.load(&config).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let body = render(&cache, &config, &Request::get("/customers.htm"));
    assert!(body.contains("Customers"));
    assert!(!body.contains("other.htm"));

    cache.invalidate();
    let body = render(&cache, &config, &Request::get("/other.htm"));
    assert!(body.contains(r#"<li class="selected"><a href="/other.htm">other</a></li>"#));
}

#[test]
fn test_development_reloads_edited_source() {
    let file = menu_file(MENU);
    let config = config(&file, DeploymentMode::Development);
    let cache = MenuCache::new();

    assert!(render(&cache, &config, &Request::get("/")).contains("Customers"));
    std::fs::write(file.path(), r#"<menu><menu name="reports" path="reports.htm"/></menu>"#).unwrap();
    let body = render(&cache, &config, &Request::get("/"));
    assert!(body.contains("reports.htm"));
    assert!(!body.contains("Customers"));
}

#[test]
fn test_broken_source_is_reported() {
    let file = menu_file("<menu><item/></menu>");
    let err = MenuCache::new()
        .load(&config(&file, DeploymentMode::Production))
        .unwrap_err();
    assert!(matches!(err, TrellisError::MenuSource(_)));
}
