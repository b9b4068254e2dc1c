//! Declarative menu documents.
//!
//! A menu document is nested `<menu>` elements; the outermost one is the
//! root:
//!
//! ```xml
//! <menu>
//!   <menu label="Customers" path="customers.htm">
//!     <menu label="Edit" path="edit-customer.htm" pages="new-customer.htm"/>
//!   </menu>
//!   <menu separator="true"/>
//!   <menu label="Admin" roles="admin, owner" class="admin-link"/>
//! </menu>
//! ```
//!
//! Recognised attributes are `name`, `label`, `path`, `target`, `title`,
//! `imageSrc`, `external`, `separator`, `roles` and `pages` (the last two are
//! comma separated). Any other attribute is kept and rendered on the link.

use std::path::Path;

use horizon_trellis_core::logging::targets;
use horizon_trellis_core::{TrellisError, TrellisResult};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::tree::{MenuItem, MenuNodeId, MenuTree};

const MENU_ELEMENT: &[u8] = b"menu";

/// Parse a menu document.
///
/// # Errors
///
/// Malformed XML, an element other than `<menu>`, a missing or repeated
/// root element are all [`TrellisError::MenuSource`].
pub fn parse_menu_xml(source: &str) -> TrellisResult<MenuTree> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut tree: Option<MenuTree> = None;
    let mut stack: Vec<MenuNodeId> = Vec::new();

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            TrellisError::menu_source(format!("at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => {
                let id = attach(&mut tree, &stack, &start)?;
                stack.push(id);
            }
            Event::Empty(empty) => {
                attach(&mut tree, &stack, &empty)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| TrellisError::menu_source(e.to_string()))?;
                if !text.trim().is_empty() {
                    return Err(TrellisError::menu_source(format!("unexpected text '{}'", text.trim())));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(TrellisError::menu_source("unclosed <menu> element"));
    }
    let tree = tree.ok_or_else(|| TrellisError::menu_source("document has no <menu> root element"))?;
    tracing::debug!(target: targets::MENU, nodes = tree.len(), "parsed menu document");
    Ok(tree)
}

/// Read and parse a menu document from disk.
pub fn load_menu_file(path: impl AsRef<Path>) -> TrellisResult<MenuTree> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| TrellisError::io(path, e))?;
    parse_menu_xml(&source)
}

/// Create the node for `element`, as the root or under the innermost open
/// element.
fn attach(tree: &mut Option<MenuTree>, stack: &[MenuNodeId], element: &BytesStart<'_>) -> TrellisResult<MenuNodeId> {
    if element.name().as_ref() != MENU_ELEMENT {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        return Err(TrellisError::menu_source(format!("unexpected element <{name}>")));
    }
    let item = parse_item(element)?;

    match tree {
        Some(tree) => match stack.last() {
            Some(&parent) => tree.add_child(parent, item),
            None => Err(TrellisError::menu_source("document has more than one root <menu>")),
        },
        None => {
            let created = MenuTree::new(item);
            let root = created.root();
            *tree = Some(created);
            Ok(root)
        }
    }
}

fn parse_item(element: &BytesStart<'_>) -> TrellisResult<MenuItem> {
    let mut item = MenuItem::default();
    let mut label = None;

    for attr in element.attributes() {
        let attr = attr.map_err(|e| TrellisError::menu_source(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| TrellisError::menu_source(e.to_string()))?
            .into_owned();

        match key.as_str() {
            "name" => item.name = value,
            "label" => label = Some(value),
            "path" => item.path = Some(value),
            "target" => item.target = Some(value),
            "title" => item.title = Some(value),
            "imageSrc" => item.image_src = Some(value),
            "external" => item.external = parse_flag(&value),
            "separator" => item.separator = parse_flag(&value),
            "roles" => item.roles = split_list(&value),
            "pages" => item.pages = split_list(&value),
            _ => item.attributes.push((key, value)),
        }
    }

    item.label = label.unwrap_or_else(|| item.name.clone());
    Ok(item)
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
        <menu name="root">
          <menu name="customers" label="Customers" path="customers.htm">
            <menu label="Edit &amp; Review" path="edit-customer.htm" pages="new-customer.htm, copy-customer.htm"/>
          </menu>
          <menu separator="true"/>
          <menu name="admin" label="Admin" roles="admin, owner" class="admin-link" data-x="1"/>
          <menu label="Docs" path="https://example.com/docs" external="TRUE" target="_blank"/>
        </menu>"#;

    #[test]
    fn test_parse_structure_and_attributes() {
        let tree = parse_menu_xml(SAMPLE).unwrap();
        assert_eq!(tree.len(), 6);

        let root = tree.root();
        assert_eq!(tree.node(root).map(|n| n.name.as_str()), Some("root"));
        let top = tree.children(root);
        assert_eq!(top.len(), 4);

        let customers = tree.node(top[0]).unwrap();
        assert_eq!(customers.label, "Customers");
        let edit = tree.node(tree.children(top[0])[0]).unwrap();
        assert_eq!(edit.label, "Edit & Review");
        assert_eq!(edit.pages, ["new-customer.htm", "copy-customer.htm"]);

        assert!(tree.node(top[1]).unwrap().separator);

        let admin = tree.node(top[2]).unwrap();
        assert_eq!(admin.roles, ["admin", "owner"]);
        assert_eq!(
            admin.attributes,
            [("class".to_string(), "admin-link".to_string()), ("data-x".to_string(), "1".to_string())]
        );

        let docs = tree.node(top[3]).unwrap();
        assert!(docs.external);
        assert_eq!(docs.target.as_deref(), Some("_blank"));
    }

    #[test]
    fn test_label_defaults_to_name() {
        let tree = parse_menu_xml(r#"<menu><menu name="home" path="home.htm"/></menu>"#).unwrap();
        let home = tree.children(tree.root())[0];
        assert_eq!(tree.node(home).unwrap().label, "home");
    }

    #[test]
    fn test_malformed_sources() {
        for source in [
            "",
            "<menu><menu></menu>",
            "<menu></item>",
            "<menu><item/></menu>",
            "<menu/><menu/>",
            "<menu>text</menu>",
        ] {
            let err = parse_menu_xml(source).unwrap_err();
            assert!(matches!(err, TrellisError::MenuSource(_)), "{source:?}: {err}");
        }
    }

    #[test]
    fn test_load_menu_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let tree = load_menu_file(file.path()).unwrap();
        assert_eq!(tree.len(), 6);

        let missing = load_menu_file("/definitely/not/here/menu.xml").unwrap_err();
        assert!(matches!(missing, TrellisError::Io { .. }));
    }
}
