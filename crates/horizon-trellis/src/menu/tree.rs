//! Menu node arena.
//!
//! A [`MenuTree`] stores its nodes in a slotmap arena with parent and child
//! ids, so walks in either direction need no shared ownership. There is
//! exactly one root; the root itself is never rendered, only its
//! descendants.

use horizon_trellis_core::{HtmlStringBuffer, Request, TrellisError, TrellisResult};
use slotmap::{SlotMap, new_key_type};

use super::access::AccessController;

new_key_type! {
    /// Stable handle of a node in a [`MenuTree`].
    pub struct MenuNodeId;
}

/// The declared properties of one menu entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuItem {
    /// Identifier.
    pub name: String,
    /// Display text.
    pub label: String,
    /// Target page path; relative paths are prefixed with the context path.
    pub path: Option<String>,
    /// Link target frame (`_blank`, ...).
    pub target: Option<String>,
    /// Hover title.
    pub title: Option<String>,
    /// Icon shown before the label.
    pub image_src: Option<String>,
    /// Roles allowed to see the entry; empty means everyone.
    pub roles: Vec<String>,
    /// Additional page paths that select this entry.
    pub pages: Vec<String>,
    /// Renders as a separator line.
    pub separator: bool,
    /// `path` is an absolute URL used verbatim.
    pub external: bool,
    /// Other declared attributes, in declaration order, rendered on the link.
    pub attributes: Vec<(String, String)>,
}

impl MenuItem {
    /// Create an item with a name and matching label.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            ..Self::default()
        }
    }

    /// A separator entry.
    pub fn separator() -> Self {
        Self {
            separator: true,
            ..Self::default()
        }
    }

    /// Set the label (builder pattern).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the path (builder pattern).
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the roles (builder pattern).
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the selecting pages (builder pattern).
    pub fn with_pages<I, S>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pages = pages.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the path as external (builder pattern).
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    /// Returns true if `request_path` is this item's path or one of its pages.
    pub fn matches_path(&self, request_path: &str) -> bool {
        let request_path = normalize(request_path);
        if request_path.is_empty() {
            return false;
        }
        self.path.as_deref().is_some_and(|p| normalize(p) == request_path)
            || self.pages.iter().any(|p| normalize(p) == request_path)
    }
}

fn normalize(path: &str) -> &str {
    path.trim_start_matches('/')
}

#[derive(Debug, Clone)]
struct MenuNode {
    item: MenuItem,
    parent: Option<MenuNodeId>,
    children: Vec<MenuNodeId>,
}

/// A hierarchical menu.
#[derive(Debug, Clone)]
pub struct MenuTree {
    nodes: SlotMap<MenuNodeId, MenuNode>,
    root: MenuNodeId,
}

impl MenuTree {
    /// Create a tree holding only `root`.
    pub fn new(root: MenuItem) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(MenuNode {
            item: root,
            parent: None,
            children: Vec::new(),
        });
        Self { nodes, root }
    }

    /// The root node.
    pub fn root(&self) -> MenuNodeId {
        self.root
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has a root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The item stored at `id`.
    pub fn node(&self, id: MenuNodeId) -> Option<&MenuItem> {
        self.nodes.get(id).map(|n| &n.item)
    }

    /// Mutable item stored at `id`.
    pub fn node_mut(&mut self, id: MenuNodeId) -> Option<&mut MenuItem> {
        self.nodes.get_mut(id).map(|n| &mut n.item)
    }

    /// Children of `id`, in declaration order.
    pub fn children(&self, id: MenuNodeId) -> &[MenuNodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    /// Parent of `id`; `None` for the root.
    pub fn parent(&self, id: MenuNodeId) -> Option<MenuNodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Append `item` under `parent`.
    pub fn add_child(&mut self, parent: MenuNodeId, item: MenuItem) -> TrellisResult<MenuNodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(TrellisError::invalid_argument("menu parent node does not exist"));
        }
        let id = self.nodes.insert(MenuNode {
            item,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(id);
        }
        Ok(id)
    }

    /// `id` and all of its descendants in depth-first pre-order.
    pub fn descendants(&self, id: MenuNodeId) -> Vec<MenuNodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            order.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        order
    }

    /// The first node, in pre-order, whose path or pages match `path`.
    pub fn find_by_path(&self, path: &str) -> Option<MenuNodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.node(id).is_some_and(|item| item.matches_path(path)))
    }

    /// The first node, in pre-order, named `name`.
    pub fn find_by_name(&self, name: &str) -> Option<MenuNodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.node(id).is_some_and(|item| item.name == name))
    }

    /// Returns true if `id` or any descendant matches `request_path`.
    pub fn is_selected(&self, id: MenuNodeId, request_path: &str) -> bool {
        self.descendants(id)
            .into_iter()
            .any(|n| self.node(n).is_some_and(|item| item.matches_path(request_path)))
    }

    /// The chain of selected nodes from the top level down to the deepest
    /// match. The root is not included.
    pub fn selected_path(&self, request_path: &str) -> Vec<MenuNodeId> {
        let mut chain = Vec::new();
        let mut current = self.root;
        while let Some(&next) = self
            .children(current)
            .iter()
            .find(|&&child| self.is_selected(child, request_path))
        {
            chain.push(next);
            current = next;
        }
        chain
    }

    /// Returns true if the request may see `id`.
    pub fn is_user_in_roles(&self, id: MenuNodeId, request: &Request, access: &dyn AccessController) -> bool {
        self.node(id).is_some_and(|item| {
            item.roles.is_empty() || item.roles.iter().any(|role| access.has_role_access(request, role))
        })
    }

    /// Render the descendants of the root as nested lists.
    ///
    /// Nodes the request may not see are skipped together with their whole
    /// subtree.
    pub fn render(&self, buffer: &mut HtmlStringBuffer, request: &Request, access: &dyn AccessController) -> TrellisResult<()> {
        enum Step {
            Item(MenuNodeId),
            Close(&'static str),
        }

        let visible = |id: MenuNodeId| -> Vec<MenuNodeId> {
            self.children(id)
                .iter()
                .copied()
                .filter(|&child| self.is_user_in_roles(child, request, access))
                .collect()
        };

        buffer.append("<ul class=\"menu\">");
        let mut stack = vec![Step::Close("ul")];
        stack.extend(visible(self.root).into_iter().rev().map(Step::Item));

        while let Some(step) = stack.pop() {
            let id = match step {
                Step::Close(tag) => {
                    buffer.element_end_tag(tag);
                    continue;
                }
                Step::Item(id) => id,
            };
            let Some(item) = self.node(id) else { continue };

            if item.separator {
                buffer.append("<li class=\"menu-separator\"></li>");
                continue;
            }

            buffer.element_start("li");
            if self.is_selected(id, request.path()) {
                buffer.append_attribute("class", "selected");
            }
            buffer.close_tag();
            self.render_link(buffer, item, request.context_path());

            stack.push(Step::Close("li"));
            let children = visible(id);
            if !children.is_empty() {
                buffer.append("<ul>");
                stack.push(Step::Close("ul"));
                stack.extend(children.into_iter().rev().map(Step::Item));
            }
        }
        Ok(())
    }

    fn render_link(&self, buffer: &mut HtmlStringBuffer, item: &MenuItem, context_path: &str) {
        let resolve = |path: &str| {
            if item.external {
                path.to_string()
            } else {
                format!("{}/{}", context_path.trim_end_matches('/'), normalize(path))
            }
        };

        buffer.element_start("a");
        buffer.append_attribute("href", item.path.as_deref().map(resolve).unwrap_or_else(|| "#".to_string()));
        buffer.append_optional_attribute("target", item.target.as_deref());
        buffer.append_optional_attribute("title", item.title.as_deref());
        for (name, value) in &item.attributes {
            buffer.append_attribute(name, value);
        }
        buffer.close_tag();
        if let Some(src) = &item.image_src {
            buffer
                .element_start("img")
                .append_attribute("src", resolve(src))
                .append_attribute("alt", "")
                .element_end();
        }
        buffer.append_escaped(&item.label).element_end_tag("a");
    }
}

impl Default for MenuTree {
    fn default() -> Self {
        Self::new(MenuItem::new("rootMenu"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::RoleAccessController;
    use horizon_trellis_core::Principal;

    /// root
    ///   customers (customers.htm)
    ///     edit (edit-customer.htm, pages: new-customer.htm)
    ///   admin [admin]
    ///     users (users.htm)
    ///   ---
    ///   help (https://example.com/help, external)
    fn sample() -> (MenuTree, [MenuNodeId; 6]) {
        let mut tree = MenuTree::default();
        let root = tree.root();
        let customers = tree
            .add_child(root, MenuItem::new("customers").with_label("Customers").with_path("customers.htm"))
            .unwrap();
        let edit = tree
            .add_child(
                customers,
                MenuItem::new("edit")
                    .with_label("Edit")
                    .with_path("/edit-customer.htm")
                    .with_pages(["new-customer.htm"]),
            )
            .unwrap();
        let admin = tree
            .add_child(root, MenuItem::new("admin").with_label("Admin").with_roles(["admin"]))
            .unwrap();
        let users = tree
            .add_child(admin, MenuItem::new("users").with_label("Users").with_path("users.htm"))
            .unwrap();
        let sep = tree.add_child(root, MenuItem::separator()).unwrap();
        let help = tree
            .add_child(
                root,
                MenuItem::new("help").with_path("https://example.com/help").external(),
            )
            .unwrap();
        (tree, [customers, edit, admin, users, sep, help])
    }

    #[test]
    fn test_structure() {
        let (tree, [customers, edit, admin, ..]) = sample();
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.parent(edit), Some(customers));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.children(customers), [edit]);
        assert_eq!(tree.find_by_name("admin"), Some(admin));
        assert_eq!(tree.find_by_path("/customers.htm"), Some(customers));
    }

    #[test]
    fn test_selection_propagates_to_ancestors() {
        let (tree, [customers, edit, admin, ..]) = sample();
        assert!(tree.is_selected(edit, "/edit-customer.htm"));
        assert!(tree.is_selected(customers, "/edit-customer.htm"));
        assert!(tree.is_selected(tree.root(), "/edit-customer.htm"));
        assert!(!tree.is_selected(admin, "/edit-customer.htm"));

        // pages membership selects too
        assert!(tree.is_selected(customers, "/new-customer.htm"));
        assert_eq!(tree.selected_path("/new-customer.htm"), [customers, edit]);
        assert!(tree.selected_path("/unknown.htm").is_empty());
    }

    #[test]
    fn test_roles() {
        let (tree, [customers, _, admin, ..]) = sample();
        let access = RoleAccessController;
        let guest = Request::get("/");
        let root_user = Request::get("/").with_principal(Principal::new("ann", ["admin"]));
        assert!(tree.is_user_in_roles(customers, &guest, &access));
        assert!(!tree.is_user_in_roles(admin, &guest, &access));
        assert!(tree.is_user_in_roles(admin, &root_user, &access));
    }

    #[test]
    fn test_render_filters_denied_subtree() {
        let (tree, _) = sample();
        let request = Request::get("/edit-customer.htm").with_context_path("/shop");
        let mut buffer = HtmlStringBuffer::new();
        tree.render(&mut buffer, &request, &RoleAccessController).unwrap();

        assert_eq!(
            buffer.as_str(),
            concat!(
                r#"<ul class="menu">"#,
                r#"<li class="selected"><a href="/shop/customers.htm">Customers</a>"#,
                r#"<ul><li class="selected"><a href="/shop/edit-customer.htm">Edit</a></li></ul>"#,
                r#"</li>"#,
                r#"<li class="menu-separator"></li>"#,
                r#"<li><a href="https://example.com/help">help</a></li>"#,
                r#"</ul>"#,
            )
        );
    }

    #[test]
    fn test_render_for_admin_includes_children() {
        let (tree, _) = sample();
        let request = Request::get("/users.htm").with_principal(Principal::new("ann", ["admin"]));
        let mut buffer = HtmlStringBuffer::new();
        tree.render(&mut buffer, &request, &RoleAccessController).unwrap();
        assert!(buffer.as_str().contains(
            r##"<li class="selected"><a href="#">Admin</a><ul><li class="selected"><a href="/users.htm">Users</a></li></ul></li>"##
        ));
    }
}
