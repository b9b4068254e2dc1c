//! The control that renders a menu tree inside a page.

use std::sync::Arc;

use horizon_trellis_core::{
    Control, ControlBase, HeadElement, HtmlStringBuffer, Placement, ProcessContext, Request,
    TrellisResult,
};

use super::access::{AccessController, RoleAccessController};
use super::tree::{MenuItem, MenuTree};

/// A menu tree placed in a page.
///
/// The request seen during processing decides selection and role
/// filtering when the menu renders.
pub struct MenuControl {
    base: ControlBase,
    tree: Arc<MenuTree>,
    access: Arc<dyn AccessController>,
    /// Path, context path and principal of the processed request.
    view: Option<Request>,
}

impl MenuControl {
    /// Wrap `tree`, checking roles against the request principal.
    pub fn new(name: impl Into<String>, tree: Arc<MenuTree>) -> Self {
        Self {
            base: ControlBase::named(name),
            tree,
            access: Arc::new(RoleAccessController),
            view: None,
        }
    }

    /// Use a custom access controller (builder pattern).
    pub fn with_access_controller(mut self, access: Arc<dyn AccessController>) -> Self {
        self.access = access;
        self
    }

    /// The wrapped tree.
    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    /// Items selected by the current request, outermost first.
    pub fn selected_items(&self) -> Vec<&MenuItem> {
        let Some(request) = &self.view else {
            return Vec::new();
        };
        self.tree
            .selected_path(request.path())
            .into_iter()
            .filter_map(|id| self.tree.node(id))
            .collect()
    }
}

impl Control for MenuControl {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn on_process(&mut self, ctx: &mut ProcessContext<'_>) -> bool {
        let request = ctx.request();
        let mut view = Request::get(request.path()).with_context_path(request.context_path());
        if let Some(principal) = request.principal() {
            view = view.with_principal(principal.clone());
        }
        self.view = Some(view);
        true
    }

    fn on_destroy(&mut self) -> TrellisResult<()> {
        self.view = None;
        Ok(())
    }

    fn head_elements(&self) -> Vec<HeadElement> {
        vec![
            HeadElement::css_import("/trellis/menu/menu.css"),
            HeadElement::js_import_at("/trellis/menu/menu.js", Placement::BodyBottom),
        ]
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        let name = self.base.require_name("MenuControl")?;
        let fallback = Request::default();
        let request = self.view.as_ref().unwrap_or(&fallback);

        buffer
            .element_start("div")
            .append_attribute("id", self.base.html_id().unwrap_or(name))
            .append_attribute("class", "menu-container")
            .close_tag();
        self.tree.render(buffer, request, self.access.as_ref())?;
        buffer.element_end_tag("div");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::parse_menu_xml;
    use horizon_trellis_core::{ActionEventDispatcher, Principal, TrellisConfig};

    struct AllowAll;

    impl AccessController for AllowAll {
        fn has_role_access(&self, _: &Request, _: &str) -> bool {
            true
        }
    }

    fn menu() -> MenuControl {
        let tree = parse_menu_xml(
            r#"<menu>
                 <menu name="home" path="home.htm"/>
                 <menu name="admin" roles="admin"><menu name="users" path="users.htm"/></menu>
               </menu>"#,
        )
        .unwrap();
        MenuControl::new("nav", Arc::new(tree))
    }

    fn process(control: &mut MenuControl, request: &Request) {
        let config = TrellisConfig::default();
        let mut dispatcher = ActionEventDispatcher::new();
        let mut ctx = ProcessContext::new(request, &config, &mut dispatcher);
        control.on_process(&mut ctx);
    }

    #[test]
    fn test_render_uses_processed_request() {
        let mut control = menu();
        process(&mut control, &Request::get("/home.htm").with_principal(Principal::new("guest", Vec::<String>::new())));

        let html = (&control as &dyn Control).to_html().unwrap();
        assert_eq!(
            html,
            r#"<div id="nav" class="menu-container"><ul class="menu"><li class="selected"><a href="/home.htm">home</a></li></ul></div>"#
        );
        let selected: Vec<_> = control.selected_items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(selected, ["home"]);
    }

    #[test]
    fn test_custom_access_controller() {
        let mut control = menu().with_access_controller(Arc::new(AllowAll));
        process(&mut control, &Request::get("/users.htm"));
        let html = (&control as &dyn Control).to_html().unwrap();
        assert!(html.contains(r#"<a href="/users.htm">users</a>"#));
        let selected: Vec<_> = control.selected_items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(selected, ["admin", "users"]);
    }

    #[test]
    fn test_keeps_only_what_rendering_needs() {
        let mut control = menu();
        let mut request = Request::post("/users.htm")
            .with_context_path("/shop")
            .with_param("note", "x".repeat(4096))
            .with_principal(Principal::new("ann", ["admin"]));
        request.set_session_attribute("cart", serde_json::json!([1, 2, 3]));
        process(&mut control, &request);

        let view = control.view.as_ref().unwrap();
        assert_eq!(view.path(), "/users.htm");
        assert_eq!(view.context_path(), "/shop");
        assert!(view.is_user_in_role("admin"));
        assert!(!view.has_param("note"));
        assert!(view.session_attribute("cart").is_none());

        let html = (&control as &dyn Control).to_html().unwrap();
        assert!(html.contains(r#"<a href="/shop/users.htm">users</a>"#));

        control.on_destroy().unwrap();
        assert!(control.selected_items().is_empty());
    }
}
