//! Hyperlink controls.
//!
//! [`ActionLink`] posts back to the current page with the reserved
//! `actionLink` parameter set to its name, so the link's listener runs when it
//! is clicked. [`PageLink`] is a plain link to another page. Both carry an
//! ordered list of extra parameters that are URL-encoded into the href.

use horizon_trellis_core::{
    ActionEvent, ActionListener, Control, ControlBase, HtmlStringBuffer, ProcessContext,
    TrellisResult, logging::targets, params,
};
use url::form_urlencoded;

/// Build `path?k=v&...` with every pair URL-encoded, in order.
pub fn build_href<'a, I>(path: &str, parameters: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(parameters);
    let query = serializer.finish();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

/// A link whose href can be rendered with extra parameters appended.
///
/// Table decorators use this to render one link per row.
pub trait ParameterLink {
    /// The href with `extra` appended after the link's own parameters.
    fn href_with(&self, extra: &[(String, String)]) -> String;

    /// Render the anchor with `extra` parameters.
    fn render_with(&self, buffer: &mut HtmlStringBuffer, extra: &[(String, String)]) -> TrellisResult<()>;
}

/// View a control as a [`ParameterLink`] if it is one of the link kinds.
pub fn as_parameter_link(control: &dyn Control) -> Option<&dyn ParameterLink> {
    if let Some(link) = control.downcast_ref::<ActionLink>() {
        return Some(link);
    }
    control.downcast_ref::<PageLink>().map(|link| link as &dyn ParameterLink)
}

#[derive(Debug, Clone)]
struct LinkBase {
    control: ControlBase,
    label: String,
    title: Option<String>,
    parameters: Vec<(String, String)>,
    disabled: bool,
}

impl LinkBase {
    fn new(name: String, label: String) -> Self {
        Self {
            control: ControlBase::named(name),
            label,
            title: None,
            parameters: Vec::new(),
            disabled: false,
        }
    }

    fn set_parameter(&mut self, name: String, value: String) {
        match self.parameters.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((name, value)),
        }
    }

    fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn render_anchor(&self, buffer: &mut HtmlStringBuffer, kind: &'static str, href: &str) -> TrellisResult<()> {
        let name = self.control.require_name(kind)?;
        if self.disabled {
            buffer
                .element_start("span")
                .append_attribute("class", "disabled")
                .close_tag()
                .append_escaped(&self.label)
                .element_end_tag("span");
            return Ok(());
        }
        buffer
            .element_start("a")
            .append_attribute("href", href)
            .append_attribute("id", self.control.html_id().unwrap_or(name))
            .append_optional_attribute("title", self.title.as_deref())
            .append_attributes(self.control.attributes().iter().filter(|(k, _)| k.as_str() != "id"))
            .close_tag()
            .append_escaped(&self.label)
            .element_end_tag("a");
        Ok(())
    }
}

// ============================================================================
// ActionLink
// ============================================================================

/// A link that triggers a listener on the page it posts back to.
///
/// # Example
///
/// ```
/// use horizon_trellis::link::ActionLink;
///
/// let mut link = ActionLink::new("delete", "Delete").with_path("/customers.htm");
/// link.set_parameter("id", "42");
/// assert_eq!(link.href(), "/customers.htm?actionLink=delete&id=42");
/// ```
#[derive(Clone)]
pub struct ActionLink {
    link: LinkBase,
    path: Option<String>,
    current_path: String,
    listener: Option<ActionListener>,
    clicked: bool,
}

impl ActionLink {
    /// Create an action link.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            link: LinkBase::new(name.into(), label.into()),
            path: None,
            current_path: String::new(),
            listener: None,
            clicked: false,
        }
    }

    /// Post back to `path` instead of the current request path (builder pattern).
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach a listener (builder pattern).
    pub fn with_listener(mut self, listener: ActionListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Set the hover title (builder pattern).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.link.title = Some(title.into());
        self
    }

    /// The link text.
    pub fn label(&self) -> &str {
        &self.link.label
    }

    /// Set or replace a parameter, keeping its original position.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.link.set_parameter(name.into(), value.into());
    }

    /// A parameter value.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.link.parameter(name)
    }

    /// Render as disabled text.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.link.disabled = disabled;
    }

    /// Returns true if the current request clicked this link.
    pub fn is_clicked(&self) -> bool {
        self.clicked
    }

    /// The href with the link's own parameters.
    pub fn href(&self) -> String {
        self.href_with(&[])
    }
}

impl ParameterLink for ActionLink {
    fn href_with(&self, extra: &[(String, String)]) -> String {
        let path = self.path.as_deref().unwrap_or(&self.current_path);
        let name = self.link.control.name().unwrap_or_default();
        let pairs = std::iter::once((params::ACTION_LINK, name)).chain(
            self.link
                .parameters
                .iter()
                .chain(extra)
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        build_href(path, pairs)
    }

    fn render_with(&self, buffer: &mut HtmlStringBuffer, extra: &[(String, String)]) -> TrellisResult<()> {
        self.link.render_anchor(buffer, "ActionLink", &self.href_with(extra))
    }
}

impl Control for ActionLink {
    fn base(&self) -> &ControlBase {
        &self.link.control
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.link.control
    }

    fn on_process(&mut self, ctx: &mut ProcessContext<'_>) -> bool {
        let request = ctx.request();
        self.current_path = format!("{}{}", request.context_path(), request.path());

        let Some(name) = self.link.control.name() else {
            return true;
        };
        self.clicked = request.param(params::ACTION_LINK) == Some(name);
        if self.clicked {
            tracing::debug!(target: targets::LINK, link = name, "action link clicked");
            if let Some(listener) = &self.listener {
                ctx.queue_event(ActionEvent::new(self.link.control.id(), name, listener.clone()));
            }
        }
        true
    }

    fn on_destroy(&mut self) -> TrellisResult<()> {
        self.clicked = false;
        Ok(())
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        self.render_with(buffer, &[])
    }
}

// ============================================================================
// PageLink
// ============================================================================

/// A plain link to another page, prefixed with the application context path.
#[derive(Debug, Clone)]
pub struct PageLink {
    link: LinkBase,
    target: String,
    context_path: String,
}

impl PageLink {
    /// Create a link to `target`, a path relative to the context path.
    pub fn new(name: impl Into<String>, label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            link: LinkBase::new(name.into(), label.into()),
            target: target.into(),
            context_path: String::new(),
        }
    }

    /// Set or replace a parameter, keeping its original position.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.link.set_parameter(name.into(), value.into());
    }

    /// A parameter value.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.link.parameter(name)
    }

    /// Render as disabled text.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.link.disabled = disabled;
    }

    /// The href with the link's own parameters.
    pub fn href(&self) -> String {
        self.href_with(&[])
    }
}

impl ParameterLink for PageLink {
    fn href_with(&self, extra: &[(String, String)]) -> String {
        let path = format!("{}{}", self.context_path, self.target);
        build_href(
            &path,
            self.link
                .parameters
                .iter()
                .chain(extra)
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    fn render_with(&self, buffer: &mut HtmlStringBuffer, extra: &[(String, String)]) -> TrellisResult<()> {
        self.link.render_anchor(buffer, "PageLink", &self.href_with(extra))
    }
}

impl Control for PageLink {
    fn base(&self) -> &ControlBase {
        &self.link.control
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.link.control
    }

    fn on_process(&mut self, ctx: &mut ProcessContext<'_>) -> bool {
        self.context_path = ctx.request().context_path().to_string();
        true
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        self.render_with(buffer, &[])
    }
}
