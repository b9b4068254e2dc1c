//! HTML forms.
//!
//! A [`Form`] is a container of fields and buttons. A request is a
//! submission of the form when the reserved `form_name` parameter carries the
//! form's name. On submission every field is bound and validated, so all
//! errors are reported at once, and the [`Form::submitted`] signal fires when
//! the whole form is valid.
//!
//! # Example
//!
//! ```
//! use horizon_trellis::field::TextField;
//! use horizon_trellis::form::{Form, Submit};
//!
//! let mut form = Form::new("login");
//! form.add(TextField::new("username").required()).unwrap();
//! form.add(Submit::new("ok", "Log in")).unwrap();
//! assert!(form.add(TextField::new("page")).is_err());
//! ```

use std::fmt::Display;

use horizon_trellis_core::{
    ActionEvent, ActionListener, Control, ControlBase, ControlId, ErrorKind, Field, FieldError,
    HeadElement, HtmlStringBuffer, ProcessContext, Request, Signal, TrellisError, TrellisResult,
    container::ContainerBase, logging::targets, params,
};

use crate::field::{FileField, messages};

/// A form container.
pub struct Form {
    container: ContainerBase,
    method: String,
    action: Option<String>,
    error: Option<String>,
    processed: bool,
    submitted: Signal<String>,
}

impl Form {
    /// Create a form named `name`, submitted with POST.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            container: ContainerBase::named(name),
            method: "post".to_string(),
            action: None,
            error: None,
            processed: false,
            submitted: Signal::new(),
        }
    }

    /// Use GET instead of POST (builder pattern).
    pub fn with_get(mut self) -> Self {
        self.method = "get".to_string();
        self
    }

    /// Set the form action URL (builder pattern).
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// The submission method, `post` or `get`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The form name.
    pub fn name(&self) -> &str {
        self.container.base().name().unwrap_or_default()
    }

    /// Add a field, button or other control.
    ///
    /// Names colliding with framework request parameters are rejected with
    /// [`TrellisError::ReservedName`], including names nested in panels.
    pub fn add<C: Control>(&mut self, control: C) -> TrellisResult<ControlId> {
        if let Some(name) = reserved_name(&control) {
            return Err(TrellisError::ReservedName(name.to_string()));
        }
        self.container.add(control)
    }

    /// The first reserved name among the form's controls. Only controls
    /// added through [`Form::container_mut`] can carry one.
    fn reserved_child_name(&self) -> Option<&str> {
        self.container
            .children()
            .iter()
            .find_map(|child| reserved_name(child.as_ref()))
    }

    /// The child storage.
    pub fn container(&self) -> &ContainerBase {
        &self.container
    }

    /// Mutable child storage.
    pub fn container_mut(&mut self) -> &mut ContainerBase {
        &mut self.container
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&dyn Field> {
        self.fields().into_iter().find(|f| f.field().name() == name)
    }

    /// Look up a field by name and concrete type.
    pub fn field_as<T: Control>(&self, name: &str) -> Option<&T> {
        horizon_trellis_core::find_control::<T>(self, name)
    }

    /// Look up a mutable field by name and concrete type.
    pub fn field_as_mut<T: Control>(&mut self, name: &str) -> Option<&mut T> {
        horizon_trellis_core::find_control_mut::<T>(self, name)
    }

    /// Every field in the form, including fields nested in panels.
    pub fn fields(&self) -> Vec<&dyn Field> {
        let mut fields = Vec::new();
        let mut stack: Vec<&dyn Control> = self.container.children().iter().rev().map(|c| c.as_ref()).collect();
        while let Some(control) = stack.pop() {
            if let Some(field) = control.as_field() {
                fields.push(field);
            }
            stack.extend(control.children().iter().rev().map(|c| c.as_ref()));
        }
        fields
    }

    /// Returns true if `request` submits this form.
    pub fn is_form_submission(&self, request: &Request) -> bool {
        let method_matches = self.method != "post" || request.is_post();
        method_matches && request.param(params::FORM_NAME) == Some(self.name())
    }

    /// Returns true once the form has processed a submission.
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// The form-level error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Set a form-level error.
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    /// Every field error, in form order.
    pub fn errors(&self) -> Vec<(&str, &FieldError)> {
        self.fields()
            .into_iter()
            .filter_map(|f| f.error().map(|e| (f.field().name(), e)))
            .collect()
    }

    /// Returns true when there is no form error and every field is valid.
    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.fields().iter().all(|f| f.is_valid())
    }

    /// Signal emitted with the form name after a valid submission.
    pub fn submitted(&self) -> &Signal<String> {
        &self.submitted
    }

    fn has_file_field(&self) -> bool {
        self.fields()
            .iter()
            .any(|f| (**f).as_any().is::<FileField>())
    }

    fn render_field_row(&self, buffer: &mut HtmlStringBuffer, control: &dyn Control, field: &dyn Field) -> TrellisResult<()> {
        let base = field.field();
        let id = base.control().html_id().unwrap_or_default().to_string();
        buffer.append("<tr><td class=\"label\">");
        buffer.element_start("label").append_attribute("for", &id).close_tag();
        buffer.append_escaped(field.label());
        if field.is_required() {
            buffer.append("<span class=\"required\">*</span>");
        }
        buffer.element_end_tag("label");
        buffer.append("</td><td>");
        control.render(buffer)?;
        if let Some(error) = field.error() {
            buffer
                .element_start("span")
                .append_attribute("class", "error")
                .close_tag()
                .append_escaped(&error.message)
                .element_end_tag("span");
        }
        buffer.append("</td></tr>");
        Ok(())
    }
}

impl Control for Form {
    fn base(&self) -> &ControlBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        self.container.base_mut()
    }

    fn children(&self) -> &[Box<dyn Control>] {
        self.container.children()
    }

    fn children_mut(&mut self) -> &mut [Box<dyn Control>] {
        self.container.children_mut()
    }

    fn on_init(&mut self) {
        self.container.init_children();
    }

    fn on_process(&mut self, ctx: &mut ProcessContext<'_>) -> bool {
        let request = ctx.request();
        if !self.is_form_submission(request) {
            return true;
        }
        self.processed = true;

        if let Some(name) = self.reserved_child_name() {
            tracing::error!(target: targets::FORM, form = self.name(), control = name, "control name collides with a framework parameter, skipping field binding");
            return true;
        }

        if let Some(upload_error) = request.upload_error() {
            tracing::warn!(target: targets::FORM, form = self.name(), error = %upload_error, "upload failed, skipping field binding");
            let detail: &dyn Display = upload_error;
            self.error = Some(messages::render(ErrorKind::Upload, "The request", &[detail]));
            return true;
        }

        let proceed = self.container.process_children(ctx);
        let errors = self.errors().len();
        tracing::debug!(target: targets::FORM, form = self.name(), errors, "processed form submission");
        if errors == 0 && self.error.is_none() {
            self.submitted.emit(self.name().to_string());
        }
        proceed
    }

    fn on_render(&mut self) {
        self.container.on_render_children();
    }

    fn on_destroy(&mut self) -> TrellisResult<()> {
        self.container.destroy_children();
        self.error = None;
        self.processed = false;
        Ok(())
    }

    fn head_elements(&self) -> Vec<HeadElement> {
        vec![HeadElement::css_import("/trellis/control.css")]
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        let base = self.container.base();
        let name = base.require_name("Form")?;
        if let Some(reserved) = self.reserved_child_name() {
            return Err(TrellisError::ReservedName(reserved.to_string()));
        }

        buffer.element_start("form");
        buffer.append_attribute("method", &self.method);
        buffer.append_attribute("name", name);
        buffer.append_attribute("id", base.html_id().unwrap_or(name));
        buffer.append_optional_attribute("action", self.action.as_deref());
        if self.has_file_field() {
            buffer.append_attribute("enctype", "multipart/form-data");
        }
        buffer.append_attributes(base.attributes().iter().filter(|(k, _)| k.as_str() != "id"));
        buffer.close_tag();

        buffer
            .element_start("input")
            .append_attribute("type", "hidden")
            .append_attribute("name", params::FORM_NAME)
            .append_attribute("value", name)
            .element_end();

        if let Some(error) = &self.error {
            buffer
                .element_start("div")
                .append_attribute("class", "errors")
                .close_tag()
                .append_escaped(error)
                .element_end_tag("div");
        }

        let children = self.container.children();
        for child in children {
            if child.as_field().is_some_and(|f| f.is_hidden()) {
                child.render(buffer)?;
            }
        }

        buffer.append("<table class=\"form\"><tbody>");
        let mut others = Vec::new();
        for child in children {
            match child.as_field() {
                Some(field) if field.is_hidden() => {}
                Some(field) => self.render_field_row(buffer, child.as_ref(), field)?,
                None => others.push(child),
            }
        }
        buffer.append("</tbody></table>");

        if !others.is_empty() {
            buffer.append("<div class=\"buttons\">");
            for control in others {
                control.render(buffer)?;
            }
            buffer.append("</div>");
        }
        buffer.element_end_tag("form");
        Ok(())
    }
}

/// The first name in the subtree of `root` that collides with a framework
/// request parameter.
fn reserved_name(root: &dyn Control) -> Option<&str> {
    let mut stack = vec![root];
    while let Some(control) = stack.pop() {
        if let Some(name) = control.name()
            && params::is_reserved(name)
        {
            return Some(name);
        }
        stack.extend(control.children().iter().map(|c| c.as_ref()));
    }
    None
}

/// A submit button.
///
/// The button is clicked when its name is among the request parameters; a
/// clicked button queues its listener.
pub struct Submit {
    base: ControlBase,
    label: String,
    listener: Option<ActionListener>,
    clicked: bool,
}

impl Submit {
    /// Create a submit button.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            base: ControlBase::named(name),
            label: label.into(),
            listener: None,
            clicked: false,
        }
    }

    /// Attach a listener (builder pattern).
    pub fn with_listener(mut self, listener: ActionListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Returns true if this button submitted the request.
    pub fn is_clicked(&self) -> bool {
        self.clicked
    }
}

impl Control for Submit {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn on_process(&mut self, ctx: &mut ProcessContext<'_>) -> bool {
        let Some(name) = self.base.name() else {
            return true;
        };
        self.clicked = ctx.request().has_param(name);
        if self.clicked
            && let Some(listener) = &self.listener
        {
            ctx.queue_event(ActionEvent::new(self.base.id(), name, listener.clone()));
        }
        true
    }

    fn on_destroy(&mut self) -> TrellisResult<()> {
        self.clicked = false;
        Ok(())
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        let name = self.base.require_name("Submit")?;
        buffer
            .element_start("input")
            .append_attribute("type", "submit")
            .append_attribute("name", name)
            .append_attribute("id", self.base.html_id().unwrap_or(name))
            .append_attribute("value", &self.label)
            .append_attributes(self.base.attributes().iter().filter(|(k, _)| k.as_str() != "id"))
            .element_end();
        Ok(())
    }
}
