//! Field abstraction shared by every form input.
//!
//! A field is a [`Control`] that binds a request parameter to a string
//! `value`, validates it, and records at most one [`FieldError`]. Validation
//! failures are never returned as `Err`; they live on the field so a form can
//! report every invalid field at once.

use std::fmt;

use crate::config::TrellisConfig;
use crate::control::{ActionEvent, ActionListener, Control, ControlBase, ProcessContext};
use crate::request::Request;
use crate::logging::targets;

/// The rule a field value broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required value was missing.
    Required,
    /// The value is shorter than the minimum length.
    MinLength,
    /// The value is longer than the maximum length.
    MaxLength,
    /// The value does not match the date pattern.
    DateFormat,
    /// The date is before the minimum date.
    DateMin,
    /// The date is after the maximum date.
    DateMax,
    /// The value is not a number.
    NumberFormat,
    /// The number is below the minimum.
    NumberMin,
    /// The number is above the maximum.
    NumberMax,
    /// The value contains characters a telephone number cannot.
    TelephoneFormat,
    /// The value is not a hex colour.
    ColorFormat,
    /// A selection is not one of the offered options.
    InvalidOption,
    /// The multipart upload failed.
    Upload,
    /// Application-defined rule.
    Custom,
}

/// A recorded validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The broken rule.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Create an error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Derive a display label from a field name.
///
/// `firstName` and `first_name` both become `First Name`.
pub fn label_from_name(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    let mut start_word = true;
    let mut prev_lower = false;

    for c in name.chars() {
        if c == '_' || c == '-' || c == ' ' || c == '.' {
            start_word = true;
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            start_word = true;
        }
        if start_word {
            if !label.is_empty() {
                label.push(' ');
            }
            label.extend(c.to_uppercase());
            start_word = false;
        } else {
            label.push(c);
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
    }
    label
}

/// State shared by every field kind.
#[derive(Clone)]
pub struct FieldBase {
    control: ControlBase,
    value: String,
    label: Option<String>,
    title: Option<String>,
    required: bool,
    disabled: bool,
    readonly: bool,
    trim: bool,
    valid: bool,
    error: Option<FieldError>,
    listener: Option<ActionListener>,
}

impl FieldBase {
    /// Create a field base named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            control: ControlBase::named(name),
            value: String::new(),
            label: None,
            title: None,
            required: false,
            disabled: false,
            readonly: false,
            trim: true,
            valid: true,
            error: None,
            listener: None,
        }
    }

    /// The underlying control state.
    pub fn control(&self) -> &ControlBase {
        &self.control
    }

    /// Mutable underlying control state.
    pub fn control_mut(&mut self) -> &mut ControlBase {
        &mut self.control
    }

    /// The field name, empty when unnamed.
    pub fn name(&self) -> &str {
        self.control.name().unwrap_or_default()
    }

    /// The wire value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the wire value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// The label, derived from the name unless set explicitly.
    pub fn label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => label_from_name(self.name()),
        }
    }

    /// Set an explicit label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Tooltip text.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the tooltip text.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Returns true if a value must be supplied.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Mark the field required.
    pub fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    /// Returns true if the field is disabled. Disabled fields are not bound.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Disable or enable the field.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Returns true if the field is read-only.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Make the field read-only.
    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    /// Returns true if request values are trimmed when bound.
    pub fn is_trim(&self) -> bool {
        self.trim
    }

    /// Enable or disable trimming of bound values.
    pub fn set_trim(&mut self, trim: bool) {
        self.trim = trim;
    }

    /// Returns true unless the last validation failed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The recorded error.
    pub fn error(&self) -> Option<&FieldError> {
        self.error.as_ref()
    }

    /// Record a validation failure.
    pub fn set_error(&mut self, error: FieldError) {
        self.valid = false;
        self.error = Some(error);
    }

    /// Clear any recorded failure.
    pub fn clear_error(&mut self) {
        self.valid = true;
        self.error = None;
    }

    /// The action listener, if any.
    pub fn listener(&self) -> Option<&ActionListener> {
        self.listener.as_ref()
    }

    /// Attach an action listener fired when the field is submitted.
    pub fn set_listener(&mut self, listener: ActionListener) {
        self.listener = Some(listener);
    }

    /// Read the first value of this field's parameter, trimmed if enabled.
    ///
    /// A missing parameter reads as the empty string.
    pub fn request_value(&self, request: &Request) -> String {
        let raw = request.param(self.name()).unwrap_or_default();
        if self.trim {
            raw.trim().to_string()
        } else {
            raw.to_string()
        }
    }
}

impl fmt::Debug for FieldBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBase")
            .field("name", &self.control.name())
            .field("value", &self.value)
            .field("required", &self.required)
            .field("valid", &self.valid)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// A control that binds and validates a request value.
pub trait Field: Control {
    /// Shared field state.
    fn field(&self) -> &FieldBase;

    /// Mutable shared field state.
    fn field_mut(&mut self) -> &mut FieldBase;

    /// Apply application defaults before binding. Settings made explicitly
    /// on the field take precedence.
    fn apply_config(&mut self, _config: &TrellisConfig) {}

    /// Copy the request value into the field. Repeated binding of the same
    /// request yields the same value.
    fn bind_request_value(&mut self, request: &Request) {
        let value = self.field().request_value(request);
        self.field_mut().set_value(value);
    }

    /// Check the current value, recording an error on failure.
    ///
    /// Implementations clear any previous error first, so validating twice
    /// gives the same outcome.
    fn validate(&mut self);

    /// Returns true for fields rendered without a label row.
    fn is_hidden(&self) -> bool {
        false
    }

    /// The wire value.
    fn value(&self) -> &str {
        self.field().value()
    }

    /// Replace the wire value.
    fn set_value(&mut self, value: String) {
        self.field_mut().set_value(value);
    }

    /// Returns true unless the last validation failed.
    fn is_valid(&self) -> bool {
        self.field().is_valid()
    }

    /// The recorded error.
    fn error(&self) -> Option<&FieldError> {
        self.field().error()
    }

    /// The display label.
    fn label(&self) -> String {
        self.field().label()
    }

    /// Returns true if a value must be supplied.
    fn is_required(&self) -> bool {
        self.field().is_required()
    }
}

/// Standard field processing: bind, validate, then queue the listener when
/// the field's parameter was submitted.
pub fn process_field<F: Field + ?Sized>(field: &mut F, ctx: &mut ProcessContext<'_>) -> bool {
    if field.field().is_disabled() {
        return true;
    }

    let request = ctx.request();
    field.apply_config(ctx.config());
    field.bind_request_value(request);
    field.validate();

    tracing::trace!(
        target: targets::FIELD,
        name = field.field().name(),
        valid = field.is_valid(),
        "processed field"
    );

    let base = field.field();
    if let Some(listener) = base.listener()
        && request.has_param(base.name())
    {
        ctx.queue_event(ActionEvent::new(base.control().id(), base.name(), listener.clone()));
    }
    true
}
