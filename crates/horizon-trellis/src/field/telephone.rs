//! Telephone number field.

use horizon_trellis_core::{ErrorKind, Field, FieldBase, HtmlStringBuffer, TrellisResult};

use super::{impl_field_control, record_error, render_input, validate_text};

/// A telephone number input.
///
/// Length limits apply to the raw value, separators included. Only digits,
/// spaces and `- ( ) + .` are accepted.
#[derive(Debug, Clone)]
pub struct TelephoneField {
    field: FieldBase,
    min_length: usize,
    max_length: Option<usize>,
}

impl TelephoneField {
    /// Create a telephone field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldBase::new(name),
            min_length: 0,
            max_length: Some(20),
        }
    }

    /// Mark the field required (builder pattern).
    pub fn required(mut self) -> Self {
        self.field.set_required(true);
        self
    }

    /// Set the minimum length (builder pattern).
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Set the maximum length (builder pattern).
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Returns true if `c` may appear in a telephone number.
    pub fn is_telephone_char(c: char) -> bool {
        c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '+' | '.')
    }

    fn render_field(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        let mut extra = vec![("size", "20".to_string())];
        if let Some(max) = self.max_length {
            extra.push(("maxlength", max.to_string()));
        }
        render_input(buffer, &self.field, "TelephoneField", "tel", &extra)
    }
}

impl Field for TelephoneField {
    fn field(&self) -> &FieldBase {
        &self.field
    }

    fn field_mut(&mut self) -> &mut FieldBase {
        &mut self.field
    }

    fn validate(&mut self) {
        if !validate_text(&mut self.field, self.min_length, self.max_length) {
            return;
        }
        if !self.field.value().chars().all(Self::is_telephone_char) {
            record_error(&mut self.field, ErrorKind::TelephoneFormat, &[]);
        }
    }
}

impl_field_control!(TelephoneField);
