//! Single-line text field with length validation.

use horizon_trellis_core::{Field, FieldBase, HtmlStringBuffer, TrellisResult};

use super::{impl_field_control, render_input, validate_text};

/// A single-line text input.
#[derive(Debug, Clone)]
pub struct TextField {
    field: FieldBase,
    min_length: usize,
    max_length: Option<usize>,
    size: usize,
}

impl TextField {
    /// Create a text field named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldBase::new(name),
            min_length: 0,
            max_length: None,
            size: 20,
        }
    }

    /// Mark the field required (builder pattern).
    pub fn required(mut self) -> Self {
        self.field.set_required(true);
        self
    }

    /// Set the label (builder pattern).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.field.set_label(label);
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

    /// Set the display width in characters (builder pattern).
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Minimum length.
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Maximum length.
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    fn render_field(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        let mut extra = vec![("size", self.size.to_string())];
        if let Some(max) = self.max_length {
            extra.push(("maxlength", max.to_string()));
        }
        render_input(buffer, &self.field, "TextField", "text", &extra)
    }
}

impl Field for TextField {
    fn field(&self) -> &FieldBase {
        &self.field
    }

    fn field_mut(&mut self) -> &mut FieldBase {
        &mut self.field
    }

    fn validate(&mut self) {
        validate_text(&mut self.field, self.min_length, self.max_length);
    }
}

impl_field_control!(TextField);

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_trellis_core::{Control, ErrorKind, Request};

    #[test]
    fn test_bind_and_validate() {
        let mut field = TextField::new("firstName").required().with_max_length(5);
        field.bind_request_value(&Request::post("/").with_param("firstName", "  Alexandra "));
        assert_eq!(field.value(), "Alexandra");

        field.validate();
        assert!(!field.is_valid());
        assert_eq!(
            field.error().map(|e| e.message.as_str()),
            Some("First Name must be no longer than 5 characters")
        );

        field.set_value("Alex".into());
        field.validate();
        assert!(field.is_valid());
        assert!(field.error().is_none());
    }

    #[test]
    fn test_required_missing_param() {
        let mut field = TextField::new("email").required();
        field.bind_request_value(&Request::post("/"));
        field.validate();
        assert_eq!(field.error().map(|e| e.kind), Some(ErrorKind::Required));
    }

    #[test]
    fn test_render() {
        let mut field = TextField::new("city").with_max_length(30);
        field.set_value("Köln".into());
        let html = (&field as &dyn Control).to_html().unwrap();
        assert_eq!(
            html,
            r#"<input type="text" name="city" id="city" value="Köln" size="20" maxlength="30"/>"#
        );
    }

    #[test]
    fn test_unnamed_render_fails() {
        let field = TextField::new("");
        let err = (&field as &dyn Control).to_html().unwrap_err();
        assert!(matches!(
            err,
            horizon_trellis_core::TrellisError::MissingName { kind: "TextField" }
        ));
    }
}
