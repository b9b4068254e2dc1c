//! Hidden input field.

use horizon_trellis_core::{Field, FieldBase, HtmlStringBuffer, TrellisResult};

use super::{impl_field_control, render_input};

/// A hidden input carrying a value through a round trip.
#[derive(Debug, Clone)]
pub struct HiddenField {
    field: FieldBase,
}

impl HiddenField {
    /// Create a hidden field with an initial value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut field = FieldBase::new(name);
        field.set_value(value);
        field.set_trim(false);
        Self { field }
    }

    fn render_field(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        render_input(buffer, &self.field, "HiddenField", "hidden", &[])
    }
}

impl Field for HiddenField {
    fn field(&self) -> &FieldBase {
        &self.field
    }

    fn field_mut(&mut self) -> &mut FieldBase {
        &mut self.field
    }

    fn validate(&mut self) {
        self.field.clear_error();
    }

    fn is_hidden(&self) -> bool {
        true
    }
}

impl_field_control!(HiddenField);

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_trellis_core::{Control, Request};

    #[test]
    fn test_round_trip_value() {
        let mut field = HiddenField::new("id", "42");
        assert_eq!((&field as &dyn Control).to_html().unwrap(), r#"<input type="hidden" name="id" id="id" value="42"/>"#);

        field.bind_request_value(&Request::post("/").with_param("id", " 43 "));
        field.validate();
        assert_eq!(field.value(), " 43 ");
        assert!(field.is_valid() && field.is_hidden());
    }
}
