//! Hidden field carrying several values under one name.

use horizon_trellis_core::{Field, FieldBase, HtmlStringBuffer, Request, TrellisResult};

use super::impl_field_control;

/// A list of values carried through a round trip as repeated hidden inputs.
#[derive(Debug, Clone)]
pub struct HiddenList {
    field: FieldBase,
    values: Vec<String>,
}

impl HiddenList {
    /// Create an empty hidden list.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldBase::new(name),
            values: Vec::new(),
        }
    }

    /// The carried values.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Append a value.
    pub fn add_value(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    /// Replace the values.
    pub fn set_values(&mut self, values: Vec<String>) {
        self.values = values;
    }

    fn render_field(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        let name = self.field.control().require_name("HiddenList")?;
        for value in &self.values {
            buffer
                .element_start("input")
                .append_attribute("type", "hidden")
                .append_attribute("name", name)
                .append_attribute("value", value)
                .element_end();
        }
        Ok(())
    }
}

impl Field for HiddenList {
    fn field(&self) -> &FieldBase {
        &self.field
    }

    fn field_mut(&mut self) -> &mut FieldBase {
        &mut self.field
    }

    fn bind_request_value(&mut self, request: &Request) {
        self.values = request.param_values(self.field.name()).to_vec();
    }

    fn validate(&mut self) {
        self.field.clear_error();
    }

    fn is_hidden(&self) -> bool {
        true
    }
}

impl_field_control!(HiddenList);
