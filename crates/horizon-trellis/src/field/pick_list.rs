//! Multi-select pick list.

use horizon_trellis_core::{ErrorKind, Field, FieldBase, HtmlStringBuffer, Request, TrellisResult};

use super::{impl_field_control, record_error, render_common_attributes};

/// An option offered by a [`PickList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Submitted value.
    pub value: String,
    /// Display text.
    pub label: String,
}

impl SelectOption {
    /// Create an option.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A multi-select list.
///
/// Selections are bound from every submitted value of the parameter, in
/// submission order. A required list needs at least one selection, and every
/// selection must be one of the options.
#[derive(Debug, Clone)]
pub struct PickList {
    field: FieldBase,
    options: Vec<SelectOption>,
    selected: Vec<String>,
    size: usize,
}

impl PickList {
    /// Create an empty pick list.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldBase::new(name),
            options: Vec::new(),
            selected: Vec::new(),
            size: 5,
        }
    }

    /// Mark the list required (builder pattern).
    pub fn required(mut self) -> Self {
        self.field.set_required(true);
        self
    }

    /// Add an option (builder pattern).
    pub fn with_option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.add_option(SelectOption::new(value, label));
        self
    }

    /// Add an option.
    pub fn add_option(&mut self, option: SelectOption) {
        self.options.push(option);
    }

    /// Offered options.
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    /// Current selections.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Replace the selections.
    pub fn set_selected<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = values.into_iter().map(Into::into).collect();
        self.field.set_value(self.selected.join(","));
    }

    fn render_field(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        buffer.element_start("select");
        render_common_attributes(buffer, &self.field, "PickList")?;
        buffer.append_attribute("multiple", "multiple");
        buffer.append_attribute("size", self.size.to_string());
        buffer.close_tag();

        for option in &self.options {
            buffer.element_start("option").append_attribute("value", &option.value);
            if self.selected.contains(&option.value) {
                buffer.append_attribute("selected", "selected");
            }
            buffer
                .close_tag()
                .append_escaped(&option.label)
                .element_end_tag("option");
        }
        buffer.element_end_tag("select");
        Ok(())
    }
}

impl Field for PickList {
    fn field(&self) -> &FieldBase {
        &self.field
    }

    fn field_mut(&mut self) -> &mut FieldBase {
        &mut self.field
    }

    fn bind_request_value(&mut self, request: &Request) {
        let values: Vec<String> = request
            .param_values(self.field.name())
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        self.set_selected(values);
    }

    fn validate(&mut self) {
        self.field.clear_error();
        if self.selected.is_empty() {
            if self.field.is_required() {
                record_error(&mut self.field, ErrorKind::Required, &[]);
            }
            return;
        }
        let unknown = self
            .selected
            .iter()
            .any(|value| !self.options.iter().any(|o| &o.value == value));
        if unknown {
            record_error(&mut self.field, ErrorKind::InvalidOption, &[]);
        }
    }
}

impl_field_control!(PickList);

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_trellis_core::Control;

    fn colours() -> PickList {
        PickList::new("colours")
            .required()
            .with_option("r", "Red")
            .with_option("g", "Green")
            .with_option("b", "Blue")
    }

    #[test]
    fn test_bind_keeps_submission_order() {
        let mut list = colours();
        list.bind_request_value(
            &Request::post("/")
                .with_param("colours", "b")
                .with_param("colours", "r"),
        );
        list.validate();
        assert!(list.is_valid());
        assert_eq!(list.selected(), ["b", "r"]);
        assert_eq!(list.value(), "b,r");
    }

    #[test]
    fn test_required_and_unknown() {
        let mut list = colours();
        list.bind_request_value(&Request::post("/"));
        list.validate();
        assert_eq!(list.error().map(|e| e.kind), Some(ErrorKind::Required));

        list.set_selected(["r", "x"]);
        list.validate();
        assert_eq!(list.error().map(|e| e.kind), Some(ErrorKind::InvalidOption));
    }

    #[test]
    fn test_render_marks_selected() {
        let mut list = colours();
        list.set_selected(["g"]);
        let html = (&list as &dyn Control).to_html().unwrap();
        assert!(html.starts_with(r#"<select name="colours" id="colours" multiple="multiple" size="5">"#));
        assert!(html.contains(r#"<option value="g" selected="selected">Green</option>"#));
        assert!(html.contains(r#"<option value="r">Red</option>"#));
        assert!(html.ends_with("</select>"));
    }
}
