//! Colour picker field accepting `#RGB` and `#RRGGBB` values.

use std::sync::OnceLock;

use horizon_trellis_core::{
    ErrorKind, Field, FieldBase, HeadElement, HtmlStringBuffer, Placement, TrellisResult,
    Uniqueness,
};
use regex::Regex;

use super::{impl_field_control, record_error, render_input, validate_text};

fn color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("colour pattern is valid")
    })
}

/// A hex colour input (`#RGB` or `#RRGGBB`) with a swatch preview.
#[derive(Debug, Clone)]
pub struct ColorField {
    field: FieldBase,
}

impl ColorField {
    /// Create a colour field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldBase::new(name),
        }
    }

    /// Mark the field required (builder pattern).
    pub fn required(mut self) -> Self {
        self.field.set_required(true);
        self
    }

    /// Returns true if `value` is a hex colour.
    pub fn is_color(value: &str) -> bool {
        color_pattern().is_match(value)
    }

    fn head_resources(&self) -> Vec<HeadElement> {
        vec![
            HeadElement::css_style(
                ".color-swatch { display: inline-block; width: 1em; height: 1em; border: 1px solid #999; }",
                Uniqueness::keyed("color-field-style"),
            ),
            HeadElement::js_import_at("/trellis/colorpicker/colorpicker.js", Placement::BodyBottom),
        ]
    }

    fn render_field(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        let extra = [("size", "7".to_string()), ("maxlength", "7".to_string())];
        render_input(buffer, &self.field, "ColorField", "text", &extra)?;

        buffer.element_start("span").append_attribute("class", "color-swatch");
        if self.field.is_valid() && Self::is_color(self.field.value()) {
            buffer.append_attribute("style", format!("background-color: {}", self.field.value()));
        }
        buffer.close_tag().element_end_tag("span");
        Ok(())
    }
}

impl Field for ColorField {
    fn field(&self) -> &FieldBase {
        &self.field
    }

    fn field_mut(&mut self) -> &mut FieldBase {
        &mut self.field
    }

    fn validate(&mut self) {
        if !validate_text(&mut self.field, 0, Some(7)) {
            return;
        }
        if !Self::is_color(self.field.value()) {
            record_error(&mut self.field, ErrorKind::ColorFormat, &[]);
        }
    }
}

impl_field_control!(ColorField, head);
