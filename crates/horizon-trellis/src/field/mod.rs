//! Form fields.
//!
//! Each field kind binds a request parameter (or parameter list, or uploaded
//! file) and validates it. Validation failures are recorded on the field as a
//! [`FieldError`](horizon_trellis_core::FieldError) with a message rendered
//! from [`messages`].
//!
//! # Field Kinds
//!
//! | Kind | Validation |
//! |------|------------|
//! | [`TextField`] | required, minimum and maximum length |
//! | [`HiddenField`] | none |
//! | [`DateField`] | date pattern, optional minimum and maximum date |
//! | [`NumberField`] | locale-aware decimal pattern, optional bounds |
//! | [`TelephoneField`] | length, then telephone characters only |
//! | [`ColorField`] | `#RGB` or `#RRGGBB` |
//! | [`PickList`] | selections must be offered options |
//! | [`HiddenList`] | none |
//! | [`FileField`] | required upload must be non-empty |

mod color;
mod date;
mod file;
mod hidden;
mod hidden_list;
pub mod messages;
mod number;
mod pick_list;
mod telephone;
mod text;

pub use color::ColorField;
pub use date::{DateField, translate_pattern};
pub use file::FileField;
pub use hidden::HiddenField;
pub use hidden_list::HiddenList;
pub use number::{NumberField, NumberFormat, NumberSymbols};
pub use pick_list::{PickList, SelectOption};
pub use telephone::TelephoneField;
pub use text::TextField;

use std::fmt::Display;

use horizon_trellis_core::{ErrorKind, FieldBase, FieldError, HtmlStringBuffer, TrellisResult};

/// Record an error of `kind` using the field label and `args`.
pub(crate) fn record_error(field: &mut FieldBase, kind: ErrorKind, args: &[&dyn Display]) {
    let message = messages::render(kind, &field.label(), args);
    field.set_error(FieldError::new(kind, message));
}

/// Shared required and length checks for text-like fields.
///
/// Returns `true` when the value is non-empty and within bounds, meaning
/// format checks should follow.
pub(crate) fn validate_text(field: &mut FieldBase, min_length: usize, max_length: Option<usize>) -> bool {
    field.clear_error();
    let length = field.value().chars().count();

    if length == 0 {
        if field.is_required() {
            record_error(field, ErrorKind::Required, &[]);
        }
        return false;
    }
    if min_length > 0 && length < min_length {
        record_error(field, ErrorKind::MinLength, &[&min_length]);
        return false;
    }
    if let Some(max) = max_length
        && length > max
    {
        record_error(field, ErrorKind::MaxLength, &[&max]);
        return false;
    }
    true
}

/// Write the attributes every visible input shares: `name`, `id`, user
/// attributes, `title`, `disabled`/`readonly` and the error class.
pub(crate) fn render_common_attributes(
    buffer: &mut HtmlStringBuffer,
    field: &FieldBase,
    kind: &'static str,
) -> TrellisResult<()> {
    let control = field.control();
    let name = control.require_name(kind)?;
    buffer.append_attribute("name", name);
    buffer.append_attribute("id", control.html_id().unwrap_or(name));

    let mut class = control.attributes().get("class").map(str::to_string);
    if !field.is_valid() {
        class = Some(match class {
            Some(existing) => format!("{existing} error"),
            None => "error".to_string(),
        });
    }
    buffer.append_optional_attribute("class", class.as_deref());
    buffer.append_attributes(
        control
            .attributes()
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "id" | "class" | "name" | "value")),
    );
    buffer.append_optional_attribute("title", field.title());
    if field.is_disabled() {
        buffer.append_attribute_disabled();
    }
    if field.is_readonly() {
        buffer.append_attribute_readonly();
    }
    Ok(())
}

/// Render a single `<input>` element.
pub(crate) fn render_input(
    buffer: &mut HtmlStringBuffer,
    field: &FieldBase,
    kind: &'static str,
    input_type: &str,
    extra: &[(&str, String)],
) -> TrellisResult<()> {
    buffer.element_start("input");
    buffer.append_attribute("type", input_type);
    render_common_attributes(buffer, field, kind)?;
    buffer.append_attribute("value", field.value());
    for (name, value) in extra {
        buffer.append_attribute(name, value);
    }
    buffer.element_end();
    Ok(())
}

/// Implements [`Control`](horizon_trellis_core::Control) for a field type
/// with an inherent `render_field` method.
///
/// The `head` form also forwards `head_elements` to an inherent
/// `head_resources` method.
macro_rules! impl_field_control {
    ($ty:ty) => {
        impl_field_control!(@impl $ty, {});
    };
    ($ty:ty, head) => {
        impl_field_control!(@impl $ty, {
            fn head_elements(&self) -> Vec<horizon_trellis_core::HeadElement> {
                self.head_resources()
            }
        });
    };
    (@impl $ty:ty, { $($extra:tt)* }) => {
        impl horizon_trellis_core::Control for $ty {
            fn base(&self) -> &horizon_trellis_core::ControlBase {
                self.field.control()
            }

            fn base_mut(&mut self) -> &mut horizon_trellis_core::ControlBase {
                self.field.control_mut()
            }

            fn on_process(&mut self, ctx: &mut horizon_trellis_core::ProcessContext<'_>) -> bool {
                horizon_trellis_core::process_field(self, ctx)
            }

            fn render(
                &self,
                buffer: &mut horizon_trellis_core::HtmlStringBuffer,
            ) -> horizon_trellis_core::TrellisResult<()> {
                self.render_field(buffer)
            }

            fn as_field(&self) -> Option<&dyn horizon_trellis_core::Field> {
                Some(self)
            }

            fn as_field_mut(&mut self) -> Option<&mut dyn horizon_trellis_core::Field> {
                Some(self)
            }

            $($extra)*
        }
    };
}

pub(crate) use impl_field_control;
