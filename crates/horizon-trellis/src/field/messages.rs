//! Validation message templates.
//!
//! Templates use positional `{0}`, `{1}` placeholders; `{0}` is always the
//! field label.

use std::fmt::Display;

use horizon_trellis_core::ErrorKind;

/// The template for an error kind.
pub fn template(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Required => "{0} is required",
        ErrorKind::MinLength => "{0} must be at least {1} characters",
        ErrorKind::MaxLength => "{0} must be no longer than {1} characters",
        ErrorKind::DateFormat => "{0} must be a date with the format {1}",
        ErrorKind::DateMin => "{0} must be on or after {1}",
        ErrorKind::DateMax => "{0} must be on or before {1}",
        ErrorKind::NumberFormat => "{0} must be a number",
        ErrorKind::NumberMin => "{0} must be greater than or equal to {1}",
        ErrorKind::NumberMax => "{0} must be less than or equal to {1}",
        ErrorKind::TelephoneFormat => "{0} must be a valid telephone number",
        ErrorKind::ColorFormat => "{0} must be a hexadecimal colour such as #3366ff",
        ErrorKind::InvalidOption => "{0} contains an invalid selection",
        ErrorKind::Upload => "{0} could not be uploaded: {1}",
        ErrorKind::Custom => "{0} is invalid",
    }
}

/// Render the message for `kind`.
pub fn render(kind: ErrorKind, label: &str, args: &[&dyn Display]) -> String {
    let mut message = template(kind).replace("{0}", label);
    for (i, arg) in args.iter().enumerate() {
        message = message.replace(&format!("{{{}}}", i + 1), &arg.to_string());
    }
    message
}
