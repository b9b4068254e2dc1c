//! HTML output buffer.
//!
//! [`HtmlStringBuffer`] is the append-only buffer every control renders into.
//! It knows how to open and close elements and how to write attributes with
//! the correct escaping.
//!
//! # Example
//!
//! ```
//! use horizon_trellis_core::html::HtmlStringBuffer;
//!
//! let mut buffer = HtmlStringBuffer::new();
//! buffer.element_start("input");
//! buffer.append_attribute("name", "email");
//! buffer.append_attribute("value", "a<b");
//! buffer.element_end();
//!
//! assert_eq!(buffer.as_str(), r#"<input name="email" value="a&lt;b"/>"#);
//! ```

use std::fmt;

/// Escape the five HTML-significant characters.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    push_escaped(&mut escaped, value);
    escaped
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Returns true for attributes holding JavaScript event handlers (`onclick`,
/// `onchange`, ...). Their values are written verbatim.
pub fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.as_bytes()[..2].eq_ignore_ascii_case(b"on")
}

/// An append-only text buffer with HTML-aware helpers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlStringBuffer {
    buf: String,
}

impl HtmlStringBuffer {
    /// Default capacity, large enough for a typical field.
    pub const DEFAULT_CAPACITY: usize = 128;

    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create an empty buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
        }
    }

    /// Append raw text.
    pub fn append(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.buf.push_str(text.as_ref());
        self
    }

    /// Append a single character.
    pub fn append_char(&mut self, c: char) -> &mut Self {
        self.buf.push(c);
        self
    }

    /// Append text with HTML escaping applied.
    pub fn append_escaped(&mut self, text: impl AsRef<str>) -> &mut Self {
        push_escaped(&mut self.buf, text.as_ref());
        self
    }

    /// Append ` name="value"`.
    ///
    /// Values are escaped unless `name` is an event handler attribute.
    pub fn append_attribute(&mut self, name: &str, value: impl AsRef<str>) -> &mut Self {
        if is_event_handler(name) {
            self.write_attribute(name, value.as_ref(), false)
        } else {
            self.write_attribute(name, value.as_ref(), true)
        }
    }

    /// Append ` name="value"` with escaping applied unconditionally.
    pub fn append_attribute_escaped(&mut self, name: &str, value: impl AsRef<str>) -> &mut Self {
        self.write_attribute(name, value.as_ref(), true)
    }

    /// Append an attribute only when a value is present.
    pub fn append_optional_attribute(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.append_attribute(name, value);
        }
        self
    }

    /// Append every attribute of an ordered map.
    pub fn append_attributes<'a, I>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (name, value) in attributes {
            self.append_attribute(name, value);
        }
        self
    }

    /// Append ` disabled="disabled"`.
    pub fn append_attribute_disabled(&mut self) -> &mut Self {
        self.buf.push_str(" disabled=\"disabled\"");
        self
    }

    /// Append ` readonly="readonly"`.
    pub fn append_attribute_readonly(&mut self) -> &mut Self {
        self.buf.push_str(" readonly=\"readonly\"");
        self
    }

    fn write_attribute(&mut self, name: &str, value: &str, escape: bool) -> &mut Self {
        self.buf.push(' ');
        self.buf.push_str(name);
        self.buf.push_str("=\"");
        if escape {
            push_escaped(&mut self.buf, value);
        } else {
            self.buf.push_str(value);
        }
        self.buf.push('"');
        self
    }

    /// Append `<name` leaving the tag open for attributes.
    pub fn element_start(&mut self, name: &str) -> &mut Self {
        self.buf.push('<');
        self.buf.push_str(name);
        self
    }

    /// Append `>` closing an open start tag.
    pub fn close_tag(&mut self) -> &mut Self {
        self.buf.push('>');
        self
    }

    /// Append `/>` closing an empty element.
    pub fn element_end(&mut self) -> &mut Self {
        self.buf.push_str("/>");
        self
    }

    /// Append `</name>`.
    pub fn element_end_tag(&mut self, name: &str) -> &mut Self {
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
        self
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the contents.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consume the buffer and return its contents.
    pub fn into_string(self) -> String {
        self.buf
    }
}

impl fmt::Display for HtmlStringBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

impl fmt::Write for HtmlStringBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}
