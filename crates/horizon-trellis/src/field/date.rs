//! Date field.
//!
//! Patterns use the `yyyy`/`MM`/`dd` letters and are translated to chrono
//! format strings once, when the pattern is set.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use horizon_trellis_core::{
    ErrorKind, Field, FieldBase, HeadElement, HtmlStringBuffer, Placement, TrellisConfig,
    TrellisResult,
};

use super::{impl_field_control, record_error, render_input, validate_text};

/// Translate a `SimpleDateFormat`-style pattern (`dd MMM yyyy`) into a
/// chrono format string (`%d %b %Y`).
///
/// Quoted text (`'at'`) is copied literally; unknown letters are kept as is.
pub fn translate_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            // '' is an escaped quote; otherwise copy until the closing quote.
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let directive = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', _) => "%M",
            ('s', _) => "%S",
            ('S', _) => "%3f",
            ('a', _) => "%p",
            _ => {
                for _ in 0..run {
                    out.push(c);
                }
                i += run;
                continue;
            }
        };
        out.push_str(directive);
        i += run;
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// A date input parsed with a date pattern.
///
/// After a successful validation the value is rewritten in the canonical
/// form of the pattern, so `1 jan 2024` becomes `01 Jan 2024`.
#[derive(Debug, Clone)]
pub struct DateField {
    field: FieldBase,
    pattern: String,
    format: String,
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
    date: Option<NaiveDateTime>,
    size: usize,
    explicit_pattern: bool,
}

impl DateField {
    /// Default pattern when none is configured.
    pub const DEFAULT_PATTERN: &'static str = "dd MMM yyyy";

    /// Create a date field using the default pattern. The application's
    /// configured pattern replaces it when the field is processed.
    pub fn new(name: impl Into<String>) -> Self {
        let mut field = Self::with_pattern(name, Self::DEFAULT_PATTERN);
        field.explicit_pattern = false;
        field
    }

    /// Create a date field using `pattern`.
    pub fn with_pattern(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        Self {
            field: FieldBase::new(name),
            format: translate_pattern(&pattern),
            size: pattern.chars().count().max(10),
            pattern,
            min_date: None,
            max_date: None,
            date: None,
            explicit_pattern: true,
        }
    }

    /// Mark the field required (builder pattern).
    pub fn required(mut self) -> Self {
        self.field.set_required(true);
        self
    }

    /// Set the earliest accepted date (builder pattern).
    pub fn with_min_date(mut self, min: NaiveDate) -> Self {
        self.min_date = Some(min);
        self
    }

    /// Set the latest accepted date (builder pattern).
    pub fn with_max_date(mut self, max: NaiveDate) -> Self {
        self.max_date = Some(max);
        self
    }

    /// The date pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The parsed date, set by a successful validation.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date.map(|dt| dt.date())
    }

    /// The parsed date and time.
    pub fn date_time(&self) -> Option<NaiveDateTime> {
        self.date
    }

    /// Set the date, updating the value.
    pub fn set_date(&mut self, date: NaiveDate) {
        let date_time = date.and_time(NaiveTime::MIN);
        self.field.set_value(date_time.format(&self.format).to_string());
        self.date = Some(date_time);
    }

    /// Parse `value` with the configured pattern.
    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(value, &self.format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, &self.format)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
    }

    fn format_date(&self, date: NaiveDate) -> String {
        date.and_time(NaiveTime::MIN).format(&self.format).to_string()
    }

    fn head_resources(&self) -> Vec<HeadElement> {
        vec![
            HeadElement::css_import("/trellis/calendar/calendar.css"),
            HeadElement::js_import_at("/trellis/calendar/calendar.js", Placement::BodyBottom),
        ]
    }

    fn render_field(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        let extra = [
            ("size", self.size.to_string()),
            ("data-date-pattern", self.pattern.clone()),
        ];
        render_input(buffer, &self.field, "DateField", "text", &extra)
    }
}

impl Field for DateField {
    fn field(&self) -> &FieldBase {
        &self.field
    }

    fn field_mut(&mut self) -> &mut FieldBase {
        &mut self.field
    }

    fn apply_config(&mut self, config: &TrellisConfig) {
        if !self.explicit_pattern && self.pattern != config.date_pattern {
            self.format = translate_pattern(&config.date_pattern);
            self.size = config.date_pattern.chars().count().max(10);
            self.pattern = config.date_pattern.clone();
        }
    }

    fn validate(&mut self) {
        self.date = None;
        if !validate_text(&mut self.field, 0, None) {
            return;
        }

        let Some(date_time) = self.parse(self.field.value()) else {
            let pattern = self.pattern.clone();
            record_error(&mut self.field, ErrorKind::DateFormat, &[&pattern]);
            return;
        };

        let date = date_time.date();
        if let Some(min) = self.min_date
            && date < min
        {
            let bound = self.format_date(min);
            record_error(&mut self.field, ErrorKind::DateMin, &[&bound]);
            return;
        }
        if let Some(max) = self.max_date
            && date > max
        {
            let bound = self.format_date(max);
            record_error(&mut self.field, ErrorKind::DateMax, &[&bound]);
            return;
        }

        self.field.set_value(date_time.format(&self.format).to_string());
        self.date = Some(date_time);
    }
}

impl_field_control!(DateField, head);
