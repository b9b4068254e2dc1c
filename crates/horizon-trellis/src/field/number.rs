//! Locale-aware number field.
//!
//! Values are parsed against a decimal pattern such as `#,##0.00`, rounded
//! half-even to the pattern's fraction digits and written back formatted.

use horizon_trellis_core::{
    ErrorKind, Field, FieldBase, HtmlStringBuffer, TrellisConfig, TrellisResult,
};

use super::{impl_field_control, record_error, render_input, validate_text};

/// Grouping and decimal separators of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberSymbols {
    /// Thousands separator.
    pub grouping: char,
    /// Decimal separator.
    pub decimal: char,
}

impl Default for NumberSymbols {
    fn default() -> Self {
        Self {
            grouping: ',',
            decimal: '.',
        }
    }
}

impl NumberSymbols {
    /// Symbols for a locale tag such as `en`, `de-CH` or `fr_FR`.
    pub fn for_locale(tag: &str) -> Self {
        let language = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "de" | "es" | "it" | "nl" | "pt" | "id" | "da" | "tr" => Self {
                grouping: '.',
                decimal: ',',
            },
            "fr" | "ru" | "sv" | "nb" | "fi" | "pl" | "cs" => Self {
                grouping: '\u{a0}',
                decimal: ',',
            },
            _ => Self::default(),
        }
    }

    fn is_grouping(&self, c: char) -> bool {
        c == self.grouping || (self.grouping == '\u{a0}' && c == ' ')
    }
}

/// A parsed decimal pattern such as `#,##0.00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    /// Digits per group, `None` without grouping.
    pub grouping_size: Option<usize>,
    /// Minimum integer digits.
    pub min_integer_digits: usize,
    /// Minimum fraction digits.
    pub min_fraction_digits: usize,
    /// Maximum fraction digits; extra digits are rounded half-even.
    pub max_fraction_digits: usize,
}

/// A number split into sign and digit strings.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Digits {
    negative: bool,
    integer: String,
    fraction: String,
}

impl Digits {
    fn is_zero(&self) -> bool {
        self.integer.bytes().chain(self.fraction.bytes()).all(|b| b == b'0')
    }

    fn to_f64(&self) -> Option<f64> {
        let integer = if self.integer.is_empty() { "0" } else { &self.integer };
        let fraction = if self.fraction.is_empty() { "0" } else { &self.fraction };
        let sign = if self.negative { "-" } else { "" };
        format!("{sign}{integer}.{fraction}").parse().ok()
    }

    /// Round to `scale` fraction digits using banker's rounding.
    fn round_half_even(mut self, scale: usize) -> Self {
        if self.fraction.len() <= scale {
            return self;
        }
        let dropped = &self.fraction.as_bytes()[scale..];
        let first = dropped[0];
        let rest_nonzero = dropped[1..].iter().any(|&b| b != b'0');
        let last_kept = if scale > 0 {
            self.fraction.as_bytes()[scale - 1]
        } else {
            self.integer.bytes().last().unwrap_or(b'0')
        };
        let round_up = first > b'5' || (first == b'5' && (rest_nonzero || (last_kept - b'0') % 2 == 1));

        self.fraction.truncate(scale);
        if round_up {
            let mut digits: Vec<u8> = self.integer.bytes().chain(self.fraction.bytes()).collect();
            let mut carry = true;
            for digit in digits.iter_mut().rev() {
                if *digit == b'9' {
                    *digit = b'0';
                } else {
                    *digit += 1;
                    carry = false;
                    break;
                }
            }
            if carry {
                digits.insert(0, b'1');
            }
            let split = digits.len() - scale;
            self.fraction = String::from_utf8_lossy(&digits[split..]).into_owned();
            self.integer = String::from_utf8_lossy(&digits[..split]).into_owned();
        }
        self
    }
}

impl NumberFormat {
    /// Parse a decimal pattern. Only `#`, `0`, `,` and `.` are significant;
    /// a negative subpattern after `;` is ignored.
    pub fn parse(pattern: &str) -> Self {
        let positive = pattern.split(';').next().unwrap_or_default();
        let (integer, fraction) = positive.split_once('.').unwrap_or((positive, ""));

        let grouping_size = integer.rfind(',').map(|pos| {
            integer[pos + 1..]
                .chars()
                .filter(|c| matches!(c, '#' | '0'))
                .count()
        });
        Self {
            grouping_size: grouping_size.filter(|&size| size > 0),
            min_integer_digits: integer.chars().filter(|&c| c == '0').count(),
            min_fraction_digits: fraction.chars().filter(|&c| c == '0').count(),
            max_fraction_digits: fraction.chars().filter(|c| matches!(c, '#' | '0')).count(),
        }
    }

    fn split(value: &str, symbols: &NumberSymbols) -> Option<Digits> {
        let value = value.trim();
        let (negative, body) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value.strip_prefix('+').unwrap_or(value)),
        };

        let mut digits = Digits {
            negative,
            integer: String::new(),
            fraction: String::new(),
        };
        let mut in_fraction = false;
        for c in body.chars() {
            match c {
                '0'..='9' if in_fraction => digits.fraction.push(c),
                '0'..='9' => digits.integer.push(c),
                c if c == symbols.decimal && !in_fraction => in_fraction = true,
                c if symbols.is_grouping(c) && !in_fraction => {}
                _ => return None,
            }
        }
        if digits.integer.is_empty() && digits.fraction.is_empty() {
            return None;
        }
        Some(digits)
    }

    fn format_digits(&self, digits: Digits, symbols: &NumberSymbols) -> String {
        let digits = digits.round_half_even(self.max_fraction_digits);
        let negative = digits.negative && !digits.is_zero();

        let mut integer = digits.integer.trim_start_matches('0').to_string();
        let mut fraction = digits.fraction;
        while fraction.len() > self.min_fraction_digits && fraction.ends_with('0') {
            fraction.pop();
        }
        while fraction.len() < self.min_fraction_digits {
            fraction.push('0');
        }
        while integer.len() < self.min_integer_digits {
            integer.insert(0, '0');
        }
        if integer.is_empty() && fraction.is_empty() {
            integer.push('0');
        }

        let mut out = String::with_capacity(integer.len() + fraction.len() + 4);
        if negative {
            out.push('-');
        }
        match self.grouping_size {
            Some(size) => {
                let len = integer.len();
                for (i, c) in integer.chars().enumerate() {
                    if i > 0 && (len - i) % size == 0 {
                        out.push(symbols.grouping);
                    }
                    out.push(c);
                }
            }
            None => out.push_str(&integer),
        }
        if !fraction.is_empty() {
            out.push(symbols.decimal);
            out.push_str(&fraction);
        }
        out
    }

    /// Parse `value` with `symbols` and reformat it with this pattern.
    ///
    /// Returns `None` when `value` is not a number.
    pub fn reformat(&self, value: &str, symbols: &NumberSymbols) -> Option<String> {
        Self::split(value, symbols).map(|digits| self.format_digits(digits, symbols))
    }

    /// Format an `f64` with this pattern.
    pub fn format_f64(&self, value: f64, symbols: &NumberSymbols) -> String {
        let plain = value.to_string();
        match Self::split(&plain, &NumberSymbols::default()) {
            Some(digits) => self.format_digits(digits, symbols),
            None => plain,
        }
    }
}

/// A decimal input parsed and reformatted with a locale-aware pattern.
#[derive(Debug, Clone)]
pub struct NumberField {
    field: FieldBase,
    pattern: String,
    format: NumberFormat,
    symbols: NumberSymbols,
    explicit_locale: bool,
    min_value: Option<f64>,
    max_value: Option<f64>,
    number: Option<f64>,
}

impl NumberField {
    /// Default pattern when none is configured.
    pub const DEFAULT_PATTERN: &'static str = "#,##0.##";

    /// Create a number field with the default pattern and English symbols.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_pattern(name, Self::DEFAULT_PATTERN)
    }

    /// Create a number field with `pattern`.
    pub fn with_pattern(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        Self {
            field: FieldBase::new(name),
            format: NumberFormat::parse(&pattern),
            pattern,
            symbols: NumberSymbols::default(),
            explicit_locale: false,
            min_value: None,
            max_value: None,
            number: None,
        }
    }

    /// Mark the field required (builder pattern).
    pub fn required(mut self) -> Self {
        self.field.set_required(true);
        self
    }

    /// Use the separators of `locale` (builder pattern).
    pub fn with_locale(mut self, locale: &str) -> Self {
        self.symbols = NumberSymbols::for_locale(locale);
        self.explicit_locale = true;
        self
    }

    /// Set the minimum accepted value (builder pattern).
    pub fn with_min_value(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    /// Set the maximum accepted value (builder pattern).
    pub fn with_max_value(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }

    /// The pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The parsed number, set by a successful validation.
    pub fn number(&self) -> Option<f64> {
        self.number
    }

    /// Set the number, updating the value.
    pub fn set_number(&mut self, number: f64) {
        self.field.set_value(self.format.format_f64(number, &self.symbols));
        self.number = Some(number);
    }

    fn render_field(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        render_input(buffer, &self.field, "NumberField", "text", &[("size", "12".to_string())])
    }
}

impl Field for NumberField {
    fn field(&self) -> &FieldBase {
        &self.field
    }

    fn field_mut(&mut self) -> &mut FieldBase {
        &mut self.field
    }

    fn apply_config(&mut self, config: &TrellisConfig) {
        if !self.explicit_locale {
            self.symbols = NumberSymbols::for_locale(&config.locale);
        }
    }

    fn validate(&mut self) {
        self.number = None;
        if !validate_text(&mut self.field, 0, None) {
            return;
        }

        let Some(digits) = NumberFormat::split(self.field.value(), &self.symbols) else {
            record_error(&mut self.field, ErrorKind::NumberFormat, &[]);
            return;
        };
        let formatted = self.format.format_digits(digits, &self.symbols);
        let Some(number) = NumberFormat::split(&formatted, &self.symbols).and_then(|d| d.to_f64())
        else {
            record_error(&mut self.field, ErrorKind::NumberFormat, &[]);
            return;
        };

        if let Some(min) = self.min_value
            && number < min
        {
            let bound = self.format.format_f64(min, &self.symbols);
            record_error(&mut self.field, ErrorKind::NumberMin, &[&bound]);
            return;
        }
        if let Some(max) = self.max_value
            && number > max
        {
            let bound = self.format.format_f64(max, &self.symbols);
            record_error(&mut self.field, ErrorKind::NumberMax, &[&bound]);
            return;
        }

        self.field.set_value(formatted);
        self.number = Some(number);
    }
}

impl_field_control!(NumberField);
