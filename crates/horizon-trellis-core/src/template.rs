//! Template rendering collaborator.
//!
//! Pages and controls never assume a particular template language: they
//! build a [`TemplateModel`] (a string-keyed map of values) and hand it to a
//! [`TemplateService`] together with a template identifier.
//!
//! [`PlaceholderTemplateService`] is a small built-in implementation that
//! substitutes `${name}` and `$name` tokens, which is enough for simple
//! layouts and for tests.

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::{TrellisError, TrellisResult};

/// The model merged into a template.
pub type TemplateModel = Map<String, Value>;

/// Renders a named template against a model.
pub trait TemplateService: Send + Sync {
    /// Merge `model` into the template identified by `template`.
    fn render(&self, template: &str, model: &TemplateModel) -> TrellisResult<String>;
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .expect("placeholder pattern is valid")
    })
}

/// Template service substituting `${key}` / `$key` placeholders.
///
/// String values are inserted verbatim (they are usually rendered HTML),
/// other JSON values use their JSON text. Unknown placeholders are left
/// untouched.
#[derive(Debug, Default)]
pub struct PlaceholderTemplateService {
    templates: RwLock<HashMap<String, String>>,
}

impl PlaceholderTemplateService {
    /// Create a service with no registered templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a template body.
    pub fn register(&self, name: impl Into<String>, body: impl Into<String>) {
        self.templates.write().insert(name.into(), body.into());
    }

    /// Register a template (builder pattern).
    pub fn with_template(self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.register(name, body);
        self
    }

    /// Substitute placeholders in `body`.
    pub fn merge(body: &str, model: &TemplateModel) -> String {
        placeholder_pattern()
            .replace_all(body, |caps: &Captures<'_>| {
                let key = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                match model.get(key) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) => String::new(),
                    Some(other) => other.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

impl TemplateService for PlaceholderTemplateService {
    fn render(&self, template: &str, model: &TemplateModel) -> TrellisResult<String> {
        let templates = self.templates.read();
        let body = templates
            .get(template)
            .ok_or_else(|| TrellisError::template(template, "template not found"))?;
        Ok(Self::merge(body, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_placeholders() {
        let mut model = TemplateModel::new();
        model.insert("title".into(), json!("Customers"));
        model.insert("count".into(), json!(3));
        model.insert("form".into(), json!("<form></form>"));

        let merged = PlaceholderTemplateService::merge(
            "<h1>${title}</h1>$form<p>${count} rows</p>$unknown",
            &model,
        );
        assert_eq!(merged, "<h1>Customers</h1><form></form><p>3 rows</p>$unknown");
    }

    #[test]
    fn test_missing_template() {
        let service = PlaceholderTemplateService::new().with_template("a.htm", "$x");
        let err = service.render("b.htm", &TemplateModel::new()).unwrap_err();
        assert!(matches!(err, TrellisError::Template { .. }));
        assert_eq!(service.render("a.htm", &TemplateModel::new()).unwrap(), "$x");
    }
}
