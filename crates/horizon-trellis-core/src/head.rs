//! Head resources contributed by controls.
//!
//! A control declares the stylesheets and scripts it needs as a list of
//! [`HeadElement`]s. The page aggregates them, removes duplicates and renders
//! them in the document head or at the bottom of the body.
//!
//! Imports (`CssImport`, `JsImport`) are always deduplicated by URL. Inline
//! elements carry an explicit [`Uniqueness`], because two identical inline
//! scripts are sometimes intended (for example one per table row).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{TrellisError, TrellisResult};
use crate::html::HtmlStringBuffer;

/// Where a script is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Inside `<head>`.
    #[default]
    Head,
    /// Just before `</body>`.
    BodyBottom,
}

/// Deduplication policy for inline elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Uniqueness {
    /// Render once per page. With a key, elements sharing the key are
    /// duplicates; without one, identical content is.
    Unique { key: Option<String> },
    /// Render every occurrence.
    Repeatable,
}

impl Uniqueness {
    /// Unique by content.
    pub fn unique() -> Self {
        Self::Unique { key: None }
    }

    /// Unique by an explicit key.
    pub fn keyed(key: impl Into<String>) -> Self {
        Self::Unique {
            key: Some(key.into()),
        }
    }
}

/// Output category of a head element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadCategory {
    /// Stylesheets, rendered in the head.
    Css,
    /// Scripts rendered in the head.
    JsTop,
    /// Scripts rendered at the bottom of the body.
    JsBottom,
}

/// A single head resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeadElement {
    /// `<link rel="stylesheet">`.
    CssImport { href: String },
    /// `<script src>`.
    JsImport { src: String, placement: Placement },
    /// Inline `<style>`.
    CssStyle { content: String, uniqueness: Uniqueness },
    /// Inline `<script>`.
    JsScript {
        content: String,
        placement: Placement,
        uniqueness: Uniqueness,
    },
    /// Fragment appended to the page-wide style block.
    GlobalStyle(String),
    /// Fragment appended to the page-wide script block.
    GlobalScript(String),
}

/// Deduplication key of an element, `None` when it always renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeadKey {
    /// A stylesheet URL.
    Stylesheet(String),
    /// A script URL, whatever its placement.
    Script(String),
    /// A uniqueness key.
    Key(HeadCategory, String),
    /// Inline content.
    Content(HeadCategory, String),
}

impl HeadElement {
    /// A stylesheet import.
    pub fn css_import(href: impl Into<String>) -> Self {
        Self::CssImport { href: href.into() }
    }

    /// A script import rendered in the head.
    pub fn js_import(src: impl Into<String>) -> Self {
        Self::JsImport {
            src: src.into(),
            placement: Placement::Head,
        }
    }

    /// A script import with an explicit placement.
    pub fn js_import_at(src: impl Into<String>, placement: Placement) -> Self {
        Self::JsImport {
            src: src.into(),
            placement,
        }
    }

    /// An inline stylesheet.
    pub fn css_style(content: impl Into<String>, uniqueness: Uniqueness) -> Self {
        Self::CssStyle {
            content: content.into(),
            uniqueness,
        }
    }

    /// An inline script.
    pub fn js_script(content: impl Into<String>, placement: Placement, uniqueness: Uniqueness) -> Self {
        Self::JsScript {
            content: content.into(),
            placement,
            uniqueness,
        }
    }

    /// The output category.
    pub fn category(&self) -> HeadCategory {
        match self {
            Self::CssImport { .. } | Self::CssStyle { .. } | Self::GlobalStyle(_) => HeadCategory::Css,
            Self::JsImport { placement, .. } | Self::JsScript { placement, .. } => match placement {
                Placement::Head => HeadCategory::JsTop,
                Placement::BodyBottom => HeadCategory::JsBottom,
            },
            Self::GlobalScript(_) => HeadCategory::JsTop,
        }
    }

    /// Returns true for global accumulator fragments.
    pub fn is_global(&self) -> bool {
        matches!(self, Self::GlobalStyle(_) | Self::GlobalScript(_))
    }

    /// The deduplication key, or `None` for repeatable and global elements.
    pub fn dedup_key(&self) -> Option<HeadKey> {
        let category = self.category();
        match self {
            Self::CssImport { href } => Some(HeadKey::Stylesheet(href.clone())),
            Self::JsImport { src, .. } => Some(HeadKey::Script(src.clone())),
            Self::CssStyle { content, uniqueness } | Self::JsScript { content, uniqueness, .. } => {
                match uniqueness {
                    Uniqueness::Unique { key: Some(key) } => Some(HeadKey::Key(category, key.clone())),
                    Uniqueness::Unique { key: None } => {
                        Some(HeadKey::Content(category, content.clone()))
                    }
                    Uniqueness::Repeatable => None,
                }
            }
            Self::GlobalStyle(_) | Self::GlobalScript(_) => None,
        }
    }

    /// Render the element.
    pub fn render(&self, buffer: &mut HtmlStringBuffer) {
        match self {
            Self::CssImport { href } => {
                buffer
                    .element_start("link")
                    .append_attribute("type", "text/css")
                    .append_attribute("rel", "stylesheet")
                    .append_attribute("href", href)
                    .element_end();
            }
            Self::JsImport { src, .. } => {
                buffer
                    .element_start("script")
                    .append_attribute("type", "text/javascript")
                    .append_attribute("src", src)
                    .close_tag()
                    .element_end_tag("script");
            }
            Self::CssStyle { content, .. } | Self::GlobalStyle(content) => {
                buffer
                    .element_start("style")
                    .append_attribute("type", "text/css")
                    .close_tag()
                    .append(content)
                    .element_end_tag("style");
            }
            Self::JsScript { content, .. } | Self::GlobalScript(content) => {
                buffer
                    .element_start("script")
                    .append_attribute("type", "text/javascript")
                    .close_tag()
                    .append(content)
                    .element_end_tag("script");
            }
        }
    }
}

fn snippet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r#"(?is)"#,
            r#"<link\b(?P<link>[^>]*?)/?>"#,
            r#"|<script\b(?P<script_attrs>[^>]*)>(?P<script_body>.*?)</script\s*>"#,
            r#"|<style\b[^>]*>(?P<style_body>.*?)</style\s*>"#,
            r#"|<!--.*?-->"#,
        ))
        .expect("head snippet pattern is valid")
    })
}

fn attribute_value<'a>(attributes: &'a str, name: &str) -> Option<&'a str> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)([a-z-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attribute pattern is valid")
    });
    pattern.captures_iter(attributes).find_map(|caps| {
        if caps[1].eq_ignore_ascii_case(name) {
            caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str())
        } else {
            None
        }
    })
}

/// Parse a raw HTML head snippet into elements.
///
/// Accepts stylesheet `<link>` tags, `<script>` tags (with `src` or inline
/// body), `<style>` blocks and comments separated by whitespace. Inline
/// bodies are unique by content. Anything else is a
/// [`TrellisError::ResourceDeclaration`].
pub fn parse_head_snippet(snippet: &str) -> TrellisResult<Vec<HeadElement>> {
    let mut elements = Vec::new();
    let mut cursor = 0;

    for caps in snippet_pattern().captures_iter(snippet) {
        let Some(whole) = caps.get(0) else { continue };
        if !snippet[cursor..whole.start()].trim().is_empty() {
            return Err(TrellisError::resource_declaration(snippet));
        }
        cursor = whole.end();

        if let Some(link) = caps.name("link") {
            let attrs = link.as_str();
            let href = attribute_value(attrs, "href")
                .ok_or_else(|| TrellisError::resource_declaration(whole.as_str()))?;
            let is_stylesheet = attribute_value(attrs, "rel")
                .is_none_or(|rel| rel.eq_ignore_ascii_case("stylesheet"));
            if !is_stylesheet {
                return Err(TrellisError::resource_declaration(whole.as_str()));
            }
            elements.push(HeadElement::css_import(href));
        } else if let Some(attrs) = caps.name("script_attrs") {
            let body = caps.name("script_body").map_or("", |m| m.as_str());
            match attribute_value(attrs.as_str(), "src") {
                Some(src) => elements.push(HeadElement::js_import(src)),
                None => elements.push(HeadElement::js_script(
                    body.trim(),
                    Placement::Head,
                    Uniqueness::unique(),
                )),
            }
        } else if let Some(body) = caps.name("style_body") {
            elements.push(HeadElement::css_style(body.as_str().trim(), Uniqueness::unique()));
        }
    }

    if !snippet[cursor..].trim().is_empty() {
        return Err(TrellisError::resource_declaration(snippet));
    }
    Ok(elements)
}
