//! Page-wide head resource aggregation.
//!
//! [`PageImports`] walks a control tree in render order, collects every
//! control's [`HeadElement`]s and legacy head snippets, removes duplicates and
//! renders the result in three slots: stylesheets, head scripts and
//! body-bottom scripts.
//!
//! # Deduplication
//!
//! - Imports are unique by URL; the first occurrence wins and keeps its
//!   position.
//! - Inline elements are unique only when declared [`Uniqueness::Unique`].
//! - Global style/script fragments are merged into one block rendered last in
//!   its slot.
//!
//! # Example
//!
//! ```
//! use horizon_trellis::head::PageImports;
//! use horizon_trellis_core::{HeadElement, Panel};
//!
//! let root = Panel::new("content");
//! let mut imports = PageImports::new(&root);
//! imports.add_element(HeadElement::css_import("/assets/site.css"));
//! imports.add_global_style("body { margin: 0 }");
//!
//! let css = imports.css().unwrap();
//! assert!(css.starts_with(r#"<link type="text/css" rel="stylesheet" href="/assets/site.css"/>"#));
//! assert!(css.ends_with("body { margin: 0 }</style>"));
//! ```

use std::cell::OnceCell;
use std::collections::HashSet;

use horizon_trellis_core::logging::{PerfSpan, span_names, targets};
use horizon_trellis_core::{
    Control, HeadCategory, HeadElement, HeadKey, HtmlStringBuffer, TrellisResult,
    parse_head_snippet,
};

#[derive(Debug, Default)]
struct Collected {
    css: Vec<HeadElement>,
    js_top: Vec<HeadElement>,
    js_bottom: Vec<HeadElement>,
    global_style: Vec<String>,
    global_script: Vec<String>,
}

impl Collected {
    fn accept(&mut self, element: HeadElement, seen: &mut HashSet<HeadKey>) {
        match element {
            HeadElement::GlobalStyle(fragment) => self.global_style.push(fragment),
            HeadElement::GlobalScript(fragment) => self.global_script.push(fragment),
            element => {
                if let Some(key) = element.dedup_key()
                    && !seen.insert(key)
                {
                    return;
                }
                match element.category() {
                    HeadCategory::Css => self.css.push(element),
                    HeadCategory::JsTop => self.js_top.push(element),
                    HeadCategory::JsBottom => self.js_bottom.push(element),
                }
            }
        }
    }
}

/// Aggregated head resources of one page render.
///
/// The tree is walked once, on first access to any output; later calls reuse
/// the result. The walk never mutates controls.
pub struct PageImports<'a> {
    root: &'a dyn Control,
    elements: Vec<HeadElement>,
    global_style: Vec<String>,
    global_script: Vec<String>,
    collected: OnceCell<Collected>,
}

impl<'a> PageImports<'a> {
    /// Create an aggregator for the tree rooted at `root`.
    pub fn new(root: &'a dyn Control) -> Self {
        Self {
            root,
            elements: Vec::new(),
            global_style: Vec::new(),
            global_script: Vec::new(),
            collected: OnceCell::new(),
        }
    }

    /// Add a page-level element, collected before any control's.
    pub fn add_element(&mut self, element: HeadElement) {
        self.collected.take();
        self.elements.push(element);
    }

    /// Append a fragment to the page-wide style block.
    pub fn add_global_style(&mut self, fragment: impl Into<String>) {
        self.collected.take();
        self.global_style.push(fragment.into());
    }

    /// Append a fragment to the page-wide script block.
    pub fn add_global_script(&mut self, fragment: impl Into<String>) {
        self.collected.take();
        self.global_script.push(fragment.into());
    }

    fn collected(&self) -> TrellisResult<&Collected> {
        if let Some(collected) = self.collected.get() {
            return Ok(collected);
        }
        let collected = self.walk()?;
        Ok(self.collected.get_or_init(|| collected))
    }

    fn walk(&self) -> TrellisResult<Collected> {
        let _span = PerfSpan::new(span_names::IMPORTS);
        let mut collected = Collected {
            global_style: self.global_style.clone(),
            global_script: self.global_script.clone(),
            ..Collected::default()
        };
        let mut seen = HashSet::new();

        for element in &self.elements {
            collected.accept(element.clone(), &mut seen);
        }

        let mut stack: Vec<&dyn Control> = vec![self.root];
        let mut visited = 0usize;
        while let Some(control) = stack.pop() {
            visited += 1;
            for element in control.head_elements() {
                collected.accept(element, &mut seen);
            }
            if let Some(snippet) = control.html_imports() {
                let elements = parse_head_snippet(&snippet).inspect_err(|err| {
                    tracing::error!(target: targets::HEAD, control = %control.id(), error = %err, "invalid head snippet");
                })?;
                for element in elements {
                    collected.accept(element, &mut seen);
                }
            }
            stack.extend(control.children().iter().rev().map(|child| child.as_ref()));
        }

        tracing::debug!(
            target: targets::HEAD,
            controls = visited,
            css = collected.css.len(),
            js_top = collected.js_top.len(),
            js_bottom = collected.js_bottom.len(),
            "collected head elements"
        );
        Ok(collected)
    }

    /// Stylesheets, followed by the global style block.
    pub fn css(&self) -> TrellisResult<String> {
        let collected = self.collected()?;
        Ok(render_slot(&collected.css, &collected.global_style, HeadElement::GlobalStyle))
    }

    /// Head scripts, followed by the global script block.
    pub fn js_top(&self) -> TrellisResult<String> {
        let collected = self.collected()?;
        Ok(render_slot(&collected.js_top, &collected.global_script, HeadElement::GlobalScript))
    }

    /// Body-bottom scripts.
    pub fn js_bottom(&self) -> TrellisResult<String> {
        let collected = self.collected()?;
        Ok(render_slot(&collected.js_bottom, &[], HeadElement::GlobalScript))
    }

    /// Stylesheets, head scripts and body-bottom scripts, in that order.
    pub fn all(&self) -> TrellisResult<String> {
        let parts = [self.css()?, self.js_top()?, self.js_bottom()?];
        Ok(parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn render_slot(
    elements: &[HeadElement],
    globals: &[String],
    global_block: impl FnOnce(String) -> HeadElement,
) -> String {
    let mut buffer = HtmlStringBuffer::new();
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            buffer.append_char('\n');
        }
        element.render(&mut buffer);
    }
    if !globals.is_empty() {
        if !buffer.is_empty() {
            buffer.append_char('\n');
        }
        global_block(globals.join("\n")).render(&mut buffer);
    }
    buffer.into_string()
}
