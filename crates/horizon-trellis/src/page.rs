//! Pages and the request lifecycle.
//!
//! A [`Page`] is the root container of a control tree. [`Page::process`]
//! drives one request through the lifecycle:
//!
//! 1. `on_init` on every control
//! 2. the process phase (binding, validation, table state restore), which
//!    queues listeners
//! 3. listener dispatch, in queue order, stopping at the first listener that
//!    returns `false`
//! 4. `on_render`
//! 5. rendering, through a [`TemplateService`] or the built-in skeleton
//! 6. `on_destroy`, which always runs
//!
//! Configuration errors abort the render; [`ErrorPage`] turns them into a
//! diagnostic response.

use std::error::Error;
use std::sync::Arc;

use horizon_trellis_core::{
    ActionEventDispatcher, Control, ControlBase, ControlId, DeploymentMode, HeadElement,
    HtmlStringBuffer, PerfSpan, ProcessContext, Request, Response, TemplateModel,
    TemplateService, TrellisConfig, TrellisResult, container::ContainerBase, find_control,
    find_control_mut, logging::{span_names, targets},
};
use serde_json::Value;

use crate::head::PageImports;

/// The root of a control tree served at a path.
///
/// # Example
///
/// ```
/// use horizon_trellis::field::TextField;
/// use horizon_trellis::form::Form;
/// use horizon_trellis::page::Page;
/// use horizon_trellis_core::{Request, TrellisConfig};
///
/// let mut page = Page::new("/hello.htm").with_title("Hello");
/// let mut form = Form::new("greet");
/// form.add(TextField::new("name")).unwrap();
/// page.add(form).unwrap();
///
/// let response = page.process(&Request::get("/hello.htm"), &TrellisConfig::default()).unwrap();
/// assert!(response.body.contains("<title>Hello</title>"));
/// ```
pub struct Page {
    container: ContainerBase,
    path: String,
    title: Option<String>,
    template: Option<(String, Arc<dyn TemplateService>)>,
    head_elements: Vec<HeadElement>,
    global_styles: Vec<String>,
    global_scripts: Vec<String>,
    headers: Vec<(String, String)>,
}

impl Page {
    /// Create an empty page served at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            container: ContainerBase::new(),
            path: path.into(),
            title: None,
            template: None,
            head_elements: Vec::new(),
            global_styles: Vec::new(),
            global_scripts: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Set the document title (builder pattern).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Render through `service` using the template `name` (builder pattern).
    pub fn with_template(mut self, name: impl Into<String>, service: Arc<dyn TemplateService>) -> Self {
        self.template = Some((name.into(), service));
        self
    }

    /// The page path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The document title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Add a top-level control.
    pub fn add<C: Control>(&mut self, control: C) -> TrellisResult<ControlId> {
        self.container.add(control)
    }

    /// The top-level controls.
    pub fn container(&self) -> &ContainerBase {
        &self.container
    }

    /// Mutable top-level controls.
    pub fn container_mut(&mut self) -> &mut ContainerBase {
        &mut self.container
    }

    /// Find a control anywhere in the page by name and type.
    pub fn find<T: Control>(&self, name: &str) -> Option<&T> {
        find_control::<T>(self, name)
    }

    /// Find a mutable control anywhere in the page by name and type.
    pub fn find_mut<T: Control>(&mut self, name: &str) -> Option<&mut T> {
        find_control_mut::<T>(self, name)
    }

    /// Add a page-level head element, emitted before any control's.
    pub fn add_head_element(&mut self, element: HeadElement) {
        self.head_elements.push(element);
    }

    /// Append a fragment to the page-wide style block.
    pub fn add_global_style(&mut self, fragment: impl Into<String>) {
        self.global_styles.push(fragment.into());
    }

    /// Append a fragment to the page-wide script block.
    pub fn add_global_script(&mut self, fragment: impl Into<String>) {
        self.global_scripts.push(fragment.into());
    }

    /// Set a response header.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    /// Run `request` through the page lifecycle.
    ///
    /// # Errors
    ///
    /// Configuration errors raised while rendering (a control without a
    /// name, an invalid head snippet, a failing template) abort the render.
    /// Controls are destroyed either way.
    pub fn process(&mut self, request: &Request, config: &TrellisConfig) -> TrellisResult<Response> {
        let _span = PerfSpan::new(span_names::PROCESS);
        tracing::debug!(target: targets::PAGE, path = %self.path, method = request.method(), "processing page");

        self.on_init();

        let mut dispatcher = ActionEventDispatcher::new();
        let proceed = {
            let mut ctx = ProcessContext::new(request, config, &mut dispatcher);
            self.container.process_children(&mut ctx)
        };
        if proceed && !dispatcher.is_empty() {
            let _span = PerfSpan::new(span_names::DISPATCH);
            dispatcher.fire(request, self);
        }

        self.on_render();
        let rendered = {
            let _span = PerfSpan::new(span_names::RENDER);
            self.render_page(request, config)
        };
        self.on_destroy()?;

        let mut response = Response::html(rendered?, &config.charset);
        for (name, value) in &self.headers {
            response.set_header(name, value);
        }
        Ok(response)
    }

    /// Run `request`, turning a configuration error into an error page.
    pub fn respond(&mut self, request: &Request, config: &TrellisConfig) -> Response {
        match self.process(request, config) {
            Ok(response) => response,
            Err(error) => ErrorPage::new(config.mode).render(&error, &config.charset),
        }
    }

    fn render_page(&self, request: &Request, config: &TrellisConfig) -> TrellisResult<String> {
        let mut imports = PageImports::new(self);
        for element in &self.head_elements {
            imports.add_element(element.clone());
        }
        for fragment in &self.global_styles {
            imports.add_global_style(fragment.as_str());
        }
        for fragment in &self.global_scripts {
            imports.add_global_script(fragment.as_str());
        }

        match &self.template {
            Some((template, service)) => {
                let mut model = TemplateModel::new();
                for child in self.container.children() {
                    if let Some(name) = child.name() {
                        model.insert(name.to_string(), Value::String(child.as_ref().to_html()?));
                    }
                }
                model.insert("imports".into(), Value::String(imports.all()?));
                model.insert("css".into(), Value::String(imports.css()?));
                model.insert("js".into(), Value::String(imports.js_top()?));
                model.insert("jsBottom".into(), Value::String(imports.js_bottom()?));
                model.insert("title".into(), self.title.clone().map_or(Value::Null, Value::String));
                model.insert("path".into(), Value::String(self.path.clone()));
                model.insert("context".into(), Value::String(request.context_path().to_string()));
                service.render(template, &model)
            }
            None => {
                let mut buffer = HtmlStringBuffer::new();
                buffer.append("<!DOCTYPE html>\n<html><head>");
                buffer.element_start("meta").append_attribute("charset", &config.charset).element_end();
                if let Some(title) = &self.title {
                    buffer.append("<title>").append_escaped(title).append("</title>");
                }
                for part in [imports.css()?, imports.js_top()?] {
                    if !part.is_empty() {
                        buffer.append_char('\n').append(part);
                    }
                }
                buffer.append("\n</head><body>\n");
                self.container.render_children(&mut buffer)?;
                let bottom = imports.js_bottom()?;
                if !bottom.is_empty() {
                    buffer.append_char('\n').append(bottom);
                }
                buffer.append("\n</body></html>");
                Ok(buffer.into_string())
            }
        }
    }
}

impl Control for Page {
    fn base(&self) -> &ControlBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        self.container.base_mut()
    }

    fn children(&self) -> &[Box<dyn Control>] {
        self.container.children()
    }

    fn children_mut(&mut self) -> &mut [Box<dyn Control>] {
        self.container.children_mut()
    }

    fn on_init(&mut self) {
        self.container.init_children();
    }

    fn on_process(&mut self, ctx: &mut ProcessContext<'_>) -> bool {
        self.container.process_children(ctx)
    }

    fn on_render(&mut self) {
        self.container.on_render_children();
    }

    fn on_destroy(&mut self) -> TrellisResult<()> {
        self.container.destroy_children();
        Ok(())
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        self.container.render_children(buffer)
    }
}

// ============================================================================
// ErrorPage
// ============================================================================

/// Diagnostic page for configuration errors.
///
/// The error and its causes are shown only outside production-like modes.
#[derive(Debug, Clone, Copy)]
pub struct ErrorPage {
    mode: DeploymentMode,
}

impl ErrorPage {
    /// Create an error page for `mode`.
    pub fn new(mode: DeploymentMode) -> Self {
        Self { mode }
    }

    /// The messages of `error` and each of its sources.
    pub fn error_chain(error: &(dyn Error + 'static)) -> Vec<String> {
        std::iter::successors(Some(error), |&e| e.source())
            .map(ToString::to_string)
            .collect()
    }

    /// Render a 500 response for `error`.
    pub fn render(&self, error: &(dyn Error + 'static), charset: &str) -> Response {
        tracing::error!(target: targets::PAGE, error = %error, "request failed");

        let mut buffer = HtmlStringBuffer::new();
        buffer.append("<!DOCTYPE html>\n<html><head><title>Error</title></head><body>");
        buffer.append("<h1>Error</h1><p>The request could not be completed.</p>");
        if !self.mode.is_production_like() {
            buffer.append("<pre class=\"error-chain\">");
            for (i, message) in Self::error_chain(error).iter().enumerate() {
                if i > 0 {
                    buffer.append("\ncaused by: ");
                }
                buffer.append_escaped(message);
            }
            buffer.append("</pre>");
        }
        buffer.append("</body></html>");

        let mut response = Response::html(buffer.into_string(), charset);
        response.status = 500;
        response
    }
}
