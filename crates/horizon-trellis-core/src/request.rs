//! Request and response values exchanged with the HTTP layer.
//!
//! Trellis does not own a server loop. The embedding application converts
//! its framework's request into a [`Request`] (path, parameters, session
//! attributes, principal), runs a page, and writes the returned [`Response`].
//!
//! Multipart bodies are parsed by an external [`MultipartParser`]; the
//! outcome is stored on the request so forms can short-circuit when an upload
//! failed.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::logging::targets;

/// Framework-reserved request parameter names.
///
/// These are part of the wire contract and must not be used as field names.
pub mod params {
    /// Name of the action link that was clicked.
    pub const ACTION_LINK: &str = "actionLink";
    /// Name of the form being submitted.
    pub const FORM_NAME: &str = "form_name";
    /// Table the paging/sorting parameters belong to.
    pub const TABLE: &str = "table";
    /// Zero-based table page number.
    pub const PAGE: &str = "page";
    /// Sorted table column name.
    pub const COLUMN: &str = "column";
    /// Table sort direction (`true`/`false`).
    pub const ASCENDING: &str = "ascending";

    /// All reserved names.
    pub const RESERVED: &[&str] = &[ACTION_LINK, FORM_NAME, TABLE, PAGE, COLUMN, ASCENDING];

    /// Returns true if `name` is reserved by the framework.
    pub fn is_reserved(name: &str) -> bool {
        RESERVED.contains(&name)
    }
}

/// The authenticated user attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    name: String,
    roles: HashSet<String>,
}

impl Principal {
    /// Create a principal with the given roles.
    pub fn new<I, S>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// The principal's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the principal holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// An uploaded file produced by the multipart collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    /// Form field the file was submitted under.
    pub field_name: String,
    /// Client-side file name.
    pub file_name: String,
    /// Declared content type.
    pub content_type: String,
    /// File contents.
    pub data: Vec<u8>,
}

impl FileItem {
    /// Size of the upload in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Size limits handed to the multipart collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    /// Maximum size of a single file in bytes (`None` = unlimited).
    pub file_size_max: Option<u64>,
    /// Maximum size of the whole request in bytes (`None` = unlimited).
    pub size_max: Option<u64>,
}

/// Failures reported by the multipart collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// A single file exceeded `file_size_max`.
    #[error("file '{file_name}' exceeds the maximum size of {limit} bytes")]
    FileSizeExceeded { file_name: String, limit: u64 },
    /// The request body exceeded `size_max`.
    #[error("request exceeds the maximum size of {limit} bytes")]
    SizeExceeded { limit: u64 },
    /// The multipart stream could not be parsed.
    #[error("malformed multipart request: {0}")]
    Malformed(String),
}

/// The multipart parsing collaborator.
pub trait MultipartParser: Send + Sync {
    /// Read the multipart body of `request` into file items.
    fn parse(&self, request: &Request, limits: &UploadLimits) -> Result<Vec<FileItem>, UploadError>;
}

/// An inbound HTTP request as seen by the control tree.
#[derive(Debug, Clone, Default)]
pub struct Request {
    method: String,
    path: String,
    context_path: String,
    parameters: HashMap<String, Vec<String>>,
    session: HashMap<String, Value>,
    principal: Option<Principal>,
    files: Vec<FileItem>,
    upload_error: Option<UploadError>,
}

impl Request {
    /// Create a GET request for `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create a POST request for `path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: "POST".to_string(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a parameter value (builder pattern). Repeated names accumulate.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_param(name, value);
        self
    }

    /// Attach a principal (builder pattern).
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Set the servlet-style context path prefix (builder pattern).
    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    /// Set the context path prefix.
    pub fn set_context_path(&mut self, context_path: impl Into<String>) {
        self.context_path = context_path.into();
    }

    /// Add a parameter value. Repeated names accumulate in order.
    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    /// HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns true for POST requests.
    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }

    /// Request path relative to the context path, e.g. `/customers.htm`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Application context path, e.g. `/shop`.
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// First value of a parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a parameter, in submission order.
    pub fn param_values(&self, name: &str) -> &[String] {
        self.parameters
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns true if the parameter was submitted at all.
    pub fn has_param(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Read a session attribute.
    pub fn session_attribute(&self, name: &str) -> Option<&Value> {
        self.session.get(name)
    }

    /// Store a session attribute.
    pub fn set_session_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.session.insert(name.into(), value);
    }

    /// The authenticated principal, if any.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns true if the principal holds `role`.
    pub fn is_user_in_role(&self, role: &str) -> bool {
        self.principal.as_ref().is_some_and(|p| p.has_role(role))
    }

    /// Run the multipart collaborator and store its outcome on the request.
    ///
    /// On failure the error is kept as a request-scoped flag; it is not
    /// returned because form processing decides how to report it.
    pub fn apply_multipart(&mut self, parser: &dyn MultipartParser, limits: &UploadLimits) {
        match parser.parse(self, limits) {
            Ok(files) => {
                tracing::debug!(target: targets::REQUEST, count = files.len(), "parsed multipart request");
                self.files = files;
            }
            Err(err) => {
                tracing::warn!(target: targets::REQUEST, error = %err, "multipart parsing failed");
                self.upload_error = Some(err);
            }
        }
    }

    /// Uploaded file submitted under `field_name`.
    pub fn file_item(&self, field_name: &str) -> Option<&FileItem> {
        self.files.iter().find(|item| item.field_name == field_name)
    }

    /// The upload failure recorded for this request, if any.
    pub fn upload_error(&self) -> Option<&UploadError> {
        self.upload_error.as_ref()
    }
}

/// The response produced by rendering a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Content type including charset.
    pub content_type: String,
    /// Response headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Rendered body.
    pub body: String,
}

impl Response {
    /// Create a 200 response with an HTML body.
    pub fn html(body: String, charset: &str) -> Self {
        Self {
            status: 200,
            content_type: format!("text/html; charset={charset}"),
            headers: Vec::new(),
            body,
        }
    }

    /// Set a header, replacing an existing value with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    /// Look up a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
