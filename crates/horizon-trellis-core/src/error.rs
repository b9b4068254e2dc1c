//! Error types for Horizon Trellis.
//!
//! Only configuration and programming errors are represented here. Field
//! validation failures are recoverable and recorded on the field itself, and
//! upload failures travel on the request as an [`UploadError`](crate::request::UploadError).

use std::path::PathBuf;

/// Result type alias for Trellis operations.
pub type TrellisResult<T> = std::result::Result<T, TrellisError>;

/// The main error type for Horizon Trellis operations.
#[derive(Debug, thiserror::Error)]
pub enum TrellisError {
    /// An argument violated a structural rule of the control tree.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An insertion index was outside `[0, len]`.
    #[error("index {index} out of range for container of {len} controls")]
    IndexOutOfRange { index: usize, len: usize },

    /// A container already holds a child with this name.
    #[error("container already contains a control named '{0}'")]
    DuplicateName(String),

    /// The control's name cannot change while it is attached to a parent.
    #[error("cannot rename control '{0}' while it is attached to a container")]
    NameLocked(String),

    /// The name collides with a framework-reserved request parameter.
    #[error("'{0}' is a reserved request parameter name")]
    ReservedName(String),

    /// A control reached rendering without a name.
    #[error("{kind} has no name; a name is required before rendering")]
    MissingName { kind: &'static str },

    /// A raw head-resource declaration could not be parsed.
    #[error("unparseable head resource declaration: {snippet}")]
    ResourceDeclaration { snippet: String },

    /// The declarative menu source was malformed.
    #[error("invalid menu source: {0}")]
    MenuSource(String),

    /// The template collaborator failed.
    #[error("template '{template}' failed to render: {message}")]
    Template { template: String, message: String },

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// File I/O error.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrellisError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a resource declaration error.
    pub fn resource_declaration(snippet: impl Into<String>) -> Self {
        Self::ResourceDeclaration {
            snippet: snippet.into(),
        }
    }

    /// Create a menu source error.
    pub fn menu_source(message: impl Into<String>) -> Self {
        Self::MenuSource(message.into())
    }

    /// Create a template error.
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors caused by static configuration rather than a
    /// programming mistake in the control tree.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MenuSource(_) | Self::Config(_) | Self::Io { .. } | Self::ResourceDeclaration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = TrellisError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "index 4 out of range for container of 2 controls");

        let err = TrellisError::MissingName { kind: "TextField" };
        assert!(err.to_string().starts_with("TextField has no name"));
    }

    #[test]
    fn test_io_source_chain() {
        use std::error::Error;

        let err = TrellisError::io(
            "menu.xml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.source().is_some());
        assert!(err.is_configuration());
        assert!(!TrellisError::DuplicateName("a".into()).is_configuration());
    }
}
