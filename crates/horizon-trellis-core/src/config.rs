//! Application configuration.
//!
//! Configuration is read from a TOML document. Every key is optional:
//!
//! ```toml
//! mode = "production"
//! charset = "UTF-8"
//! context_path = "/shop"
//! locale = "en"
//! date_pattern = "dd MMM yyyy"
//!
//! [upload]
//! file_size_max = 1048576
//! size_max = 4194304
//!
//! [menu]
//! source = "WEB-INF/menu.xml"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{TrellisError, TrellisResult};
use crate::request::{MultipartParser, Request, UploadLimits};
use crate::logging::targets;

/// The deployment mode controls caching and diagnostics.
///
/// Production-like modes cache the menu tree and hide error details;
/// development-like modes rebuild on every access to support hot reloading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeploymentMode {
    /// Live deployment.
    Production,
    /// Production behaviour with timing output.
    Profile,
    /// Local development.
    #[default]
    Development,
    /// Development with debug logging.
    Debug,
    /// Development with trace logging.
    Trace,
}

impl DeploymentMode {
    /// Returns true for modes that cache and hide diagnostics.
    pub fn is_production_like(self) -> bool {
        matches!(self, Self::Production | Self::Profile)
    }

    /// The lowercase mode name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Profile => "profile",
            Self::Development => "development",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentMode {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "profile" => Ok(Self::Profile),
            "development" => Ok(Self::Development),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(TrellisError::Config(format!(
                "unknown deployment mode '{other}'"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for DeploymentMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Menu-related settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Path of the declarative menu document.
    pub source: Option<PathBuf>,
}

/// Top-level Trellis configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrellisConfig {
    /// Deployment mode.
    pub mode: DeploymentMode,
    /// Response character set.
    pub charset: String,
    /// Application context path prefix used for generated links.
    pub context_path: String,
    /// Locale tag selecting number formatting symbols (`en`, `de`, `fr`, ...).
    pub locale: String,
    /// Default date pattern for date fields.
    pub date_pattern: String,
    /// Upload limits handed to the multipart collaborator.
    pub upload: UploadLimits,
    /// Menu settings.
    pub menu: MenuConfig,
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::default(),
            charset: "UTF-8".to_string(),
            context_path: String::new(),
            locale: "en".to_string(),
            date_pattern: "dd MMM yyyy".to_string(),
            upload: UploadLimits::default(),
            menu: MenuConfig::default(),
        }
    }
}

impl TrellisConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(source: &str) -> TrellisResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| TrellisError::Config(e.to_string()))?;
        tracing::debug!(target: targets::CONFIG, mode = %config.mode, "loaded configuration");
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> TrellisResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| TrellisError::io(path, e))?;
        Self::from_toml_str(&source)
    }

    /// Prepare an inbound request before it reaches a page.
    ///
    /// The configured context path is applied when the request carries
    /// none, and POST requests are handed to `multipart` with the configured
    /// upload limits.
    pub fn prepare_request(&self, request: &mut Request, multipart: Option<&dyn MultipartParser>) {
        if request.context_path().is_empty() && !self.context_path.is_empty() {
            request.set_context_path(self.context_path.as_str());
        }
        if let Some(parser) = multipart
            && request.is_post()
        {
            request.apply_multipart(parser, &self.upload);
        }
    }

    /// Set the deployment mode (builder pattern).
    pub fn with_mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrellisConfig::default();
        assert_eq!(config.mode, DeploymentMode::Development);
        assert_eq!(config.charset, "UTF-8");
        assert!(!config.mode.is_production_like());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = TrellisConfig::from_toml_str(
            r#"
            mode = "Production"
            context_path = "/shop"

            [upload]
            size_max = 4096
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, DeploymentMode::Production);
        assert!(config.mode.is_production_like());
        assert_eq!(config.context_path, "/shop");
        assert_eq!(config.upload.size_max, Some(4096));
        assert_eq!(config.upload.file_size_max, None);
        assert_eq!(config.locale, "en");
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = TrellisConfig::from_toml_str("mode = \"staging\"").unwrap_err();
        assert!(matches!(err, TrellisError::Config(_)));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trellis.toml");
        std::fs::write(&path, "mode = \"profile\"\n[menu]\nsource = \"menu.xml\"\n").unwrap();

        let config = TrellisConfig::load(&path).unwrap();
        assert_eq!(config.mode, DeploymentMode::Profile);
        assert_eq!(config.menu.source, Some(PathBuf::from("menu.xml")));

        let missing = TrellisConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, TrellisError::Io { .. }));
    }

    #[test]
    fn test_prepare_request() {
        use crate::request::{FileItem, UploadError};

        struct LimitEcho;
        impl MultipartParser for LimitEcho {
            fn parse(&self, _: &Request, limits: &UploadLimits) -> Result<Vec<FileItem>, UploadError> {
                Err(UploadError::SizeExceeded {
                    limit: limits.size_max.unwrap_or_default(),
                })
            }
        }

        let mut config = TrellisConfig::default();
        config.context_path = "/shop".to_string();
        config.upload.size_max = Some(64);

        let mut request = Request::post("/upload.htm");
        config.prepare_request(&mut request, Some(&LimitEcho));
        assert_eq!(request.context_path(), "/shop");
        assert!(matches!(request.upload_error(), Some(UploadError::SizeExceeded { limit: 64 })));

        let mut request = Request::get("/").with_context_path("/other");
        config.prepare_request(&mut request, Some(&LimitEcho));
        assert_eq!(request.context_path(), "/other");
        assert!(request.upload_error().is_none());
    }
}
