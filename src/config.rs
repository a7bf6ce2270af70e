//! Configuration management for MDChat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{MdChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for MDChat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Chat session behavior
    #[serde(default)]
    pub session: SessionConfig,
    /// Transcript export settings
    #[serde(default)]
    pub export: ExportConfig,
    /// Local state settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the chat backend (no trailing `/api`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Chat session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Title given to freshly created conversations
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Number of characters of the first message used as the title
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,

    /// Assistant message shown when a send fails
    #[serde(default = "default_connection_error_message")]
    pub connection_error_message: String,
}

fn default_title() -> String {
    "New Chat".to_string()
}

fn default_title_max_chars() -> usize {
    40
}

fn default_connection_error_message() -> String {
    "Connection error. Try again.".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_title: default_title(),
            title_max_chars: default_title_max_chars(),
            connection_error_message: default_connection_error_message(),
        }
    }
}

/// Transcript export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Title line printed at the top of the first page
    #[serde(default = "default_export_title")]
    pub title: String,

    /// Default output filename
    #[serde(default = "default_export_filename")]
    pub filename: String,

    /// Document format
    #[serde(default)]
    pub format: ExportFormat,

    /// When page overflow is checked
    #[serde(default)]
    pub page_break: PageBreak,

    /// Font size in points (PDF output only)
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Page geometry used for line wrapping and pagination
    #[serde(default)]
    pub geometry: PageGeometry,
}

fn default_export_title() -> String {
    "MD Agents Chat Export".to_string()
}

fn default_export_filename() -> String {
    "chat-history.pdf".to_string()
}

fn default_font_size() -> f32 {
    16.0
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: default_export_title(),
            filename: default_export_filename(),
            format: ExportFormat::default(),
            page_break: PageBreak::default(),
            font_size: default_font_size(),
            geometry: PageGeometry::default(),
        }
    }
}

impl ExportConfig {
    /// Filename to use when no output path is given
    ///
    /// The configured filename is used as-is for PDF output; for text output
    /// its extension is replaced with `.txt`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mdchat::config::{ExportConfig, ExportFormat};
    ///
    /// let config = ExportConfig::default();
    /// assert_eq!(config.default_filename(ExportFormat::Pdf), "chat-history.pdf");
    /// assert_eq!(config.default_filename(ExportFormat::Text), "chat-history.txt");
    /// ```
    pub fn default_filename(&self, format: ExportFormat) -> String {
        match format {
            ExportFormat::Pdf => self.filename.clone(),
            ExportFormat::Text => Path::new(&self.filename)
                .with_extension("txt")
                .to_string_lossy()
                .to_string(),
        }
    }
}

/// Output document format for transcript export
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// PDF document, one PDF page per layout page
    #[default]
    Pdf,
    /// Plain text, pages separated by form feeds
    Text,
}

/// Page overflow policy for transcript export
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageBreak {
    /// Check before every line; no line is placed past the height budget
    #[default]
    PerLine,
    /// Check once after each whole message; long messages may run past
    /// the height budget and a trailing blank page may be emitted
    PerMessage,
}

/// Page geometry in layout units (millimetres on an A4 page)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageGeometry {
    /// Physical page width
    #[serde(default = "default_page_width")]
    pub page_width: f32,
    /// Physical page height
    #[serde(default = "default_page_height")]
    pub page_height: f32,
    /// Maximum width of a wrapped line
    #[serde(default = "default_text_width")]
    pub text_width: f32,
    /// Cursor position beyond which a new page is started
    #[serde(default = "default_height_budget")]
    pub height_budget: f32,
    /// Horizontal position of every line
    #[serde(default = "default_margin")]
    pub left_margin: f32,
    /// Cursor position at the top of each page
    #[serde(default = "default_margin")]
    pub top_margin: f32,
    /// Cursor advance after the title line
    #[serde(default = "default_header_height")]
    pub header_height: f32,
    /// Cursor advance per wrapped line
    #[serde(default = "default_line_height")]
    pub line_height: f32,
    /// Width of one character, used for wrapping
    #[serde(default = "default_char_width")]
    pub char_width: f32,
}

fn default_page_width() -> f32 {
    210.0
}

fn default_page_height() -> f32 {
    297.0
}

fn default_text_width() -> f32 {
    180.0
}

fn default_height_budget() -> f32 {
    270.0
}

fn default_margin() -> f32 {
    10.0
}

fn default_header_height() -> f32 {
    10.0
}

fn default_line_height() -> f32 {
    8.0
}

fn default_char_width() -> f32 {
    3.0
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            text_width: default_text_width(),
            height_budget: default_height_budget(),
            left_margin: default_margin(),
            top_margin: default_margin(),
            header_height: default_header_height(),
            line_height: default_line_height(),
            char_width: default_char_width(),
        }
    }
}

/// Local state configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the logged-in flag file; the user data directory is used
    /// when unset
    #[serde(default)]
    pub auth_file: Option<String>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MdChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MdChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(timeout) = std::env::var("MDCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid MDCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(format) = std::env::var("MDCHAT_EXPORT_FORMAT") {
            self.export.format = match format.to_lowercase().as_str() {
                "pdf" => ExportFormat::Pdf,
                "text" | "txt" => ExportFormat::Text,
                _ => {
                    tracing::warn!("Invalid export format: {}, using default", format);
                    ExportFormat::default()
                }
            };
        }

        if let Ok(auth_file) = std::env::var("MDCHAT_AUTH_FILE") {
            tracing::debug!(auth_file = %auth_file, "Env override: MDCHAT_AUTH_FILE");
            self.storage.auth_file = Some(auth_file);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(url) = &cli.backend_url {
            tracing::debug!(base_url = %url, "CLI override: backend url");
            self.backend.base_url = url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(MdChatError::Config("backend.base_url cannot be empty".to_string()).into());
        }

        let url = url::Url::parse(&self.backend.base_url).map_err(|e| {
            MdChatError::Config(format!(
                "Invalid backend.base_url {}: {}",
                self.backend.base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MdChatError::Config(format!(
                "backend.base_url must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(MdChatError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.title_max_chars == 0 {
            return Err(MdChatError::Config(
                "session.title_max_chars must be greater than 0".to_string(),
            )
            .into());
        }

        if self.export.filename.trim().is_empty() {
            return Err(
                MdChatError::Config("export.filename cannot be empty".to_string()).into(),
            );
        }

        if self.export.font_size <= 0.0 {
            return Err(MdChatError::Config(
                "export.font_size must be greater than 0".to_string(),
            )
            .into());
        }

        let g = &self.export.geometry;
        let dimensions = [
            ("page_width", g.page_width),
            ("page_height", g.page_height),
            ("text_width", g.text_width),
            ("height_budget", g.height_budget),
            ("line_height", g.line_height),
            ("char_width", g.char_width),
        ];
        for (name, value) in dimensions {
            if value <= 0.0 {
                return Err(MdChatError::Config(format!(
                    "export.geometry.{} must be greater than 0",
                    name
                ))
                .into());
            }
        }

        if g.line_height > g.height_budget {
            return Err(MdChatError::Config(
                "export.geometry.line_height must not exceed height_budget".to_string(),
            )
            .into());
        }

        if g.top_margin >= g.height_budget {
            return Err(MdChatError::Config(
                "export.geometry.top_margin must be less than height_budget".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.timeout_seconds, 120);
        assert_eq!(config.session.default_title, "New Chat");
        assert_eq!(config.session.title_max_chars, 40);
        assert_eq!(config.export.filename, "chat-history.pdf");
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_url() {
        let mut config = Config::default();
        config.backend.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_unparseable_url() {
        let mut config = Config::default();
        config.backend.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_non_http_scheme() {
        let mut config = Config::default();
        config.backend.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_title_length() {
        let mut config = Config::default();
        config.session.title_max_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_geometry() {
        let mut config = Config::default();
        config.export.geometry.line_height = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.export.geometry.line_height = 300.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.export.geometry.top_margin = 280.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
backend:
  base_url: http://chat.internal:9000
  timeout_seconds: 30

session:
  default_title: Untitled
  title_max_chars: 20

export:
  format: text
  page_break: per_message
  geometry:
    line_height: 6
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.backend.base_url, "http://chat.internal:9000");
        assert_eq!(config.backend.timeout_seconds, 30);
        assert_eq!(config.session.default_title, "Untitled");
        assert_eq!(config.session.title_max_chars, 20);
        assert_eq!(
            config.session.connection_error_message,
            "Connection error. Try again."
        );
        assert_eq!(config.export.format, ExportFormat::Text);
        assert_eq!(config.export.page_break, PageBreak::PerMessage);
        assert_eq!(config.export.geometry.line_height, 6.0);
        assert_eq!(config.export.geometry.text_width, 180.0);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config: Config = serde_yaml::from_str(include_str!("../config/config.yaml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.export.geometry, PageGeometry::default());
        assert_eq!(config.export.format, ExportFormat::Pdf);
        assert!(config.storage.auth_file.is_none());
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.export.page_break, PageBreak::PerLine);
    }

    #[test]
    fn test_page_break_serialization() {
        let yaml = serde_yaml::to_string(&PageBreak::PerLine).unwrap();
        assert!(yaml.contains("per_line"));
        let yaml = serde_yaml::to_string(&PageBreak::PerMessage).unwrap();
        assert!(yaml.contains("per_message"));
    }

    #[test]
    fn test_default_filename_for_text() {
        let mut config = ExportConfig::default();
        config.filename = "transcripts/out.pdf".to_string();
        assert_eq!(
            config.default_filename(ExportFormat::Text),
            "transcripts/out.txt"
        );
    }

    #[test]
    fn test_load_nonexistent_file_uses_defaults() {
        let cli = crate::cli::Cli {
            config: None,
            verbose: false,
            backend_url: Some("http://override.test:1234".to_string()),
            command: crate::cli::Commands::Login,
        };

        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert_eq!(config.backend.base_url, "http://override.test:1234");
        assert_eq!(config.session.default_title, "New Chat");
    }

    #[test]
    fn test_load_from_file() {
        let dir = crate::test_utils::temp_dir();
        let path = crate::test_utils::create_test_file(
            &dir,
            "config.yaml",
            &crate::test_utils::test_config_yaml(),
        );
        let cli = crate::cli::Cli::default();

        let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.export.format, ExportFormat::Text);
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = crate::test_utils::temp_dir();
        let path = crate::test_utils::create_test_file(&dir, "config.yaml", "backend: [1, 2");
        let cli = crate::cli::Cli::default();

        let result = Config::load(path.to_str().unwrap(), &cli);
        assert!(result.is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_apply_env_vars_overrides_fields() {
        std::env::set_var("MDCHAT_TIMEOUT_SECONDS", "15");
        std::env::set_var("MDCHAT_EXPORT_FORMAT", "TEXT");
        std::env::set_var("MDCHAT_AUTH_FILE", "/tmp/mdchat-auth");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("MDCHAT_TIMEOUT_SECONDS");
        std::env::remove_var("MDCHAT_EXPORT_FORMAT");
        std::env::remove_var("MDCHAT_AUTH_FILE");

        assert_eq!(config.backend.timeout_seconds, 15);
        assert_eq!(config.export.format, ExportFormat::Text);
        assert_eq!(config.storage.auth_file.as_deref(), Some("/tmp/mdchat-auth"));
    }

    #[test]
    #[serial_test::serial]
    fn test_apply_env_vars_ignores_invalid_timeout() {
        std::env::set_var("MDCHAT_TIMEOUT_SECONDS", "soon");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("MDCHAT_TIMEOUT_SECONDS");

        assert_eq!(config.backend.timeout_seconds, 120);
    }
}
