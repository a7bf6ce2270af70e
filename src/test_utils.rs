//! Test utilities for MDChat
//!
//! This module provides common test utilities including temporary directory
//! management, test file creation, and message builders.

use crate::session::{Message, Role};
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Arguments
///
/// * `dir` - Directory to create the file in
/// * `name` - Name of the file
/// * `content` - Content to write to the file
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
backend:
  base_url: http://localhost:8000
  timeout_seconds: 5

export:
  format: text
"#
    .to_string()
}

/// Build a message with a predictable id
pub fn message(id: &str, role: Role, content: &str) -> Message {
    Message {
        id: id.to_string(),
        role,
        content: content.to_string(),
        timestamp: None,
    }
}

/// Build a user message with a predictable id
pub fn user_message(id: &str, content: &str) -> Message {
    message(id, Role::User, content)
}

/// Build an assistant message with a predictable id
pub fn assistant_message(id: &str, content: &str) -> Message {
    message(id, Role::Assistant, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "hello");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }

    #[test]
    fn test_test_config_yaml_parses() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.backend.timeout_seconds, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_message_builders() {
        let msg = user_message("1", "hi");
        assert_eq!(msg.role, Role::User);
        let msg = assistant_message("2", "hello");
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.timestamp.is_none());
    }
}
