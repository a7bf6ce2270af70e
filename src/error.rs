//! Error types for MDChat
//!
//! This module defines the error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for MDChat operations
///
/// Backend failures are either [`MdChatError::Http`] (the request never
/// completed) or [`MdChatError::Network`] (non-success status, undecodable
/// body). [`MdChatError::is_network`] covers both.
#[derive(Error, Debug)]
pub enum MdChatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A backend call returned a non-success status or an undecodable body
    #[error("Network error: {0}")]
    Network(String),

    /// Transcript export errors (layout or document rendering)
    #[error("Export error: {0}")]
    Export(String),

    /// Local state storage errors (the logged-in flag)
    #[error("Storage error: {0}")]
    Storage(String),

    /// The backend could not be reached at all
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),
}

impl MdChatError {
    /// Returns true for failures raised by the backend boundary
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http(_))
    }
}

/// Result type alias for MDChat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
