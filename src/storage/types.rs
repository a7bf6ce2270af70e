use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contents of the logged-in flag file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthRecord {
    /// Whether the user is logged in
    pub logged_in: bool,
    /// When the flag was last written
    pub updated_at: DateTime<Utc>,
}

impl AuthRecord {
    /// Create a record stamped with the current time
    pub fn new(logged_in: bool) -> Self {
        Self {
            logged_in,
            updated_at: Utc::now(),
        }
    }
}
