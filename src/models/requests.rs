//! Request DTOs for the demo API
//!
//! Defines the structure of incoming query strings and bodies.

use serde::Deserialize;

/// Maximum allowed item name length in bytes
pub const MAX_NAME_LENGTH: usize = 128;

/// Query string for `GET /items`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListItemsQuery {
    /// 1-based page number
    #[serde(default)]
    pub page: Option<usize>,
}

impl ListItemsQuery {
    /// Page number, clamped to at least 1.
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }
}

/// Request body for `POST /items`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemRequest {
    /// Display name of the new item
    pub name: String,
}

impl CreateItemRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("Name cannot be empty".to_string());
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Some(format!(
                "Name exceeds maximum length of {} characters",
                MAX_NAME_LENGTH
            ));
        }
        None
    }
}
