//! Response envelopes returned by the Balance REST API

use serde::{Deserialize, Serialize};

/// Generic command envelope (`{ success, message, data, errors }`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T = serde_json::Value> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl<T> ApiResponse<T> {
    /// Successful envelope carrying only a message, used for locally
    /// acknowledged commands while the backend feature is unavailable.
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self { data: None, message: Some(message.into()), success: true, errors: Vec::new() }
    }
}

/// One page of a server-side paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub page_size: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> PaginatedResponse<T> {
    /// First page of an empty listing
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            total_pages: 0,
            current_page: 1,
            page_size,
            has_next_page: false,
            has_previous_page: false,
        }
    }
}
