/// Response envelope
///
/// Every successful response is wrapped as `{"success": true, "data": ...}`,
/// list responses additionally carry `"count"`. Errors use the mirror shape
/// `{"success": false, "error": "..."}` built in [`crate::error`].

use serde::Serialize;

/// Success envelope for a single resource or document
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Always true on the success path
    pub success: bool,

    /// Number of items, present on list responses only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// The payload
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps a single resource
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Wraps a list, recording its length as `count`
    pub fn list(items: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(items.len()),
            data: items,
        }
    }
}

/// Empty success payload, used by delete endpoints
///
/// Serializes as `{"success": true, "data": {}}`.
pub fn empty() -> ApiResponse<serde_json::Value> {
    ApiResponse::new(serde_json::json!({}))
}
