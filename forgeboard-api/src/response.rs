/// JSON response envelope
///
/// Every endpoint returns `{ success, message?, data?, pagination? }` on
/// success; error responses use the mirror shape in `error::ErrorResponse`.
///
/// # Example
///
/// ```
/// use forgeboard_api::response::ApiResponse;
/// use serde_json::json;
///
/// let body = ApiResponse::new(json!({ "id": 1 }));
/// let created = ApiResponse::with_message(json!({ "id": 1 }), "Project created");
/// # let _ = (body, created);
/// ```

use axum::Json;
use serde::{Deserialize, Serialize};

/// Success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Always true for this shape
    pub success: bool,

    /// Optional human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Present on paginated list responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    /// Wraps a payload in the success envelope
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: None,
        }
    }

    /// Wraps a payload with a message
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            pagination: None,
        }
    }

    /// Wraps a page of results with pagination metadata
    pub fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: Some(pagination),
        }
    }

    /// A bare success with no payload
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            pagination: None,
        }
    }

    /// Convenience wrapper into an axum JSON body
    pub fn json(self) -> Json<Self> {
        Json(self)
    }
}

/// Pagination metadata for list responses
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// Builds metadata from a 1-based page, page size, and total count
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Pagination query parameters, shared by list endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    /// Clamps to a 1-based page and a 1..=100 page size
    pub fn clamp(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page)
    }

    /// SQL limit/offset for the clamped page
    pub fn limit_offset(&self) -> (i64, i64) {
        let (page, per_page) = self.clamp();
        (per_page, (page - 1) * per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);

        let p = Pagination::new(1, 20, 20);
        assert_eq!(p.total_pages, 1);

        let p = Pagination::new(2, 20, 21);
        assert_eq!(p.total_pages, 2);

        let p = Pagination::new(1, 7, 50);
        assert_eq!(p.total_pages, 8);
    }

    #[test]
    fn test_page_query_clamping() {
        let q = PageQuery {
            page: None,
            per_page: None,
        };
        assert_eq!(q.clamp(), (1, 20));
        assert_eq!(q.limit_offset(), (20, 0));

        let q = PageQuery {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(q.clamp(), (1, 100));

        let q = PageQuery {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(q.limit_offset(), (10, 20));
    }

    #[test]
    fn test_envelope_shape() {
        let body = ApiResponse::with_message(json!({ "id": 7 }), "Created");
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Created");
        assert_eq!(value["data"]["id"], 7);
        assert!(value.get("pagination").is_none());
    }

    #[test]
    fn test_message_only_omits_data() {
        let body: ApiResponse<serde_json::Value> = ApiResponse::message_only("Deleted");
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["success"], true);
        assert!(value.get("data").is_none());
    }
}
