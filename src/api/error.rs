use serde::Serialize;
use utoipa::ToSchema;

/// JSON error body returned by every endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
