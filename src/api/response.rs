//! Response envelope and error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::FintrackError;

/// Envelope for every API response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// A handler result
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap `data` in a success envelope
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// A success envelope with `201 Created`
pub fn created<T: Serialize>(data: T) -> Result<(StatusCode, Json<ApiResponse<T>>), ApiError> {
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(data))))
}

/// An error that renders as an envelope with a matching status code
#[derive(Debug)]
pub struct ApiError(pub FintrackError);

impl From<FintrackError> for ApiError {
    fn from(err: FintrackError) -> Self {
        Self(err)
    }
}

#[must_use]
pub fn error_status(err: &FintrackError) -> StatusCode {
    match err {
        FintrackError::Validation(_) => StatusCode::BAD_REQUEST,
        FintrackError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        FintrackError::Forbidden(_) => StatusCode::FORBIDDEN,
        FintrackError::NotFound { .. } => StatusCode::NOT_FOUND,
        FintrackError::Duplicate { .. } => StatusCode::CONFLICT,
        FintrackError::InsufficientFunds { .. }
        | FintrackError::Budget(_)
        | FintrackError::Family(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = error_status(&self.0);
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ApiResponse::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&FintrackError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&FintrackError::Unauthorized("no".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            error_status(&FintrackError::goal_not_found("x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&FintrackError::InsufficientFunds {
                budget: "Food".into(),
                needed: 100,
                available: 50,
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            error_status(&FintrackError::Storage("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::ok(42)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 42);
        assert!(json.get("error").is_none());

        let json = serde_json::to_value(ApiResponse::error("nope")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "nope");
    }
}
