//! API error responses
//!
//! Every failure is returned as `{detail}` with a matching status code.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// HTTP error with a status and a user-facing detail
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

/// `Json` extractor whose rejections are answered as `{detail}`
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<mercato_core::Error> for ApiError {
    fn from(e: mercato_core::Error) -> Self {
        match e {
            mercato_core::Error::NotFound(what) => {
                Self::not_found(format!("{what} not found"))
            }
            other => {
                error!(error = %other, "Request failed");
                Self::internal()
            }
        }
    }
}

impl From<mercato_report::Error> for ApiError {
    fn from(e: mercato_report::Error) -> Self {
        match e {
            mercato_report::Error::InvalidName(name) => {
                Self::bad_request(format!("Invalid report id: {name}"))
            }
            mercato_report::Error::NotFound(name) => {
                Self::not_found(format!("Report not found: {name}"))
            }
            other => {
                error!(error = %other, "Report lookup failed");
                Self::internal()
            }
        }
    }
}
