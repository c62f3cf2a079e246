use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors that abort a request. Business-rule rejections are not errors,
/// see [`Outcome`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(e) => {
                error!(error = ?e, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "status": "fail", "message": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Result of a business operation: either a payload or a human readable
/// rejection reason. Rendered with HTTP 200 in both cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    Rejected(String),
}

impl<T> Outcome<T> {
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Done(v) => Outcome::Done(f(v)),
            Self::Rejected(r) => Outcome::Rejected(r),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
    Fail,
}

/// The `{status, message?, data?}` envelope the frontend expects.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: ApiStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            status: ApiStatus::Success,
            message: None,
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    pub fn ok() -> Self {
        Self {
            status: ApiStatus::Success,
            message: None,
            data: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Fail,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> From<Outcome<T>> for Envelope<T> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Done(data) => Self {
                status: ApiStatus::Success,
                message: None,
                data: Some(data),
            },
            Outcome::Rejected(reason) => Self {
                status: ApiStatus::Fail,
                message: Some(reason),
                data: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_outcome_serializes_as_fail_with_message() {
        let env: Envelope<i64> = Outcome::reject("date is blocked").into();
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json, json!({ "status": "fail", "message": "date is blocked" }));
    }

    #[test]
    fn done_outcome_carries_data() {
        let env: Envelope<Vec<i64>> = Outcome::Done(vec![1, 2]).into();
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json, json!({ "status": "success", "data": [1, 2] }));
    }

    #[test]
    fn internal_errors_hide_details() {
        let resp = AppError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }
}
