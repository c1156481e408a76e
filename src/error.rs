use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

use crate::auth::{RefreshError, VerifyError};
use crate::rpc::CallerFailure;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("{0}")]
    Upstream(#[from] CallerFailure),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

// Token encoding only fails on a broken key or claims type, never on client input.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::InternalError(format!("token encoding failed: {}", err))
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            AppError::AuthError(e) => e.to_string(),
            AppError::Upstream(failure) => failure.message.clone(),
            // Never echo configuration or internal detail to the caller.
            AppError::ConfigError(_) | AppError::InternalError(_) => "internal error".to_string(),
            AppError::ValidationError(msg) => msg.clone(),
        };
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": message
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::Unauthenticated
                | AuthError::NotLoggedIn
                | AuthError::SessionExpired
                | AuthError::InvalidCredentials
                | AuthError::RefreshRejected(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCode => StatusCode::BAD_REQUEST,
            },
            AppError::Upstream(failure) => failure.category.status_code(),
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Caller-facing authentication outcomes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token was presented at all.
    #[error("please log in")]
    Unauthenticated,

    /// A token was presented but is malformed, forged, revoked or not yet active.
    #[error("not logged in")]
    NotLoggedIn,

    #[error("session expired")]
    SessionExpired,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid verification code")]
    InvalidCode,

    #[error("refresh rejected: {0}")]
    RefreshRejected(RefreshError),
}

impl From<VerifyError> for AuthError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Expired => AuthError::SessionExpired,
            VerifyError::Malformed | VerifyError::Invalid | VerifyError::NotYetValid => {
                AuthError::NotLoggedIn
            }
        }
    }
}

// A failed re-sign is a server fault; every other refusal is the caller's token.
impl From<RefreshError> for AppError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Signing => AppError::InternalError(err.to_string()),
            other => AppError::AuthError(AuthError::RefreshRejected(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{translate, RpcCode, RpcStatus};
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::InternalError(_)));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_verify_errors_map_to_gate_outcomes() {
        assert_eq!(AuthError::from(VerifyError::Expired), AuthError::SessionExpired);
        assert_eq!(AuthError::from(VerifyError::Malformed), AuthError::NotLoggedIn);
        assert_eq!(AuthError::from(VerifyError::Invalid), AuthError::NotLoggedIn);
        assert_eq!(AuthError::from(VerifyError::NotYetValid), AuthError::NotLoggedIn);
    }

    #[test]
    fn test_error_status_codes() {
        let err = AppError::AuthError(AuthError::Unauthenticated);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = AppError::AuthError(AuthError::SessionExpired);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = AppError::AuthError(AuthError::InvalidCode);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::ValidationError("invalid input".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: AppError = translate(&RpcStatus::new(RpcCode::NotFound, "no such user")).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_refresh_errors_split_client_and_server_faults() {
        let err = AppError::from(RefreshError::Signing);
        assert!(matches!(err, AppError::InternalError(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        for refusal in [
            RefreshError::GraceElapsed,
            RefreshError::LifetimeExceeded,
            RefreshError::Rejected(VerifyError::Invalid),
        ] {
            let err = AppError::from(refusal.clone());
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert!(matches!(err, AppError::AuthError(AuthError::RefreshRejected(r)) if r == refusal));
        }
    }

    #[test]
    fn test_error_display() {
        let err = AppError::ValidationError("test error".to_string());
        assert_eq!(err.to_string(), "Validation error: test error");

        let err = AppError::AuthError(AuthError::SessionExpired);
        assert_eq!(err.to_string(), "Authentication error: session expired");
    }

    #[actix_web::test]
    async fn test_internal_detail_is_not_returned() {
        let err = AppError::InternalError("connection string postgres://secret".to_string());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "internal error");
        assert_eq!(json["error"]["status"], 500);
    }
}
