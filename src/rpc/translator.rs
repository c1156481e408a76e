use actix_web::http::StatusCode;
use thiserror::Error;
use tracing::warn;

use super::status::{RpcCode, RpcStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    ResourceNotFound,
    InternalError,
    BadRequest,
    ServiceUnavailable,
    UnknownError,
}

impl FailureCategory {
    pub fn status_code(self) -> StatusCode {
        match self {
            FailureCategory::ResourceNotFound => StatusCode::NOT_FOUND,
            FailureCategory::BadRequest => StatusCode::BAD_REQUEST,
            FailureCategory::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            FailureCategory::InternalError | FailureCategory::UnknownError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// What the caller is told about a failed backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CallerFailure {
    pub category: FailureCategory,
    pub message: String,
}

/// Maps a user-service failure onto the caller-facing categories.
///
/// Only `NOT_FOUND` messages reach the caller as-is; every other message is
/// replaced and logged here instead.
pub fn translate(status: &RpcStatus) -> CallerFailure {
    let (category, message) = match status.code {
        RpcCode::NotFound => (FailureCategory::ResourceNotFound, status.message.clone()),
        RpcCode::Internal => (FailureCategory::InternalError, "internal error".to_string()),
        RpcCode::InvalidArgument => (FailureCategory::BadRequest, "invalid parameters".to_string()),
        RpcCode::Unavailable => (
            FailureCategory::ServiceUnavailable,
            "user service unavailable".to_string(),
        ),
        other => (FailureCategory::UnknownError, format!("unknown error: {}", other)),
    };

    if category != FailureCategory::ResourceNotFound {
        warn!(code = %status.code, detail = %status.message, "user service call failed");
    }

    CallerFailure { category, message }
}

impl From<RpcStatus> for CallerFailure {
    fn from(status: RpcStatus) -> Self {
        translate(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_passes_message_through() {
        let failure = translate(&RpcStatus::new(RpcCode::NotFound, "user 7 does not exist"));
        assert_eq!(failure.category, FailureCategory::ResourceNotFound);
        assert_eq!(failure.message, "user 7 does not exist");
        assert_eq!(failure.category.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let failure = translate(&RpcStatus::new(RpcCode::Internal, "db at 10.0.0.3 refused"));
        assert_eq!(failure.category, FailureCategory::InternalError);
        assert_eq!(failure.message, "internal error");
    }

    #[test]
    fn test_invalid_argument_and_unavailable() {
        let failure = translate(&RpcStatus::new(RpcCode::InvalidArgument, "mobile too long"));
        assert_eq!(failure.category, FailureCategory::BadRequest);
        assert_eq!(failure.message, "invalid parameters");

        let failure = translate(&RpcStatus::new(RpcCode::Unavailable, "no endpoints"));
        assert_eq!(failure.category, FailureCategory::ServiceUnavailable);
        assert_eq!(failure.message, "user service unavailable");
        assert_eq!(failure.category.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_every_code_maps_to_one_category() {
        for value in -1..=20 {
            let code = RpcCode::from_i32(value);
            let failure = translate(&RpcStatus::new(code, "detail"));
            let expected = match code {
                RpcCode::NotFound => FailureCategory::ResourceNotFound,
                RpcCode::Internal => FailureCategory::InternalError,
                RpcCode::InvalidArgument => FailureCategory::BadRequest,
                RpcCode::Unavailable => FailureCategory::ServiceUnavailable,
                _ => FailureCategory::UnknownError,
            };
            assert_eq!(failure.category, expected, "code {}", value);
        }
    }

    #[test]
    fn test_unknown_codes_name_the_code() {
        let failure = translate(&RpcStatus::new(RpcCode::AlreadyExists, "mobile taken"));
        assert_eq!(failure.category, FailureCategory::UnknownError);
        assert_eq!(failure.message, "unknown error: ALREADY_EXISTS");

        let failure = translate(&RpcStatus::new(RpcCode::Unrecognized(77), ""));
        assert_eq!(failure.message, "unknown error: CODE(77)");
    }
}
