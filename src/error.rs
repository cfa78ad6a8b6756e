//! Error taxonomy shared by the query, policy, and handler layers.
//!
//! Validation failures surface field-level messages to the client;
//! authorization failures carry nothing beyond the status code; storage
//! failures are logged server-side and never leak detail.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;

/// Failure modes exposed by the API.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range field value; maps to 400.
    #[error("{message}")]
    InvalidInput {
        /// Payload field the message refers to.
        field: &'static str,
        /// Human-readable explanation.
        message: String,
    },
    /// Bearer token missing or unverifiable; maps to 401.
    #[error("authentication credentials were not provided or are invalid")]
    Unauthenticated,
    /// Authenticated but lacking the required role or ownership; maps to 403.
    #[error("you do not have permission to perform this action")]
    Forbidden,
    /// Referenced entity absent; maps to 404.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Uniqueness violation; maps to 400 (validation-style, not 409).
    #[error("{message}")]
    Conflict {
        /// Field or constraint the conflict concerns.
        field: &'static str,
        /// Human-readable explanation.
        message: String,
    },
    /// Underlying storage failure; maps to 500.
    #[error(transparent)]
    Database(#[from] DieselError),
    /// Connection pool failure; maps to 500.
    #[error("connection pool error: {0}")]
    Pool(String),
}

impl Error {
    /// Shorthand for a field-level validation failure.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a uniqueness conflict.
    pub fn conflict(field: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            field,
            message: message.into(),
        }
    }

    /// Re-map a storage unique-violation into a [`Error::Conflict`].
    ///
    /// The storage constraint is the authoritative backstop for uniqueness
    /// invariants; this turns its raw error into the same shape as the
    /// handler-level pre-check.
    #[must_use]
    pub fn or_conflict(self, field: &'static str, message: &str) -> Self {
        match self {
            Self::Database(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _,
            )) => Self::conflict(field, message),
            other => other,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidInput { field, message } | Self::Conflict { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ field: [message] })),
            )
                .into_response(),
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": self.to_string() })),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "detail": self.to_string() })),
            )
                .into_response(),
            Self::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": self.to_string() })),
            )
                .into_response(),
            Self::Database(DieselError::NotFound) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "not found" })),
            )
                .into_response(),
            Self::Database(_) | Self::Pool(_) => {
                tracing::error!(error = %self, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Convenience alias used throughout the handler and query layers.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rstest::rstest;

    use super::Error;

    #[rstest]
    #[case(Error::invalid("year", "in the future"), StatusCode::BAD_REQUEST)]
    #[case(Error::conflict("username", "taken"), StatusCode::BAD_REQUEST)]
    #[case(Error::Unauthenticated, StatusCode::UNAUTHORIZED)]
    #[case(Error::Forbidden, StatusCode::FORBIDDEN)]
    #[case(Error::NotFound("title"), StatusCode::NOT_FOUND)]
    fn maps_to_expected_status(#[case] err: Error, #[case] expected: StatusCode) {
        assert_eq!(err.into_response().status(), expected);
    }

    #[rstest]
    fn unique_violation_becomes_conflict() {
        let db = Error::Database(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("UNIQUE constraint failed".to_owned()),
        ));
        let mapped = db.or_conflict("review", "one review per title per author");
        assert!(matches!(mapped, Error::Conflict { field: "review", .. }));
    }

    #[rstest]
    fn other_database_errors_pass_through() {
        let db = Error::Database(diesel::result::Error::RollbackTransaction);
        assert!(matches!(
            db.or_conflict("review", "unused"),
            Error::Database(_)
        ));
    }
}
