use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::household::MembershipError;
use crate::models::ErrorResponse;
use crate::services::{AuthError, EmailError, PostgresError};

/// Error returned by every API handler, rendered as `{error, message, status_code}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidPayload(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(PostgresError),

    #[error("Email error: {0}")]
    Email(#[from] EmailError),
}

impl ApiError {
    pub fn no_household() -> Self {
        ApiError::NotFound("No household found for this user. Create or join a household first.".to_string())
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::InvalidPayload(_) => "invalid_payload",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Database(_) => "database_error",
            ApiError::Email(_) => "email_error",
        }
    }
}

impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::UnknownMember(_) => ApiError::NotFound(err.to_string()),
            _ if err.is_authorization() => ApiError::Forbidden(err.to_string()),
            _ => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<PostgresError> for ApiError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::NotFound(what) => ApiError::NotFound(format!("Not found: {}", what)),
            PostgresError::Conflict(message) => ApiError::Conflict(message),
            PostgresError::Membership(m) => m.into(),
            other => ApiError::Database(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Email(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::InvalidPayload(format!("Invalid JSON: {}", err)).into()
}

/// Handle query string errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query string error on {}: {}", req.path(), err);
    ApiError::InvalidPayload(format!("Invalid query: {}", err)).into()
}

/// Handle path segment errors, e.g. a malformed id
pub fn handle_path_error(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Path error on {}: {}", req.path(), err);
    ApiError::InvalidPayload(format!("Invalid path: {}", err)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_membership_error_status() {
        let forbidden = ApiError::from(MembershipError::NotOwner("invite users"));
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let conflict = ApiError::from(MembershipError::OwnerLimit);
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(conflict.to_string(), "Maximum 2 owners per household");

        let missing = ApiError::from(MembershipError::UnknownMember(Uuid::nil()));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_postgres_error_status() {
        let missing = ApiError::from(PostgresError::NotFound("house 1".into()));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let wrapped = ApiError::from(PostgresError::Membership(MembershipError::SoleOwner));
        assert_eq!(wrapped.status_code(), StatusCode::CONFLICT);

        let invalid = ApiError::from(PostgresError::InvalidData("rating 9".into()));
        assert_eq!(invalid.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unauthorized_status() {
        let err = ApiError::from(AuthError::MissingToken);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
