use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bujo_core::{DbError, RepoError, ServiceError};
use log::error;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by route handlers and filters.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    /// No acting user could be resolved.
    Unauthenticated,
    /// Request is well-formed JSON but semantically unusable.
    BadRequest(String),
    /// An extractor could not read the body, query or path.
    Rejected { status: StatusCode, message: String },
    /// Failure outside the journal domain. Detail is logged, not returned.
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => service_status(err),
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Service(err) => service_code(err),
            Self::Unauthenticated => "unauthenticated",
            Self::BadRequest(_) => "bad_request",
            Self::Rejected { .. } => "invalid_request",
            Self::Internal(_) => "internal",
        }
    }
}

fn service_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::InvalidContent(_)
        | ServiceError::InvalidName(_)
        | ServiceError::InvalidEmail(_)
        | ServiceError::EmptyUpdate
        | ServiceError::InvalidOrder(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::ScopeNotFound(_)
        | ServiceError::CollectionNotFound(_)
        | ServiceError::BulletNotFound(_)
        | ServiceError::UserNotFound(_)
        | ServiceError::MemberNotFound { .. } => StatusCode::NOT_FOUND,
        ServiceError::AlreadyMember { .. }
        | ServiceError::CannotShareWithOwner(_)
        | ServiceError::EmailTaken(_) => StatusCode::CONFLICT,
        ServiceError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        ServiceError::Repo(RepoError::Db(db)) if db.is_busy() => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Repo(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn service_code(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::InvalidContent(_) => "invalid_content",
        ServiceError::InvalidName(_) => "invalid_name",
        ServiceError::InvalidEmail(_) => "invalid_email",
        ServiceError::EmptyUpdate => "empty_update",
        ServiceError::InvalidOrder(_) => "invalid_order",
        ServiceError::ScopeNotFound(_) => "scope_not_found",
        ServiceError::CollectionNotFound(_) => "collection_not_found",
        ServiceError::BulletNotFound(_) => "bullet_not_found",
        ServiceError::UserNotFound(_) => "user_not_found",
        ServiceError::MemberNotFound { .. } => "member_not_found",
        ServiceError::AlreadyMember { .. } => "already_member",
        ServiceError::CannotShareWithOwner(_) => "cannot_share_with_owner",
        ServiceError::EmailTaken(_) => "email_taken",
        ServiceError::Unauthorized { .. } => "unauthorized",
        ServiceError::Repo(RepoError::Db(db)) if db.is_busy() => "store_busy",
        ServiceError::Repo(_) => "store_failure",
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::Unauthenticated => write!(f, "request carries no known user"),
            Self::BadRequest(message) => write!(f, "{message}"),
            Self::Rejected { message, .. } => write!(f, "{message}"),
            Self::Internal(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        Self::Service(ServiceError::Repo(value.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(
                "event=request_failed module=http status=error error_code={} error={self}",
                self.code()
            );
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error: self.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
