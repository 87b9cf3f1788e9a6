use thiserror::Error;

use crate::rules::RuleViolation;

/// Every procedure fails with one of these. Messages on the first four are
/// shown to the caller; `Internal` carries only a generic message.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("internal server error")]
    Internal(#[source] sqlx::Error),
}

impl ServiceError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{what} {id} not found"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ServiceError::BadRequest(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::BadRequest(_) => "BAD_REQUEST",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::Unauthorized(_) => "UNAUTHORIZED",
            ServiceError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::BadRequest(_) => 400,
            ServiceError::Forbidden(_) => 403,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Internal(_) => 500,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "store operation failed");
        ServiceError::Internal(err)
    }
}

impl From<RuleViolation> for ServiceError {
    fn from(v: RuleViolation) -> Self {
        ServiceError::BadRequest(v.0)
    }
}

/// Shorthand for range checks on procedure inputs.
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), ServiceError> {
    if condition {
        Ok(())
    } else {
        Err(ServiceError::BadRequest(message()))
    }
}
