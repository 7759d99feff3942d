use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationErrors;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{}", .0.summary())]
    Validation(ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    /// A domain rule refused the operation; nothing was changed.
    #[error("{0}")]
    Constraint(String),

    /// The store rejected a write (unique or foreign key violation).
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("Your email address is not verified.")]
    Unverified,

    #[error("database error: {0}")]
    Database(DbErr),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg))
            | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => AppError::Integrity(msg),
            _ => match err {
                DbErr::RecordNotFound(msg) => AppError::NotFound(msg),
                other => AppError::Database(other),
            },
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                let body = Json(json!({
                    "message": errors.summary(),
                    "errors": errors,
                }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            AppError::Unauthenticated | AppError::Unverified => {
                let status = match self {
                    AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
                    _ => StatusCode::FORBIDDEN,
                };
                (status, Json(json!({ "message": self.to_string() }))).into_response()
            }
            AppError::NotFound(_) => error_body(StatusCode::NOT_FOUND, self.to_string()),
            AppError::Constraint(_) => error_body(StatusCode::CONFLICT, self.to_string()),
            AppError::Integrity(ref detail) => {
                tracing::error!(%detail, "store rejected write");
                error_body(StatusCode::CONFLICT, GENERIC_WRITE_FAILURE.to_string())
            }
            AppError::Database(ref err) => {
                tracing::error!(error = %err, "database failure");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server Error".to_string(),
                )
            }
        }
    }
}

/// User-facing text for writes the store refused.
pub const GENERIC_WRITE_FAILURE: &str = "The record could not be saved. Please try again.";

fn error_body(status: StatusCode, message: String) -> Response {
    let body = Json(json!({
        "error": message,
        "status": status.as_u16(),
    }));
    (status, body).into_response()
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
