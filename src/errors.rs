use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Error taxonomy for the donation workflows.
///
/// `Validation`, `PermissionDenied`, `Precondition`, `NotFound` and
/// `Conflict` are business outcomes reported to the caller; the remaining
/// variants are infrastructure failures surfaced as 500s. No operation is
/// retried — an error aborts only the request that raised it.
#[derive(Debug)]
pub enum AppError {
    Db(rusqlite::Error),
    Pool(r2d2::Error),
    Session(String),
    Hash(String),
    Validation(Vec<String>),
    PermissionDenied(String),
    Precondition(String),
    Conflict(String),
    NotFound,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Pool(e) => write!(f, "Pool error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join("; ")),
            AppError::PermissionDenied(msg) => write!(f, "Permission denied: {msg}"),
            AppError::Precondition(msg) => write!(f, "Precondition failed: {msg}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(errors) => HttpResponse::BadRequest().json(json!({
                "error": "validation",
                "details": errors,
            })),
            AppError::PermissionDenied(msg) => HttpResponse::Forbidden().json(json!({
                "error": "permission_denied",
                "detail": msg,
            })),
            AppError::Precondition(msg) => HttpResponse::Conflict().json(json!({
                "error": "precondition",
                "detail": msg,
            })),
            AppError::Conflict(msg) => HttpResponse::Conflict().json(json!({
                "error": "conflict",
                "detail": msg,
            })),
            AppError::NotFound => HttpResponse::NotFound().json(json!({
                "error": "not_found",
            })),
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError().json(json!({
                    "error": "internal",
                }))
            }
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Db(other),
        }
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Pool(e)
    }
}
