//! Error types for the marketplace service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Message shown to users instead of internal failure details
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Errors produced by the identity and listing stores
#[derive(Error, Debug)]
pub enum MarketError {
    /// Missing, malformed or mismatched form input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A unique field (username, email) is already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    Auth,

    /// No record with the requested identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// The session user may not modify this record
    #[error("Forbidden")]
    Forbidden,

    /// Transaction or commit failure in a backing store
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A page could not be rendered
    #[error("Template error: {0}")]
    Template(String),
}

impl MarketError {
    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            MarketError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketError::Conflict(_) => StatusCode::CONFLICT,
            MarketError::Auth => StatusCode::UNAUTHORIZED,
            MarketError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketError::Forbidden => StatusCode::FORBIDDEN,
            MarketError::Persistence(_) | MarketError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text that is safe to show to the user
    pub fn user_message(&self) -> String {
        match self {
            MarketError::Validation(msg) | MarketError::Conflict(msg) => msg.clone(),
            MarketError::Auth => "Invalid username or password".to_string(),
            MarketError::NotFound(_) => "Page not found".to_string(),
            MarketError::Forbidden => "You are not allowed to change this listing".to_string(),
            MarketError::Persistence(_) | MarketError::Template(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

impl From<sqlx::Error> for MarketError {
    fn from(err: sqlx::Error) -> Self {
        MarketError::Persistence(err.to_string())
    }
}

impl From<tera::Error> for MarketError {
    fn from(err: tera::Error) -> Self {
        MarketError::Template(format!("{:?}", err))
    }
}

/// Marker attached to error responses so the error-page middleware can
/// render them as HTML.
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        if matches!(
            self,
            MarketError::Persistence(_) | MarketError::Template(_)
        ) {
            error!("Request failed: {}", self);
        }

        let status = self.status();
        let message = self.user_message();

        let mut response = (status, message.clone()).into_response();
        response
            .extensions_mut()
            .insert(ErrorPage { status, message });
        response
    }
}

/// Type alias for marketplace results
pub type MarketResult<T> = Result<T, MarketError>;
