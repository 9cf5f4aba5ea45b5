use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use spreadlove_types::models::{ContentError, PendingStatus};
use thiserror::Error;
use tracing::error;

use crate::moderation::ModerationError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure a request can end in. Clients only ever see the status code
/// and a short generic message; details stay in the logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid content: {0}")]
    Validation(#[from] ContentError),

    #[error("malformed form body")]
    MalformedForm,

    #[error("invalid message id: {0}")]
    InvalidId(String),

    #[error("message {0} not found")]
    NotFound(i64),

    #[error("message {id} is already {status}")]
    InvalidState { id: i64, status: PendingStatus },

    #[error("missing or invalid admin credentials")]
    Unauthorized,

    #[error("no approved messages yet")]
    NoContent,

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedForm | ApiError::InvalidId(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) | ApiError::NoContent => StatusCode::NOT_FOUND,
            ApiError::InvalidState { .. } => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> &'static str {
        match self {
            ApiError::Validation(ContentError::Empty) => "Message content cannot be empty",
            ApiError::Validation(ContentError::TooLong { .. }) => "Message content is too long",
            ApiError::MalformedForm => "Failed to parse form",
            ApiError::InvalidId(_) => "Invalid message ID",
            ApiError::NotFound(_) => "Message not found",
            ApiError::InvalidState { .. } => "Message is not pending",
            ApiError::Unauthorized => "Unauthorized",
            ApiError::NoContent => "No messages yet",
            ApiError::Storage(_) => "Internal Server Error",
        }
    }
}

impl From<ModerationError> for ApiError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::NotFound(id) => ApiError::NotFound(id),
            ModerationError::InvalidState { id, status } => ApiError::InvalidState { id, status },
            ModerationError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(e) = &self {
            error!("Request failed: {:#}", e);
        }

        let status = self.status_code();
        let body = self.user_message();

        if matches!(self, ApiError::Unauthorized) {
            return (
                status,
                [(header::WWW_AUTHENTICATE, r#"Basic realm="spreadlove admin""#)],
                body,
            )
                .into_response();
        }

        (status, body).into_response()
    }
}
