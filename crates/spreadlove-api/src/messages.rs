use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
    http::header,
    response::{IntoResponse, Redirect},
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use spreadlove_db::models::{MessageRow, parse_timestamp};
use spreadlove_types::api::{MessageResponse, SubmitMessageForm};
use spreadlove_types::models::MessageContent;

use crate::auth::{AppState, with_db};
use crate::error::{ApiError, ApiResult};

/// Sent with every random pick; each call is expected to differ.
const NO_STORE: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

/// POST /api/message: anonymous submission, queued for moderation.
pub async fn submit_message(
    State(state): State<AppState>,
    form: Result<Form<SubmitMessageForm>, FormRejection>,
) -> ApiResult<Redirect> {
    let Form(form) = form.map_err(|e| {
        warn!("Rejected submission body: {}", e);
        ApiError::MalformedForm
    })?;

    let content = MessageContent::parse(&form.content)?;
    let row = with_db(&state, move |db| Ok(db.create_pending(&content)?)).await?;

    info!("Queued pending message {}", row.id);
    Ok(Redirect::to("/"))
}

/// GET /api/message: one approved message picked uniformly at random.
pub async fn get_random_message(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let row = with_db(&state, |db| Ok(db.get_random_message()?))
        .await?
        .ok_or(ApiError::NoContent)?;

    Ok(([(header::CACHE_CONTROL, NO_STORE)], Json(message_response(row))))
}

pub(crate) fn message_response(row: MessageRow) -> MessageResponse {
    let created_at = created_at_or_epoch(&row.created_at, row.id);
    MessageResponse {
        id: row.id,
        content: row.content,
        created_at,
    }
}

pub(crate) fn created_at_or_epoch(raw: &str, id: i64) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!("Corrupt created_at '{}' on record {}", raw, id);
        DateTime::default()
    })
}
