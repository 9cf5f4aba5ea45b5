use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use spreadlove_types::api::PendingMessageResponse;

use crate::auth::{AppState, with_db};
use crate::error::{ApiError, ApiResult};
use crate::messages::created_at_or_epoch;
use crate::moderation;

/// GET /api/admin/pending: the review queue, oldest first.
pub async fn list_pending(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PendingMessageResponse>>> {
    let rows = with_db(&state, |db| Ok(db.list_pending()?)).await?;

    let pending = rows
        .into_iter()
        .map(|row| PendingMessageResponse {
            created_at: created_at_or_epoch(&row.created_at, row.id),
            id: row.id,
            content: row.content,
            status: row.status,
        })
        .collect();

    Ok(Json(pending))
}

/// POST /api/admin/approve/{id}
pub async fn approve_message(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: i64 = raw_id.parse().map_err(|_| ApiError::InvalidId(raw_id))?;

    with_db(&state, move |db| Ok(moderation::approve(db, id)?)).await?;

    Ok(StatusCode::OK)
}
