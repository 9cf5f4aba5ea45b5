use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PendingStatus;

// -- Public --

/// Form body of `POST /api/message`.
#[derive(Debug, Deserialize)]
pub struct SubmitMessageForm {
    #[serde(default)]
    pub content: String,
}

/// An approved message as served by `GET /api/message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// -- Admin --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMessageResponse {
    pub id: i64,
    pub content: String,
    pub status: PendingStatus,
    pub created_at: DateTime<Utc>,
}
