use spreadlove_db::Database;
use spreadlove_db::models::MessageRow;
use spreadlove_db::queries::{insert_message, query_pending, set_pending_status};
use spreadlove_types::models::PendingStatus;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("pending message {0} not found")]
    NotFound(i64),

    #[error("pending message {id} is already {status}")]
    InvalidState { id: i64, status: PendingStatus },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

enum Transition<T> {
    Done(T),
    NotFound,
    AlreadyFinal(PendingStatus),
}

/// Publish a pending message.
///
/// The status flip and the Message insert commit in one IMMEDIATE
/// transaction, and the flip is conditional on the row still being
/// `pending`. Of any number of concurrent callers for the same id, exactly
/// one gets the new Message; the rest see `InvalidState`.
pub fn approve(db: &Database, id: i64) -> Result<MessageRow, ModerationError> {
    let outcome = db.with_tx(|tx| {
        let Some(pending) = query_pending(tx, id)? else {
            return Ok(Transition::NotFound);
        };
        if pending.status.is_terminal() {
            return Ok(Transition::AlreadyFinal(pending.status));
        }
        if !set_pending_status(tx, id, PendingStatus::Approved)? {
            return Ok(Transition::AlreadyFinal(pending.status));
        }

        let message = insert_message(tx, Some(pending.id), &pending.content)?;
        Ok(Transition::Done(message))
    })?;

    let message = finish(id, outcome)?;
    info!("Approved pending message {} as message {}", id, message.id);
    Ok(message)
}

/// Mark a pending message as rejected. Nothing is published.
pub fn reject(db: &Database, id: i64) -> Result<(), ModerationError> {
    let outcome = db.with_tx(|tx| {
        let Some(pending) = query_pending(tx, id)? else {
            return Ok(Transition::NotFound);
        };
        if pending.status.is_terminal() || !set_pending_status(tx, id, PendingStatus::Rejected)? {
            return Ok(Transition::AlreadyFinal(pending.status));
        }
        Ok(Transition::Done(()))
    })?;

    finish(id, outcome)?;
    info!("Rejected pending message {}", id);
    Ok(())
}

fn finish<T>(id: i64, outcome: Transition<T>) -> Result<T, ModerationError> {
    match outcome {
        Transition::Done(value) => Ok(value),
        Transition::NotFound => Err(ModerationError::NotFound(id)),
        Transition::AlreadyFinal(status) => Err(ModerationError::InvalidState { id, status }),
    }
}
