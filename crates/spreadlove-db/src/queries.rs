use crate::Database;
use crate::models::{MessageRow, PendingMessageRow};
use anyhow::{Result, bail};
use rand::Rng;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use spreadlove_types::models::{MessageContent, PendingStatus};

/// Result of a status write on a pending message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Applied,
    NotFound,
    /// The record had already left `pending`; nothing was written.
    AlreadyFinal(PendingStatus),
}

impl Database {
    // -- Pending messages --

    pub fn create_pending(&self, content: &MessageContent) -> Result<PendingMessageRow> {
        self.with_conn_mut(|conn| insert_pending(conn, content))
    }

    pub fn get_pending(&self, id: i64) -> Result<Option<PendingMessageRow>> {
        self.with_conn(|conn| query_pending(conn, id))
    }

    /// Records still awaiting a decision, oldest first.
    pub fn list_pending(&self) -> Result<Vec<PendingMessageRow>> {
        self.with_conn(|conn| query_pending_list(conn, Some(PendingStatus::Pending)))
    }

    /// Every submission regardless of status, oldest first.
    pub fn list_pending_all(&self) -> Result<Vec<PendingMessageRow>> {
        self.with_conn(|conn| query_pending_list(conn, None))
    }

    pub fn count_pending(&self) -> Result<u64> {
        self.with_conn(count_pending)
    }

    /// Move a pending record to a terminal status. Only the first call for a
    /// given id can succeed; later calls report the status already reached.
    pub fn update_pending_status(&self, id: i64, status: PendingStatus) -> Result<StatusUpdate> {
        self.with_tx(|tx| {
            let Some(current) = query_pending(tx, id)? else {
                return Ok(StatusUpdate::NotFound);
            };
            if current.status.is_terminal() {
                return Ok(StatusUpdate::AlreadyFinal(current.status));
            }
            if set_pending_status(tx, id, status)? {
                Ok(StatusUpdate::Applied)
            } else {
                Ok(StatusUpdate::AlreadyFinal(current.status))
            }
        })
    }

    // -- Messages --

    pub fn create_message(&self, content: &MessageContent) -> Result<MessageRow> {
        self.with_conn_mut(|conn| insert_message(conn, None, content.as_str()))
    }

    /// Uniformly random approved message, or `None` when there are none.
    pub fn get_random_message(&self) -> Result<Option<MessageRow>> {
        self.with_conn(query_random_message)
    }

    pub fn count_messages(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |r| r.get(0))?;
            Ok(n as u64)
        })
    }
}

// The free functions below take a plain connection so callers can compose
// several of them inside one transaction.

pub fn insert_pending(conn: &Connection, content: &MessageContent) -> Result<PendingMessageRow> {
    let row = conn.query_row(
        "INSERT INTO pending_messages (content) VALUES (?1)
         RETURNING id, content, status, created_at",
        [content.as_str()],
        pending_from_row,
    )?;
    Ok(row)
}

pub fn query_pending(conn: &Connection, id: i64) -> Result<Option<PendingMessageRow>> {
    let mut stmt =
        conn.prepare("SELECT id, content, status, created_at FROM pending_messages WHERE id = ?1")?;
    let row = stmt.query_row([id], pending_from_row).optional()?;
    Ok(row)
}

pub fn query_pending_list(
    conn: &Connection,
    status: Option<PendingStatus>,
) -> Result<Vec<PendingMessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, content, status, created_at
         FROM pending_messages
         WHERE ?1 IS NULL OR status = ?1
         ORDER BY id ASC",
    )?;

    let rows = stmt
        .query_map([status.map(PendingStatus::as_str)], pending_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn count_pending(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pending_messages WHERE status = 'pending'",
        [],
        |r| r.get(0),
    )?;
    Ok(n as u64)
}

/// Conditional status write: only a row still in `pending` is changed.
/// Returns whether this call performed the transition.
pub fn set_pending_status(conn: &Connection, id: i64, status: PendingStatus) -> Result<bool> {
    if !status.is_terminal() {
        bail!("a message cannot be moved back to pending");
    }
    let changed = conn.execute(
        "UPDATE pending_messages SET status = ?1 WHERE id = ?2 AND status = 'pending'",
        rusqlite::params![status.as_str(), id],
    )?;
    Ok(changed == 1)
}

pub fn insert_message(
    conn: &Connection,
    pending_id: Option<i64>,
    content: &str,
) -> Result<MessageRow> {
    let row = conn.query_row(
        "INSERT INTO messages (pending_id, content) VALUES (?1, ?2)
         RETURNING id, pending_id, content, created_at",
        rusqlite::params![pending_id, content],
        message_from_row,
    )?;
    Ok(row)
}

pub fn query_random_message(conn: &Connection) -> Result<Option<MessageRow>> {
    // Count and pick under one snapshot so the offset is always in range.
    let tx = conn.unchecked_transaction()?;

    let count: i64 = tx.query_row("SELECT COUNT(*) FROM messages", [], |r| r.get(0))?;
    if count == 0 {
        return Ok(None);
    }

    let offset = rand::rng().random_range(0..count);
    let row = tx
        .query_row(
            "SELECT id, pending_id, content, created_at
             FROM messages
             ORDER BY id
             LIMIT 1 OFFSET ?1",
            [offset],
            message_from_row,
        )
        .optional()?;

    tx.finish()?;
    Ok(row)
}

fn pending_from_row(row: &Row<'_>) -> rusqlite::Result<PendingMessageRow> {
    let status: String = row.get(2)?;
    let status = status
        .parse::<PendingStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(PendingMessageRow {
        id: row.get(0)?,
        content: row.get(1)?,
        status,
        created_at: row.get(3)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        pending_id: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
