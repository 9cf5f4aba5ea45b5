//! Database row types. These map directly to SQLite rows and stay
//! independent of the spreadlove-types wire models.
use chrono::{DateTime, NaiveDateTime, Utc};
use spreadlove_types::models::PendingStatus;

#[derive(Debug, Clone)]
pub struct PendingMessageRow {
    pub id: i64,
    pub content: String,
    pub status: PendingStatus,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub pending_id: Option<i64>,
    pub content: String,
    pub created_at: String,
}

/// SQLite's `datetime('now')` produces "YYYY-MM-DD HH:MM:SS" in UTC with no
/// offset; RFC 3339 is accepted too for rows written by other tools.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|ndt| ndt.and_utc())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_sqlite_datetime() {
        let ts = parse_timestamp("2024-02-14 09:30:05").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 2, 14));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (9, 30, 5));
    }

    #[test]
    fn parses_rfc3339() {
        let ts = parse_timestamp("2024-02-14T09:30:05+02:00").unwrap();
        assert_eq!(ts.hour(), 7);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
    }
}
