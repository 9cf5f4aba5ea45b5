use anyhow::Result;
use tracing::info;

use spreadlove_db::Database;

use crate::mail::{Mailer, SUBJECT, summary_body};

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    NothingPending,
    Notified { pending: u64 },
}

/// One notification pass: read the pending count and, if anything is
/// waiting, mail the moderator. Storage is only ever read.
pub fn notify_pending(db: &Database, mailer: &dyn Mailer, admin_url: &str) -> Result<Outcome> {
    let pending = db.count_pending()?;
    if pending == 0 {
        info!("No pending messages to review");
        return Ok(Outcome::NothingPending);
    }

    mailer.send_html(SUBJECT, summary_body(pending, admin_url))?;
    info!("Sent review reminder for {} pending messages", pending);
    Ok(Outcome::Notified { pending })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use spreadlove_types::models::MessageContent;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl Mailer for RecordingMailer {
        fn send_html(&self, subject: &str, html: String) -> Result<()> {
            self.sent.lock().unwrap().push((subject.to_string(), html));
            Ok(())
        }
    }

    struct FailingMailer;

    impl Mailer for FailingMailer {
        fn send_html(&self, _: &str, _: String) -> Result<()> {
            anyhow::bail!("smtp unreachable")
        }
    }

    fn seeded(pending: usize, approved: usize) -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("love.db");
        let db = Database::open(&path).unwrap();
        for i in 0..pending + approved {
            let row = db
                .create_pending(&MessageContent::parse(&format!("note {}", i)).unwrap())
                .unwrap();
            if i >= pending {
                db.update_pending_status(row.id, spreadlove_types::models::PendingStatus::Approved)
                    .unwrap();
            }
        }
        drop(db);
        let ro = Database::open_read_only(&path).unwrap();
        (dir, ro)
    }

    #[test]
    fn silent_when_queue_is_empty() {
        let (_dir, db) = seeded(0, 2);
        let mailer = RecordingMailer::default();

        assert_eq!(notify_pending(&db, &mailer, "/admin").unwrap(), Outcome::NothingPending);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn mails_once_with_count() {
        let (_dir, db) = seeded(3, 1);
        let mailer = RecordingMailer::default();

        let outcome = notify_pending(&db, &mailer, "https://example.test/admin").unwrap();
        assert_eq!(outcome, Outcome::Notified { pending: 3 });

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SUBJECT);
        assert!(sent[0].1.contains("3 messages"));
    }

    #[test]
    fn mail_failure_is_reported_and_state_untouched() {
        let (_dir, db) = seeded(2, 0);
        assert!(notify_pending(&db, &FailingMailer, "/admin").is_err());
        assert_eq!(db.count_pending().unwrap(), 2);
    }
}
