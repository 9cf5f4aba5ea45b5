use anyhow::Result;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::Config;

pub const SUBJECT: &str = "There are pending love messages for you to review";

/// Where the pending summary goes. The SMTP implementation is the only one
/// outside tests.
pub trait Mailer {
    fn send_html(&self, subject: &str, html: String) -> Result<()>;
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    /// STARTTLS relay authenticated as the sender address.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = SmtpTransport::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.sender.parse()?,
            to: config.recipient.parse()?,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send_html(&self, subject: &str, html: String) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        self.transport.send(&email)?;
        Ok(())
    }
}

pub fn summary_body(pending: u64, admin_url: &str) -> String {
    let noun = if pending == 1 { "message is" } else { "messages are" };
    format!(
        "<html><body>{} {} waiting for review. Go to <a href='{}'>the admin page</a> to check them out.</body></html>",
        pending, noun, admin_url
    )
}
