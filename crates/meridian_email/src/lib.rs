use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_RELAY: &str = "smtp.gmail.com";

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("mail credentials are not configured")]
    NotConfigured,
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Mail account used to deliver alerts.
#[derive(Clone)]
pub struct MailConfig {
    pub username: String,
    pub password: String,
    /// Defaults to the account itself.
    pub recipient: Option<String>,
    pub relay: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("relay", &self.relay)
            .finish()
    }
}

/// Sends plain-text alerts over implicit-TLS SMTP (port 465).
pub struct Mailer {
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl Mailer {
    pub fn new(config: &MailConfig, timeout: Duration) -> Result<Self, NotificationError> {
        let from: Mailbox = config.username.parse()?;
        let to: Mailbox = config
            .recipient
            .as_deref()
            .unwrap_or(&config.username)
            .parse()?;

        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.relay)?
            .credentials(creds)
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            from,
            to,
            transport,
        })
    }

    pub fn compose(&self, subject: &str, body: &str) -> Result<Message, NotificationError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        Ok(message)
    }

    pub async fn send(&self, subject: &str, body: &str) -> Result<(), NotificationError> {
        let message = self.compose(subject, body)?;

        self.transport.send(message).await?;
        tracing::info!(recipient = %self.to, subject, "alert mail sent");

        Ok(())
    }
}
