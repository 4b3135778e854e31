use async_trait::async_trait;
use meridian_email::{MailConfig, Mailer, NotificationError};
use std::time::Duration;

/// Delivers a finished report to the operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotificationError>;
}

#[async_trait]
impl Notifier for Mailer {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotificationError> {
        self.send(subject, body).await
    }
}

/// Mail delivery when credentials are configured, otherwise a channel that
/// refuses every alert so the attempt still shows up in the logs.
pub enum AlertChannel {
    Mail(Mailer),
    Disabled,
}

impl AlertChannel {
    /// Never fails: an account that cannot be used is logged and disabled.
    pub fn from_config(mail: Option<&MailConfig>, timeout: Duration) -> Self {
        let Some(config) = mail else {
            tracing::warn!("GMAIL_USER/GMAIL_PASS not set, alerts will not be mailed");
            return AlertChannel::Disabled;
        };

        match Mailer::new(config, timeout) {
            Ok(mailer) => AlertChannel::Mail(mailer),
            Err(e) => {
                tracing::warn!(error = %e, "Mail account unusable, alerts will not be mailed");
                AlertChannel::Disabled
            }
        }
    }
}

#[async_trait]
impl Notifier for AlertChannel {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotificationError> {
        match self {
            AlertChannel::Mail(mailer) => mailer.notify(subject, body).await,
            AlertChannel::Disabled => Err(NotificationError::NotConfigured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_email::DEFAULT_RELAY;

    #[tokio::test]
    async fn disabled_channel_reports_not_configured() {
        let channel = AlertChannel::from_config(None, Duration::from_secs(1));

        let err = channel.notify("Gold Daily Valuation", "body").await.unwrap_err();
        assert!(matches!(err, NotificationError::NotConfigured));
    }

    #[tokio::test]
    async fn configured_channel_uses_mail() {
        let config = MailConfig {
            username: "alerts@example.com".to_string(),
            password: "app-password".to_string(),
            recipient: None,
            relay: DEFAULT_RELAY.to_string(),
        };

        let channel = AlertChannel::from_config(Some(&config), Duration::from_secs(1));
        assert!(matches!(channel, AlertChannel::Mail(_)));
    }

    #[tokio::test]
    async fn bad_address_disables_mail() {
        let config = MailConfig {
            username: "not an address".to_string(),
            password: "app-password".to_string(),
            recipient: None,
            relay: DEFAULT_RELAY.to_string(),
        };

        let channel = AlertChannel::from_config(Some(&config), Duration::from_secs(1));
        assert!(matches!(channel, AlertChannel::Disabled));

        let err = channel.notify("Gold Daily Valuation", "body").await.unwrap_err();
        assert!(matches!(err, NotificationError::NotConfigured));
    }
}
