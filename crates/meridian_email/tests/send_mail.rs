use meridian_email::{DEFAULT_RELAY, MailConfig, Mailer};
use std::time::Duration;

#[tokio::test]
#[ignore = "sends a real mail through the configured account"]
pub async fn send_alert() {
    let (username, password) = match (std::env::var("GMAIL_USER"), std::env::var("GMAIL_PASS")) {
        (Ok(user), Ok(pass)) => (user, pass),
        _ => {
            eprintln!("GMAIL_USER / GMAIL_PASS not set, skipping");
            return;
        }
    };

    let mailer = Mailer::new(
        &MailConfig {
            username,
            password,
            recipient: None,
            relay: DEFAULT_RELAY.to_string(),
        },
        Duration::from_secs(30),
    )
    .expect("Failed to build mailer");

    mailer
        .send("Bitcoin Daily Valuation", "Test alert from the valuation run.")
        .await
        .expect("Failed to send alert");
}
