use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::MailConfig;

mod smtp;
pub mod templates;

pub use smtp::SmtpMailer;

/// A rendered HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// Writes mail to the log instead of sending it. Used when no SMTP
/// credentials are configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        // The body carries single-use links; only the envelope is logged.
        info!(to = %email.to, subject = %email.subject, "email not sent (log mailer)");
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match &cfg.credentials {
        Some(_) => Ok(Arc::new(SmtpMailer::new(cfg)?)),
        None => {
            warn!("EMAIL_USER/EMAIL_PASS not set; outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::capture_logs;

    #[tokio::test]
    async fn log_mailer_keeps_the_body_out_of_the_log() {
        let (logs, _guard) = capture_logs();
        let link = "http://localhost:3000/api/auth/verify-email?token=feedface0123";
        LogMailer
            .send(OutgoingEmail {
                to: "a@example.com".into(),
                subject: "Verify your email".into(),
                html: format!("<a href=\"{link}\">Verify</a>"),
            })
            .await
            .unwrap();

        let out = logs.contents();
        assert!(out.contains("a@example.com"));
        assert!(out.contains("Verify your email"));
        assert!(!out.contains("feedface0123"), "token leaked: {out}");
    }
}
