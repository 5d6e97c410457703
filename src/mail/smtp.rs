use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, instrument};

use super::{Mailer, OutgoingEmail};
use crate::config::MailConfig;

/// Sends mail through an authenticated SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> anyhow::Result<Self> {
        let (user, pass) = cfg
            .credentials
            .clone()
            .context("SMTP credentials are required")?;

        let from = Mailbox::new(
            Some(cfg.from_name.clone()),
            user.parse().with_context(|| format!("invalid EMAIL_USER address {user:?}"))?,
        );

        // Port 465 speaks TLS from the first byte; anything else upgrades with STARTTLS.
        let builder = if cfg.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
        }
        .with_context(|| format!("smtp relay {}", cfg.smtp_host))?;

        let transport = builder
            .port(cfg.smtp_port)
            .credentials(Credentials::new(user, pass))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, email), fields(to = %email.to, subject = %email.subject))]
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email
                .to
                .parse()
                .with_context(|| format!("invalid recipient {:?}", email.to))?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)
            .context("build email")?;

        self.transport.send(message).await.context("smtp send")?;
        debug!("email sent");
        Ok(())
    }
}
