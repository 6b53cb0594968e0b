//! SMTP transport using lettre.

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use postbell_common::config::SmtpConfig;

use crate::transport::{MailTransport, OutgoingMail};

pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) if !user.is_empty() => {
                Some(Credentials::new(user.clone(), pass.clone()))
            }
            _ => None,
        };

        let transport = match &config.host {
            Some(host) if config.use_tls => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                    .context("Failed to create SMTP relay")?
                    .port(config.port);
                if let Some(creds) = credentials {
                    builder = builder.credentials(creds);
                }
                builder.build()
            }
            Some(host) => {
                let mut builder =
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(config.port);
                if let Some(creds) = credentials {
                    builder = builder.credentials(creds);
                }
                builder.build()
            }
            // Local relay (Mailpit/Mailhog) without auth
            None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("localhost")
                .port(config.port)
                .build(),
        };

        tracing::info!(
            host = config.host.as_deref().unwrap_or("localhost"),
            port = config.port,
            tls = config.use_tls,
            "SMTP transport configured"
        );

        Ok(Self { transport })
    }
}

/// Render an [`OutgoingMail`] as an HTML-only MIME message.
pub fn build_message(mail: &OutgoingMail) -> anyhow::Result<Message> {
    let from: Mailbox = mail.from.parse().context("Invalid from address")?;
    let to: Mailbox = mail.to.parse().context("Invalid recipient address")?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(&mail.subject)
        .header(ContentType::TEXT_HTML)
        .body(mail.html_body.clone())
        .context("Failed to build HTML message")
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        let message = build_message(mail)?;

        self.transport
            .send(message)
            .await
            .context("Failed to send email via SMTP")?;

        tracing::debug!(mail_id = %mail.id, to = %mail.to, "Email handed to SMTP relay");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
