//! SMTP sink.

use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use healthwatch_core::config::EmailConfig;

use crate::sink::{Alert, AlertSink, SinkFuture};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Mails each alert to `to_emails`.
///
/// With a non-empty `username` the session is upgraded with STARTTLS and
/// authenticated; otherwise the message is sent in the clear.
pub struct EmailSink {
    config: EmailConfig,
}

impl EmailSink {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn message(&self, alert: &Alert) -> anyhow::Result<Message> {
        let from: Mailbox = self
            .config
            .from_email
            .parse()
            .with_context(|| format!("invalid from address {:?}", self.config.from_email))?;

        let mut builder = Message::builder()
            .from(from)
            .subject(format!("Pwnagotchi Alert: {}", alert.alert_type))
            .header(ContentType::TEXT_PLAIN);
        for to in &self.config.to_emails {
            let mailbox: Mailbox = to
                .parse()
                .with_context(|| format!("invalid recipient {to:?}"))?;
            builder = builder.to(mailbox);
        }

        builder
            .body(render_body(alert))
            .context("building alert email")
    }

    fn transport(&self) -> anyhow::Result<AsyncSmtpTransport<Tokio1Executor>> {
        let cfg = &self.config;
        let transport = if cfg.username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.smtp_server)
                .port(cfg.smtp_port)
                .timeout(Some(SMTP_TIMEOUT))
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_server)
                .with_context(|| format!("smtp relay {}", cfg.smtp_server))?
                .port(cfg.smtp_port)
                .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
                .timeout(Some(SMTP_TIMEOUT))
                .build()
        };
        Ok(transport)
    }
}

impl AlertSink for EmailSink {
    fn name(&self) -> &str {
        "email"
    }

    fn send<'a>(&'a self, alert: &'a Alert) -> SinkFuture<'a> {
        Box::pin(async move {
            if self.config.to_emails.is_empty() {
                anyhow::bail!("no recipients configured");
            }
            let message = self.message(alert)?;
            let transport = self.transport()?;
            transport
                .send(message)
                .await
                .with_context(|| {
                    format!("smtp {}:{}", self.config.smtp_server, self.config.smtp_port)
                })?;
            debug!(recipients = self.config.to_emails.len(), "alert email sent");
            Ok(())
        })
    }
}

fn render_body(alert: &Alert) -> String {
    let details = match &alert.details {
        Some(details) => serde_json::to_string_pretty(details)
            .unwrap_or_else(|_| details.to_string()),
        None => "No additional details".to_string(),
    };
    format!(
        "Pwnagotchi Health Monitor Alert\n\n\
         Type: {}\n\
         Time: {}\n\
         Message: {}\n\n\
         Details:\n{}\n\n\
         ---\n\
         Pwnagotchi Health Monitor\n",
        alert.alert_type,
        alert.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        alert.message,
        details,
    )
}
