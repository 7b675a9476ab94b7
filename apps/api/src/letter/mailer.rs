//! SMTP delivery.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, info};

use super::email::OutgoingEmail;
use crate::settings::{Encryption, SmtpSettings};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Invalid attachment content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, smtp: &SmtpSettings, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Opens a fresh connection per message with the settings of the current request.
pub struct SmtpMailer;

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, smtp: &SmtpSettings, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = build_message(email)?;

        let host = smtp.host.trim();
        let builder = match smtp.encryption {
            Encryption::Ssl => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?,
            Encryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?,
            Encryption::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };
        let mut builder = builder.port(smtp.port);
        if !smtp.username.trim().is_empty() {
            builder = builder.credentials(Credentials::new(
                smtp.username.trim().to_string(),
                smtp.password.clone(),
            ));
        }

        debug!("Connecting to {host}:{} ({:?})", smtp.port, smtp.encryption);
        builder.build().send(message).await?;
        info!("Email delivered to {}", email.to);
        Ok(())
    }
}

pub fn build_message(email: &OutgoingEmail) -> Result<Message, MailError> {
    let from = Mailbox::new(
        Some(email.from_name.clone()).filter(|n| !n.is_empty()),
        email.from_email.parse()?,
    );

    let mut builder = Message::builder()
        .from(from)
        .to(Mailbox::new(None, email.to.parse()?))
        .subject(email.subject.clone());
    if let Some(bcc) = &email.bcc {
        builder = builder.bcc(Mailbox::new(None, bcc.parse()?));
    }

    let mut body = MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
        email.text_body.clone(),
        email.html_body.clone(),
    ));
    for attachment in &email.attachments {
        body = body.singlepart(
            Attachment::new(attachment.filename.clone())
                .body(attachment.content.to_vec(), ContentType::parse(attachment.content_type)?),
        );
    }

    Ok(builder.multipart(body)?)
}
