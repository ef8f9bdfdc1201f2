//! Outbound mail for credential recovery.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use zeeorder_core::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mailbox: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Recovery notice for the owner. It names the admin account and where to
/// rotate the password; the password itself is never included.
pub fn recovery_notice(owner_email: &str, admin_email: &str) -> OutgoingMail {
    OutgoingMail {
        to: owner_email.to_string(),
        subject: "Zee Ordering admin access".to_string(),
        body: format!(
            "A credential reset was requested for the Zee Ordering admin account.\n\n\
             Admin email/ID: {admin_email}\n\n\
             Passwords are not sent by email. To regain access, set a new \
             ADMIN_PASSWORD in the server environment and restart the service.\n\n\
             If you did not request this, you can ignore this message."
        ),
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, smtp: &SmtpConfig, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Delivers through the configured SMTP relay. Port 465 uses implicit TLS,
/// any other port upgrades with STARTTLS.
pub struct SmtpMailer;

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, smtp: &SmtpConfig, mail: OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(smtp.from.parse::<Mailbox>()?)
            .to(mail.to.parse::<Mailbox>()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;

        let builder = if smtp.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
        };
        let transport = builder
            .port(smtp.port)
            .credentials(Credentials::new(smtp.user.clone(), smtp.pass.clone()))
            .build();

        transport.send(message).await?;
        tracing::info!(host = %smtp.host, port = smtp.port, "recovery notice sent");
        Ok(())
    }
}
