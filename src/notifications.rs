use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;
use crate::email_templates::{admin_summary, applicant_confirmation};
use crate::models::Lead;

/// Upper bound on a single SMTP conversation.
pub const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a best-effort delivery. Callers are free to ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Mail is not configured; nothing was attempted.
    Skipped,
    Delivered,
    /// Delivery was attempted and failed.
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Outbound email channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Admin inbox for new-lead summaries; `None` when mail is disabled.
    fn admin_recipient(&self) -> Option<&str>;

    /// Sends one email. Never fails; the outcome reports what happened.
    async fn send_email(&self, subject: &str, body: &str, recipient: &str) -> DeliveryOutcome;
}

/// SMTP notifier: one connection per email, STARTTLS, optional login.
pub struct SmtpNotifier {
    mail: Option<MailConfig>,
}

impl SmtpNotifier {
    pub fn new(mail: Option<MailConfig>) -> Self {
        Self { mail }
    }

    async fn try_send(
        mail: &MailConfig,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<(), NotificationError> {
        let message = Message::builder()
            .from(mail.from.parse()?)
            .to(recipient.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&mail.host)?
            .port(mail.port)
            .timeout(Some(SMTP_TIMEOUT));
        if let Some((user, pass)) = mail.credentials() {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        builder.build().send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn admin_recipient(&self) -> Option<&str> {
        self.mail.as_ref().map(|m| m.to.as_str())
    }

    async fn send_email(&self, subject: &str, body: &str, recipient: &str) -> DeliveryOutcome {
        let Some(ref mail) = self.mail else {
            return DeliveryOutcome::Skipped;
        };

        match Self::try_send(mail, subject, body, recipient).await {
            Ok(()) => {
                tracing::info!("📧 Email sent: '{}'", subject);
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!("Email '{}' not delivered: {}", subject, e);
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Outcomes of the two emails sent for a new lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadNotifications {
    pub admin: DeliveryOutcome,
    pub applicant: DeliveryOutcome,
}

/// Sends the admin summary and the applicant confirmation for a stored lead.
///
/// Returns `None` without sending anything when no admin recipient is
/// configured.
pub async fn notify_new_lead(
    notifier: &dyn Notifier,
    lead: &Lead,
    lead_id: &str,
) -> Option<LeadNotifications> {
    let admin_to = notifier.admin_recipient()?.to_string();

    let summary = admin_summary(lead, lead_id);
    let admin = notifier
        .send_email(&summary.subject, &summary.body, &admin_to)
        .await;

    let confirmation = applicant_confirmation(lead);
    let applicant = notifier
        .send_email(&confirmation.subject, &confirmation.body, &lead.email)
        .await;

    Some(LeadNotifications { admin, applicant })
}
