use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;
use crate::models::booking::BookingRecord;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("smtp configuration error: {0}")]
    Configuration(String),
    #[error("failed to send email: {0}")]
    Send(String),
}

/// Outbound guest/operator email. Callers spawn these fire-and-forget; a
/// failed notification is logged and never fails the booking flow.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// "We received your booking request" to the guest, with a copy to the
    /// operator inbox.
    async fn booking_request_received(
        &self,
        guest_email: &str,
        guest_name: &str,
        experience_title: &str,
    ) -> Result<(), NotifyError>;

    /// Deposit confirmation with the paid and outstanding amounts.
    async fn booking_confirmed(&self, booking: &BookingRecord) -> Result<(), NotifyError>;
}

pub struct SmtpNotifier {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Result<Self, NotifyError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Configuration(format!("failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self { config, transport })
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), NotifyError> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|e| NotifyError::Configuration(format!("invalid from address: {}", e)))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| NotifyError::Send(format!("invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| NotifyError::Send(format!("failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn booking_request_received(
        &self,
        guest_email: &str,
        guest_name: &str,
        experience_title: &str,
    ) -> Result<(), NotifyError> {
        let body = format!(
            "Hi {},\n\nThanks for your booking request for \"{}\". \
             Complete the deposit payment to confirm your spot. \
             If anything goes wrong during checkout, just reply to this email \
             and we will arrange the booking manually.\n",
            guest_name, experience_title
        );
        self.send(guest_email, "We received your booking request", body)
            .await?;

        let operator_body = format!(
            "New booking request: {} <{}> for \"{}\".\n",
            guest_name, guest_email, experience_title
        );
        self.send(
            &self.config.operator_email,
            "New booking request",
            operator_body,
        )
        .await
    }

    async fn booking_confirmed(&self, booking: &BookingRecord) -> Result<(), NotifyError> {
        let body = format!(
            "Hi {},\n\nYour deposit of ${:.2} for \"{}\" on {} is confirmed. \
             The remaining balance of ${:.2} is payable on arrival.\n\n\
             Booking reference: {}\n",
            booking.customer_name,
            booking.deposit_usd,
            booking.experience_title,
            booking.date,
            booking.balance_usd,
            booking.id
        );
        self.send(&booking.customer_email, "Your booking is confirmed", body)
            .await?;

        let operator_body = format!(
            "Booking {} confirmed via {}: {} <{}>, \"{}\" on {}, {} adults / {} children, \
             deposit ${:.2}, balance ${:.2}.\n",
            booking.id,
            booking.source,
            booking.customer_name,
            booking.customer_email,
            booking.experience_title,
            booking.date,
            booking.adults,
            booking.children,
            booking.deposit_usd,
            booking.balance_usd
        );
        self.send(
            &self.config.operator_email,
            "Booking confirmed",
            operator_body,
        )
        .await
    }
}

/// Used when SMTP is not configured, and by tests.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn booking_request_received(
        &self,
        _guest_email: &str,
        _guest_name: &str,
        _experience_title: &str,
    ) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn booking_confirmed(&self, _booking: &BookingRecord) -> Result<(), NotifyError> {
        Ok(())
    }
}
