//! Outbound notifications (registration confirmation, password reset, new
//! order). Callers hand a [`Notification`] to a [`Notifier`] and move on;
//! delivery problems are logged, never returned.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use thiserror::Error;

use crate::config::EmailConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    ConfirmRegistration { email: String, token: String },
    PasswordReset { email: String, token: String },
    NewOrder { email: String, order_id: i64, total_sum: i64 },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ConfirmRegistration { .. } => "confirm_registration",
            Notification::PasswordReset { .. } => "password_reset",
            Notification::NewOrder { .. } => "new_order",
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Notification::ConfirmRegistration { email, .. }
            | Notification::PasswordReset { email, .. }
            | Notification::NewOrder { email, .. } => email,
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Notification::ConfirmRegistration { email, .. } => {
                format!("Токен для подтверждения регистрации {email}")
            }
            Notification::PasswordReset { email, .. } => {
                format!("Токен для сброса пароля {email}")
            }
            Notification::NewOrder { .. } => "Спасибо за заказ".to_string(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notification::ConfirmRegistration { token, .. }
            | Notification::PasswordReset { token, .. } => token.clone(),
            Notification::NewOrder {
                order_id,
                total_sum,
                ..
            } => format!(
                "Номер вашего заказа: {order_id}\n\
                 Сумма заказа: {total_sum}\n\
                 Наш оператор свяжется с Вами в ближайшее время для уточнения деталей заказа.\n\
                 Статус заказов вы можете посмотреть в разделе \"Заказы\"."
            ),
        }
    }
}

/// Fire-and-forget sink. `send` must return without waiting on delivery.
pub trait Notifier: Send + Sync {
    fn send(&self, notification: Notification);
}

/// Used when SMTP is not configured: the message is only logged.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: Notification) {
        tracing::info!(
            kind = notification.kind(),
            to = %notification.recipient(),
            subject = %notification.subject(),
            "notification (smtp disabled)"
        );
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

#[derive(Clone)]
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let credentials =
            Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let to = notification.recipient();
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(to.to_string()))?)
            .subject(notification.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body())?;

        self.mailer.send(email).await?;
        tracing::info!(kind = notification.kind(), to = %to, "email sent");
        Ok(())
    }
}

impl Notifier for EmailNotifier {
    fn send(&self, notification: Notification) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(err) = this.deliver(&notification).await {
                tracing::warn!(
                    error = %err,
                    kind = notification.kind(),
                    "notification delivery failed"
                );
            }
        });
    }
}
