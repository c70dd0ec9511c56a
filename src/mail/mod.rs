use crate::{config::SmtpConfig, error::MailError};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

const SMTP_TIMEOUT_SECS: u64 = 30;
const CONTACT_SUBJECT: &str = "Contact form";

/// A message sent through the contact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    pub fn body(&self) -> String {
        format!(
            "New message from the website:\n\n\
First name: {}\n\
Last name: {}\n\
Sender email: {}\n\n\
Message:\n{}",
            self.first_name,
            self.last_name
                .as_deref()
                .filter(|name| !name.is_empty())
                .unwrap_or("-"),
            self.email,
            self.message
        )
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_contact(&self, message: &ContactMessage) -> Result<(), MailError>;
}

/// Delivers contact messages over SMTP.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, contact: &ContactMessage) -> Result<Message, MailError> {
        let username = self
            .config
            .username
            .as_deref()
            .ok_or_else(|| MailError::NotConfigured("SMTP_USERNAME".into()))?;
        let recipient = self
            .config
            .recipient()
            .ok_or_else(|| MailError::NotConfigured("CONTACT_EMAIL_TO".into()))?;

        let from: Mailbox = parse_mailbox(username)?;
        let to: Mailbox = parse_mailbox(recipient)?;
        let reply_to: Mailbox = parse_mailbox(&contact.email)?;

        Message::builder()
            .from(from)
            .to(to)
            .reply_to(reply_to)
            .subject(CONTACT_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(contact.body())
            .map_err(|e| MailError::InvalidAddress(e.to_string()))
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let missing = || {
            MailError::NotConfigured(
                "set SMTP_SERVER, SMTP_PORT, SMTP_USERNAME, SMTP_PASSWORD and CONTACT_EMAIL_TO"
                    .into(),
            )
        };
        let server = self.config.server.as_deref().ok_or_else(missing)?;
        let username = self.config.username.clone().ok_or_else(missing)?;
        let password = self.config.password.as_ref().ok_or_else(missing)?;

        let builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(server)
        };

        Ok(builder
            .port(self.config.port)
            .timeout(Some(Duration::from_secs(SMTP_TIMEOUT_SECS)))
            .credentials(Credentials::new(username, password.expose().to_string()))
            .build())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|_| MailError::InvalidAddress(address.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_contact(&self, message: &ContactMessage) -> Result<(), MailError> {
        let transport = self.build_transport()?;
        let email = self.build_message(message)?;

        transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        log::info!("Contact message from {} delivered", message.email);
        Ok(())
    }
}
