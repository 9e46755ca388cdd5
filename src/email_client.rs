use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{header, Mailbox, MultiPart, SinglePart};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::domain::SubscriberEmail;

/// Something that can deliver a single-recipient HTML + text email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error>;
}

/// SMTP submission through one shared, pooled STARTTLS transport.
#[derive(Clone)]
pub struct SmtpEmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpEmailClient {
    pub fn new(
        transport: AsyncSmtpTransport<Tokio1Executor>,
        sender_name: &str,
        sender_email: &str,
    ) -> Result<Self, anyhow::Error> {
        let address = sender_email
            .parse::<Address>()
            .with_context(|| format!("{} is not a valid sender address", sender_email))?;

        Ok(Self {
            transport,
            sender: Mailbox::new(Some(sender_name.to_owned()), address),
        })
    }

    fn build_message(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<Message, anyhow::Error> {
        let to = recipient
            .as_ref()
            .parse::<Mailbox>()
            .with_context(|| format!("{} is not a deliverable address", recipient))?;

        Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_content.to_owned()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_content.to_owned()),
                    ),
            )
            .context("Failed to build the email message")
    }
}

#[async_trait]
impl Mailer for SmtpEmailClient {
    #[tracing::instrument(name = "Sending an email over SMTP", skip_all, fields(recipient = %recipient))]
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error> {
        let message = self.build_message(recipient, subject, html_content, text_content)?;

        self.transport
            .send(message)
            .await
            .context("SMTP transport rejected the message")?;

        Ok(())
    }
}
