//! src/email_client.rs
use crate::domain::{MailAddress, NotificationMessage};
use crate::mail_encoding::{Charset, EncodingError};
use crate::routes::error_chain_fmt;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Anything that can deliver a `NotificationMessage`.
///
/// Transport and wire-charset concerns stay behind this trait; callers hand over
/// logical UTF-8 text and only learn whether the hand-off succeeded.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &NotificationMessage) -> Result<(), MailError>;
}

#[derive(thiserror::Error)]
pub enum MailError {
    #[error("Failed to encode the message for the outbound charset.")]
    Encoding(#[from] EncodingError),
    #[error("Failed to reach the email delivery service.")]
    Transport(#[source] reqwest::Error),
    #[error("The email delivery service rejected the message with status {0}.")]
    Rejected(StatusCode),
    #[error("Failed to hand the message to sendmail.")]
    Sendmail(#[source] std::io::Error),
    #[error("sendmail exited with {0}.")]
    SendmailExit(std::process::ExitStatus),
}

impl std::fmt::Debug for MailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(f, self)
    }
}

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: MailAddress,
    sender_name: String,
    authorization_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: MailAddress,
        sender_name: String,
        authorization_token: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            sender,
            sender_name,
            authorization_token,
        })
    }

    #[tracing::instrument(
        name = "Sending an email",
        skip(self, subject, text_content),
        fields(recipient = %recipient, reply_to = %reply_to)
    )]
    pub async fn send_email(
        &self,
        recipient: &MailAddress,
        subject: &str,
        text_content: &str,
        reply_to: &MailAddress,
    ) -> Result<(), MailError> {
        let url = format!("{}/email", self.base_url);
        // The delivery API builds the MIME message itself, so text goes out as Unicode.
        let request_body = SendEmailRequest {
            from: format!("{} <{}>", self.sender_name, self.sender),
            to: recipient.as_ref(),
            subject,
            text_body: text_content,
            reply_to: reply_to.as_ref(),
            headers: vec![MailHeader {
                name: "X-Mailer",
                value: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await
            .map_err(MailError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected(status));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Mailer for EmailClient {
    async fn send(&self, message: &NotificationMessage) -> Result<(), MailError> {
        self.send_email(
            &message.recipient,
            &message.subject,
            &message.body,
            &message.reply_to,
        )
        .await
    }
}

/// Delivers through a local `sendmail` binary, which reads recipients from the
/// rendered headers (`-t`) and ignores lone dots in the body (`-i`).
pub struct SendmailClient {
    path: String,
    sender: MailAddress,
    sender_name: String,
    charset: Charset,
    timeout: std::time::Duration,
}

impl SendmailClient {
    pub fn new(
        path: String,
        sender: MailAddress,
        sender_name: String,
        charset: Charset,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            path,
            sender,
            sender_name,
            charset,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl Mailer for SendmailClient {
    #[tracing::instrument(
        name = "Sending an email through sendmail",
        skip(self, message),
        fields(recipient = %message.recipient, reply_to = %message.reply_to)
    )]
    async fn send(&self, message: &NotificationMessage) -> Result<(), MailError> {
        let raw_message = self
            .charset
            .render_message(&self.sender_name, &self.sender, message)?;

        let mut child = Command::new(&self.path)
            .args(["-t", "-i", "-f", self.sender.as_ref()])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(MailError::Sendmail)?;

        let delivery = async {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(raw_message.as_bytes()).await?;
            }
            child.wait().await
        };
        let status = tokio::time::timeout(self.timeout, delivery)
            .await
            .map_err(|_| MailError::Sendmail(std::io::ErrorKind::TimedOut.into()))?
            .map_err(MailError::Sendmail)?;

        if !status.success() {
            return Err(MailError::SendmailExit(status));
        }
        Ok(())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: String,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
    reply_to: &'a str,
    headers: Vec<MailHeader>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct MailHeader {
    name: &'static str,
    value: String,
}
