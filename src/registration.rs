//! src/registration.rs
use crate::configuration::{MessageTemplate, RegistrationSettings, ResponseMessages};
use crate::domain::{
    DispatchOutcome, FailedParty, FieldError, MailAddress, NotificationMessage, Submission,
};
use crate::email_client::Mailer;
use anyhow::Context;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;

/// Raw form fields. Absent fields come through as empty strings.
#[derive(Debug, Default)]
pub struct RegistrationForm {
    pub council_name: String,
    pub email: String,
}

impl RegistrationForm {
    /// Picks the known fields out of decoded `name=value` pairs.
    ///
    /// A repeated field keeps its last value; unknown fields are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (name, value) in pairs {
            match name.as_str() {
                "council_name" => form.council_name = value,
                "email" => form.email = value,
                _ => {}
            }
        }
        form
    }
}

/// The JSON document returned for every registration request.
#[derive(serde::Serialize, Debug, PartialEq, Eq)]
pub struct RegistrationReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl RegistrationReply {
    fn completed(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            errors: None,
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            errors: None,
        }
    }

    fn rejected(errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: None,
            errors: Some(errors),
        }
    }
}

/// Validates a registration and notifies both the administrator and the registrant.
pub struct RegistrationHandler {
    mailer: Arc<dyn Mailer>,
    sender: MailAddress,
    admin: MailAddress,
    support: MailAddress,
    utc_offset: FixedOffset,
    timestamp_format: String,
    admin_notification: MessageTemplate,
    user_confirmation: MessageTemplate,
    messages: ResponseMessages,
}

impl RegistrationHandler {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        sender: MailAddress,
        settings: &RegistrationSettings,
    ) -> Result<Self, anyhow::Error> {
        let admin = settings.admin().map_err(anyhow::Error::msg)?;
        let support = settings.support().map_err(anyhow::Error::msg)?;
        let utc_offset = settings.utc_offset().map_err(anyhow::Error::msg)?;
        if StrftimeItems::new(&settings.timestamp_format).any(|item| item == Item::Error) {
            anyhow::bail!(
                "{:?} is not a valid timestamp format.",
                settings.timestamp_format
            );
        }
        Ok(Self {
            mailer,
            sender,
            admin,
            support,
            utc_offset,
            timestamp_format: settings.timestamp_format.clone(),
            admin_notification: settings.admin_notification.clone(),
            user_confirmation: settings.user_confirmation.clone(),
            messages: settings.messages.clone(),
        })
    }

    pub fn method_not_allowed(&self) -> RegistrationReply {
        RegistrationReply::failed(&self.messages.method_not_allowed)
    }

    /// Runs a registration received now.
    pub async fn register(&self, form: RegistrationForm) -> RegistrationReply {
        self.register_at(form, Utc::now()).await
    }

    #[tracing::instrument(
        name = "Registering for early access",
        skip(self, form, received_at),
        fields(
            registrant_email = %form.email,
            council_name = %form.council_name
        )
    )]
    pub async fn register_at(
        &self,
        form: RegistrationForm,
        received_at: DateTime<Utc>,
    ) -> RegistrationReply {
        let submission = match Submission::parse(form.council_name, form.email) {
            Ok(submission) => submission,
            Err(errors) => {
                tracing::info!(?errors, "Rejecting an invalid registration.");
                return RegistrationReply::rejected(
                    errors.into_iter().map(|e| self.describe(e)).collect(),
                );
            }
        };

        let timestamp = received_at
            .with_timezone(&self.utc_offset)
            .format(&self.timestamp_format)
            .to_string();
        let admin_message = NotificationMessage::admin_notification(
            &submission,
            &self.admin_notification,
            &self.admin,
            &timestamp,
        );
        let user_message = NotificationMessage::user_confirmation(
            &submission,
            &self.user_confirmation,
            &self.support,
        );

        let (admin_sent, user_sent) = tokio::join!(
            self.dispatch(&admin_message),
            self.dispatch(&user_message)
        );
        let outcome = DispatchOutcome {
            admin_sent,
            user_sent,
        };
        self.log_outcome(&submission, &outcome);

        match outcome.failure() {
            None => RegistrationReply::completed(&self.messages.registration_completed),
            Some(FailedParty::Admin) => {
                RegistrationReply::failed(&self.messages.admin_notification_failed)
            }
            Some(FailedParty::Registrant) => {
                RegistrationReply::failed(&self.messages.confirmation_failed)
            }
        }
    }

    async fn dispatch(&self, message: &NotificationMessage) -> bool {
        self.mailer
            .send(message)
            .await
            .with_context(|| format!("Failed to send an email to {}", message.recipient))
            .map_err(|e| {
                tracing::error!(error.cause_chain = ?e, "Dispatch failed.");
            })
            .is_ok()
    }

    fn log_outcome(&self, submission: &Submission, outcome: &DispatchOutcome) {
        if outcome.failure().is_none() {
            tracing::info!(
                "Registration mail sent successfully: email={}, council={}",
                submission.email,
                submission.council_name
            );
            return;
        }
        let flag = |sent: bool| if sent { "SUCCESS" } else { "FAILED" };
        tracing::error!(
            admin_sent = outcome.admin_sent,
            user_sent = outcome.user_sent,
            "Registration mail send failed:\n\
             Admin mail (to: {}): {}\n\
             User mail (to: {}): {}\n\
             Council: {}\n\
             From: {}",
            self.admin,
            flag(outcome.admin_sent),
            submission.email,
            flag(outcome.user_sent),
            submission.council_name,
            self.sender
        );
    }

    fn describe(&self, error: FieldError) -> String {
        match error {
            FieldError::CouncilNameMissing => self.messages.council_name_required.clone(),
            FieldError::EmailMissing => self.messages.email_required.clone(),
            FieldError::EmailMalformed => self.messages.valid_email_required.clone(),
        }
    }
}
