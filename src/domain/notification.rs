//! src/domain/notification.rs
use crate::configuration::MessageTemplate;
use crate::domain::{MailAddress, Submission};

/// One email ready to be handed to a `Mailer`, in logical (UTF-8) text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub recipient: MailAddress,
    pub subject: String,
    pub body: String,
    pub reply_to: MailAddress,
}

impl NotificationMessage {
    /// Tells the administrator about a new registration. Replies go to the registrant.
    pub fn admin_notification(
        submission: &Submission,
        template: &MessageTemplate,
        admin: &MailAddress,
        timestamp: &str,
    ) -> Self {
        Self {
            recipient: admin.clone(),
            subject: template.subject.clone(),
            body: render(&template.body, submission, Some(timestamp)),
            reply_to: submission.email.clone(),
        }
    }

    /// Confirms the registration to the registrant. Replies go to support.
    pub fn user_confirmation(
        submission: &Submission,
        template: &MessageTemplate,
        support: &MailAddress,
    ) -> Self {
        Self {
            recipient: submission.email.clone(),
            subject: template.subject.clone(),
            body: render(&template.body, submission, None),
            reply_to: support.clone(),
        }
    }
}

fn render(template: &str, submission: &Submission, timestamp: Option<&str>) -> String {
    let mut fields = vec![
        ("council_name", submission.council_name.as_ref()),
        ("email", submission.email.as_ref()),
    ];
    if let Some(timestamp) = timestamp {
        fields.push(("timestamp", timestamp));
    }

    // Single pass, so placeholders inside submitted values are left alone.
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let placeholder = fields
            .iter()
            .find(|(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));
        match placeholder {
            Some((name, value)) => {
                rendered.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                rendered.push('{');
                rest = tail;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

/// Which side of a registration did not get its email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedParty {
    Admin,
    Registrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub admin_sent: bool,
    pub user_sent: bool,
}

impl DispatchOutcome {
    /// An administrator failure is reported even when the registrant's mail also failed.
    pub fn failure(&self) -> Option<FailedParty> {
        match (self.admin_sent, self.user_sent) {
            (true, true) => None,
            (false, _) => Some(FailedParty::Admin),
            (true, false) => Some(FailedParty::Registrant),
        }
    }
}
