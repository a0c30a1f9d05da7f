//! src/domain/mod.rs
mod council_name;
mod mail_address;
mod notification;
mod submission;

pub use council_name::CouncilName;
pub use mail_address::MailAddress;
pub use notification::{DispatchOutcome, FailedParty, NotificationMessage};
pub use submission::Submission;

/// A reason a single form field was rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    #[error("the council name is missing")]
    CouncilNameMissing,
    #[error("the email address is missing")]
    EmailMissing,
    #[error("the email address is not well formed")]
    EmailMalformed,
}
