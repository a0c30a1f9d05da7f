//! src/domain/submission.rs
use crate::domain::{CouncilName, FieldError, MailAddress};

#[derive(Debug, Clone)]
pub struct Submission {
    pub council_name: CouncilName,
    pub email: MailAddress,
}

impl Submission {
    /// Validates both fields, collecting every rejection in field order
    /// (council name first, then email) instead of stopping at the first one.
    pub fn parse(council_name: String, email: String) -> Result<Self, Vec<FieldError>> {
        let council_name = CouncilName::parse(council_name);
        let email = MailAddress::parse(email);
        match (council_name, email) {
            (Ok(council_name), Ok(email)) => Ok(Self {
                council_name,
                email,
            }),
            (council_name, email) => Err([council_name.err(), email.err()]
                .into_iter()
                .flatten()
                .collect()),
        }
    }
}
