use crate::domain::FieldError;

#[derive(Debug, Clone)]
pub struct CouncilName(String);

impl CouncilName {
    /// Returns `Ok(CouncilName)` holding the trimmed input, or
    /// `Err(FieldError::CouncilNameMissing)` when nothing but whitespace was submitted.
    pub fn parse(name: String) -> Result<Self, FieldError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            Err(FieldError::CouncilNameMissing)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

impl AsRef<str> for CouncilName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouncilName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
