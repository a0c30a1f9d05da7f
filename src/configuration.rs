//! src/configuration.rs
use crate::domain::MailAddress;
use crate::mail_encoding::Charset;
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub registration: RegistrationSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub sender_name: String,
    pub authorization_token: Secret<String>,
    pub timeout_milliseconds: u64,
    pub transport: MailTransport,
    pub sendmail: SendmailSettings,
}

/// Which `Mailer` carries outgoing notifications.
#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// JSON delivery API. Text is always sent as Unicode.
    Http,
    /// Local `sendmail -t`, fed a raw MIME message in `sendmail.charset`.
    Sendmail,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct SendmailSettings {
    pub path: String,
    pub charset: Charset,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<MailAddress, String> {
        MailAddress::parse(self.sender_email.clone())
            .map_err(|e| format!("{} is not a valid sender email: {e}", self.sender_email))
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct RegistrationSettings {
    pub admin_email: String,
    pub support_email: String,
    pub timestamp_format: String,
    pub utc_offset_hours: i32,
    pub admin_notification: MessageTemplate,
    pub user_confirmation: MessageTemplate,
    pub messages: ResponseMessages,
}

impl RegistrationSettings {
    pub fn admin(&self) -> Result<MailAddress, String> {
        MailAddress::parse(self.admin_email.clone())
            .map_err(|e| format!("{} is not a valid admin email: {e}", self.admin_email))
    }

    pub fn support(&self) -> Result<MailAddress, String> {
        MailAddress::parse(self.support_email.clone())
            .map_err(|e| format!("{} is not a valid support email: {e}", self.support_email))
    }

    pub fn utc_offset(&self) -> Result<chrono::FixedOffset, String> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(chrono::FixedOffset::east_opt)
            .ok_or_else(|| format!("{} is not a valid UTC offset in hours", self.utc_offset_hours))
    }
}

/// Subject and body of an outgoing notification.
///
/// The body may reference `{council_name}`, `{email}` and `{timestamp}`.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct MessageTemplate {
    pub subject: String,
    pub body: String,
}

/// Every string the registration endpoint can hand back to the caller.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct ResponseMessages {
    pub method_not_allowed: String,
    pub council_name_required: String,
    pub email_required: String,
    pub valid_email_required: String,
    pub registration_completed: String,
    pub admin_notification_failed: String,
    pub confirmation_failed: String,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT.");
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // E.g. `APP_APPLICATION__PORT=5001` would set `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our application.
#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}
