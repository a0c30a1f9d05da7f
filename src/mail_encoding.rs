//! src/mail_encoding.rs
//!
//! Outbound character-encoding profiles for transports that take a raw MIME
//! message. Handlers only ever see UTF-8 text; conversion to the wire charset
//! happens here, right before a message is handed to the transport.
use crate::domain::{MailAddress, NotificationMessage};
use base64::Engine;
use encoding_rs::ISO_2022_JP;

/// RFC 2047 limit for a single encoded-word, delimiters included.
const MAX_ENCODED_WORD_LEN: usize = 75;

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Charset {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "iso-2022-jp")]
    Iso2022Jp,
}

#[derive(thiserror::Error, Debug)]
#[error("{charset} output for the {part} is not 7-bit clean")]
pub struct EncodingError {
    charset: &'static str,
    part: &'static str,
}

impl Charset {
    pub fn mime_name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Iso2022Jp => "ISO-2022-JP",
        }
    }

    pub fn content_type(&self) -> String {
        format!("text/plain; charset={}", self.mime_name())
    }

    pub fn content_transfer_encoding(&self) -> &'static str {
        match self {
            Charset::Utf8 => "8bit",
            Charset::Iso2022Jp => "7bit",
        }
    }

    /// Converts a message body to the wire charset.
    pub fn encode_body(&self, text: &str) -> Result<String, EncodingError> {
        match self {
            Charset::Utf8 => Ok(text.to_string()),
            Charset::Iso2022Jp => {
                let (encoded, had_unmappable_characters) = encode_iso_2022_jp(text, "body")?;
                warn_if_unmappable(had_unmappable_characters, "body");
                Ok(encoded)
            }
        }
    }

    /// Renders a header value (subject, display name) for the wire charset.
    ///
    /// Anything but printable ASCII becomes a run of RFC 2047 `B` encoded-words.
    /// Words are filled greedily up to the 75 character limit and each one is
    /// encoded on its own, so every ISO-2022-JP word starts and ends in ASCII mode.
    pub fn encode_header(&self, text: &str) -> Result<String, EncodingError> {
        if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
            return Ok(text.to_string());
        }
        let mut words = Vec::new();
        let mut pending = String::new();
        let mut had_unmappable_characters = false;
        for c in text.chars() {
            let mut extended = pending.clone();
            extended.push(c);
            if !pending.is_empty() && self.encoded_word(&extended)?.0.len() > MAX_ENCODED_WORD_LEN
            {
                let (word, unmappable) = self.encoded_word(&pending)?;
                had_unmappable_characters |= unmappable;
                words.push(word);
                pending.clear();
            }
            pending.push(c);
        }
        if !pending.is_empty() {
            let (word, unmappable) = self.encoded_word(&pending)?;
            had_unmappable_characters |= unmappable;
            words.push(word);
        }
        warn_if_unmappable(had_unmappable_characters, "header");
        Ok(words.join(" "))
    }

    /// Renders a complete message for a transport that reads raw MIME, such as
    /// `sendmail -t`.
    pub fn render_message(
        &self,
        sender_name: &str,
        sender: &MailAddress,
        message: &NotificationMessage,
    ) -> Result<String, EncodingError> {
        Ok(format!(
            "From: {} <{}>\n\
             To: {}\n\
             Reply-To: {}\n\
             Subject: {}\n\
             MIME-Version: 1.0\n\
             Content-Type: {}\n\
             Content-Transfer-Encoding: {}\n\
             X-Mailer: {}/{}\n\
             \n\
             {}",
            self.encode_header(sender_name)?,
            sender,
            message.recipient,
            message.reply_to,
            self.encode_header(&message.subject)?,
            self.content_type(),
            self.content_transfer_encoding(),
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            self.encode_body(&message.body)?,
        ))
    }

    fn encoded_word(&self, text: &str) -> Result<(String, bool), EncodingError> {
        let (bytes, had_unmappable_characters) = match self {
            Charset::Utf8 => (text.to_string(), false),
            Charset::Iso2022Jp => encode_iso_2022_jp(text, "header")?,
        };
        let word = format!(
            "=?{}?B?{}?=",
            self.mime_name(),
            base64::engine::general_purpose::STANDARD.encode(bytes)
        );
        Ok((word, had_unmappable_characters))
    }
}

fn encode_iso_2022_jp(text: &str, part: &'static str) -> Result<(String, bool), EncodingError> {
    let (bytes, _, had_unmappable_characters) = ISO_2022_JP.encode(text);
    String::from_utf8(bytes.into_owned())
        .ok()
        .filter(|encoded| encoded.is_ascii())
        .map(|encoded| (encoded, had_unmappable_characters))
        .ok_or(EncodingError {
            charset: Charset::Iso2022Jp.mime_name(),
            part,
        })
}

fn warn_if_unmappable(had_unmappable_characters: bool, part: &'static str) {
    if had_unmappable_characters {
        tracing::warn!(
            part,
            "Some characters cannot be represented in ISO-2022-JP and were replaced."
        );
    }
}
