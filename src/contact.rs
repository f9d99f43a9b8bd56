use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Rejections shown inline under the capture form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Please enter your email.")]
    EmptyInput,
    #[error("Please enter a valid email address.")]
    InvalidEmailShape,
}

/// An email address that passed the shape check. Always trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CapturedContact(String);

impl CapturedContact {
    pub fn parse(raw: &str) -> Result<Self, CaptureError> {
        validate_email(raw).map(|email| Self(email.to_string()))
    }

    pub fn email(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapturedContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CapturedContact {
    type Error = CaptureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CapturedContact> for String {
    fn from(contact: CapturedContact) -> Self {
        contact.0
    }
}

fn email_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email shape pattern should compile")
    })
}

/// Trims `raw` and checks it is `local@domain.tld` shaped.
///
/// Only the shape is checked; nothing here says the mailbox exists.
pub fn validate_email(raw: &str) -> Result<&str, CaptureError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CaptureError::EmptyInput);
    }
    if !email_shape().is_match(trimmed) {
        return Err(CaptureError::InvalidEmailShape);
    }
    Ok(trimmed)
}
