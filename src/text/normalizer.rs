use serde::Serialize;

use crate::error::ValidationError;

/// Punctuation kept alongside ASCII letters, digits and whitespace.
const ALLOWED_PUNCTUATION: &str = ".,!?'\"";

/// Input text restricted to the character class the synthesis backends accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizedText {
    raw: String,
    cleaned: String,
    #[serde(skip)]
    reason: Option<ValidationError>,
}

impl SanitizedText {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    pub fn is_valid(&self) -> bool {
        self.reason.is_none()
    }

    /// Why the text was rejected, if it was.
    pub fn reason(&self) -> Option<&ValidationError> {
        self.reason.as_ref()
    }

    /// Valid text or the reason it is not.
    pub fn into_valid(self) -> Result<Self, ValidationError> {
        match self.reason {
            Some(reason) => Err(reason),
            None => Ok(self),
        }
    }
}

pub fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(c)
}

/// Strip every character outside the allowed class.
///
/// Characters are deleted, never replaced, and surrounding whitespace is left
/// exactly as it was.
pub fn normalize(raw: &str) -> SanitizedText {
    if raw.is_empty() {
        return SanitizedText {
            raw: String::new(),
            cleaned: String::new(),
            reason: Some(ValidationError::Empty),
        };
    }

    let cleaned: String = raw.chars().filter(|c| is_allowed(*c)).collect();
    let reason = cleaned.is_empty().then_some(ValidationError::NoValidCharacters);

    SanitizedText {
        raw: raw.to_string(),
        cleaned,
        reason,
    }
}
