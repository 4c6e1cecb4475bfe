//! Value objects for the order domain.

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::ValidationError;

/// Maximum length of the text columns of orders and items.
pub const MAX_FIELD_LENGTH: usize = 254;

/// A syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parses an email address.
    ///
    /// Surrounding whitespace is trimmed. The address must pass
    /// [`ValidateEmail`] and name a dotted host: single-label hosts and
    /// address literals are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let value = value.as_ref().trim();
        let invalid = || ValidationError::InvalidEmail(value.to_string());

        if value.is_empty() {
            return Err(ValidationError::EmptyField { field: "email" });
        }
        if value.chars().count() > MAX_FIELD_LENGTH {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_FIELD_LENGTH,
            });
        }
        if !value.validate_email() {
            return Err(invalid());
        }

        let (_, domain) = value.rsplit_once('@').ok_or_else(invalid)?;
        if domain.starts_with('[') || !domain.contains('.') {
            return Err(invalid());
        }

        Ok(Self(value.to_string()))
    }

    /// Wraps an address read back from the store.
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validates a required text field, returning it trimmed.
pub(crate) fn required_text(
    field: &'static str,
    value: impl AsRef<str>,
) -> Result<String, ValidationError> {
    let value = value.as_ref().trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if value.chars().count() > MAX_FIELD_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(value.to_string())
}
