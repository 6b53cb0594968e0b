//! Validated subscriber email addresses.
//!
//! Every address headed for the subscriber store or the mail transport goes
//! through [`EmailAddress::parse`], so invalid input is rejected at the
//! boundary and never persisted.

use serde::{Serialize, Serializer};
use validator::ValidateEmail;

use crate::error::AppError;

/// A syntactically valid, normalised (trimmed, lowercase) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let candidate = raw.trim().to_lowercase();

        if candidate.is_empty() {
            return Err(AppError::InvalidEmail("email address is empty".to_string()));
        }

        if !candidate.validate_email() {
            return Err(AppError::InvalidEmail(format!(
                "'{}' is not a valid email address",
                raw.trim()
            )));
        }

        Ok(Self(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for EmailAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
