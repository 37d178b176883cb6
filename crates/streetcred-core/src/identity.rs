//! # User Identifier
//!
//! Users are identified by the opaque string the auth provider assigns
//! (a UUID in practice). The identifier flows into record-store filters and
//! object-storage paths, so it is restricted to a conservative character set
//! at construction time.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum accepted length of a user identifier.
pub const MAX_USER_ID_LEN: usize = 128;

/// A validated user identifier.
///
/// Accepts ASCII letters, digits, `.`, `_` and `-`. Surrounding whitespace is
/// trimmed. Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and wrap a user identifier.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyUserId);
        }
        if trimmed.len() > MAX_USER_ID_LEN {
            return Err(ValidationError::UserIdTooLong {
                max: MAX_USER_ID_LEN,
            });
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
        if !trimmed.chars().all(allowed) {
            return Err(ValidationError::InvalidUserId(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uuid() {
        let id = UserId::new("30c9d0b1-d84d-43ad-aa72-006cdda9c500").unwrap();
        assert_eq!(id.as_str(), "30c9d0b1-d84d-43ad-aa72-006cdda9c500");
    }

    #[test]
    fn trims_whitespace() {
        let id = UserId::new("  test-user-123 ").unwrap();
        assert_eq!(id.to_string(), "test-user-123");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(UserId::new("   "), Err(ValidationError::EmptyUserId));
    }

    #[test]
    fn rejects_path_and_filter_metacharacters() {
        for bad in ["../etc", "a/b", "x,y", "eq.(1)", "name with space", "quote\""] {
            assert!(
                matches!(UserId::new(bad), Err(ValidationError::InvalidUserId(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong() {
        let long = "a".repeat(MAX_USER_ID_LEN + 1);
        assert!(matches!(
            UserId::new(long),
            Err(ValidationError::UserIdTooLong { .. })
        ));
    }

    #[test]
    fn serde_roundtrip_validates() {
        let id: UserId = serde_json::from_str("\"user-1\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user-1\"");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }
}
