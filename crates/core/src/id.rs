//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identity of the user owning a contact (the authenticated `uid`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

/// Caller-supplied contact identifier, unique within an owner's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal, $check:expr) => {
        impl $t {
            /// Create an identifier, rejecting the empty string and anything
            /// the type's own rule refuses.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: must not be empty", $name)));
                }
                $check(&value).map_err(|reason| DomainError::invalid_id(format!("{}: {reason}", $name)))?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

/// The owner is the one storage-key segment that separates namespaces, so it
/// may not contain the separator itself.
fn single_key_segment(value: &str) -> Result<(), &'static str> {
    if value.contains('/') {
        return Err("must not contain '/'");
    }
    Ok(())
}

fn any_text(_: &str) -> Result<(), &'static str> {
    Ok(())
}

impl_string_newtype!(OwnerId, "OwnerId", single_key_segment);
impl_string_newtype!(ContactId, "ContactId", any_text);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ids_are_rejected() {
        assert!(matches!(OwnerId::new(""), Err(DomainError::InvalidId(_))));
        assert!(matches!("".parse::<ContactId>(), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn owner_ids_are_a_single_key_segment() {
        assert!(matches!(OwnerId::new("u1/x"), Err(DomainError::InvalidId(_))));
        assert!(matches!("/".parse::<OwnerId>(), Err(DomainError::InvalidId(_))));
        assert!(OwnerId::new("user@example.com").is_ok());
    }

    #[test]
    fn contact_ids_may_contain_slashes() {
        assert_eq!(ContactId::new("x/y").unwrap().as_str(), "x/y");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ContactId::new("c1").unwrap();
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("c1"));
        assert_eq!(id.to_string(), "c1");
    }
}
