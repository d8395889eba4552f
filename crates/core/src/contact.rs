//! Contact records: the profile a client sends, the document the store holds,
//! and the record a client gets back.
//!
//! ## Storage keys
//!
//! Every contact lives at `contact/{owner}/{id}`. The owner segment is what
//! namespaces contacts per user at the storage layer, so two owners may reuse
//! the same `id`. All contact keys sort inside `[contact/, contact0)` because
//! `0` is the byte after `/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{ContactId, OwnerId};

/// Discriminator stored in every contact document's `type` field.
pub const CONTACT_TYPE: &str = "contact";

/// Prefix shared by all contact storage keys (inclusive range start).
pub const KEY_PREFIX: &str = "contact/";

/// Exclusive upper bound of the contact key range.
pub const KEY_RANGE_END: &str = "contact0";

/// Composite storage key `contact/{owner}/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactKey {
    owner: OwnerId,
    id: ContactId,
}

impl ContactKey {
    pub fn new(owner: OwnerId, id: ContactId) -> Self {
        Self { owner, id }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn id(&self) -> &ContactId {
        &self.id
    }

    /// The raw (unescaped) storage key.
    pub fn as_storage_key(&self) -> String {
        format!("{KEY_PREFIX}{}/{}", self.owner, self.id)
    }

    /// Decompose a raw storage key back into owner and id.
    ///
    /// Owner ids never contain `/`, so the owner is everything up to the first
    /// `/` after the prefix and the rest is the id (which may contain `/`).
    pub fn parse(key: &str) -> DomainResult<Self> {
        let rest = key
            .strip_prefix(KEY_PREFIX)
            .ok_or_else(|| DomainError::invalid_id(format!("not a contact key: {key}")))?;
        let (owner, id) = rest
            .split_once('/')
            .ok_or_else(|| DomainError::invalid_id(format!("contact key has no id segment: {key}")))?;
        Ok(Self::new(OwnerId::new(owner)?, ContactId::new(id)?))
    }
}

impl core::fmt::Display for ContactKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{KEY_PREFIX}{}/{}", self.owner, self.id)
    }
}

/// Profile fields a client may set. `org` is the only optional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactProfile {
    pub given_name: String,
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    pub email: String,
    pub tel: String,
    pub street_address: String,
    pub locality: String,
    pub region: String,
    pub post_code: String,
    pub country: String,
}

impl ContactProfile {
    /// Validate field contents: required strings non-empty, `org` non-empty
    /// when present, `email` shaped like an address.
    pub fn validate(&self) -> DomainResult<()> {
        let required = [
            ("givenName", &self.given_name),
            ("familyName", &self.family_name),
            ("email", &self.email),
            ("tel", &self.tel),
            ("streetAddress", &self.street_address),
            ("locality", &self.locality),
            ("region", &self.region),
            ("postCode", &self.post_code),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(DomainError::validation(format!("\"{field}\" is not allowed to be empty")));
            }
        }

        if matches!(&self.org, Some(org) if org.is_empty()) {
            return Err(DomainError::validation("\"org\" is not allowed to be empty"));
        }

        if !is_valid_email(&self.email) {
            return Err(DomainError::validation("\"email\" must be a valid email"));
        }

        Ok(())
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Domain must be dotted labels, none empty.
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// A contact as persisted in the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDocument {
    #[serde(rename = "_id")]
    pub key: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub profile: ContactProfile,
}

impl ContactDocument {
    /// Stamp a profile into a fresh document for `key`.
    ///
    /// Owner and type come from the key and the domain, never from the client.
    /// `createdAt` is set to `now` on every write, updates included.
    pub fn new(key: &ContactKey, profile: ContactProfile, now: DateTime<Utc>) -> Self {
        Self {
            key: key.as_storage_key(),
            rev: None,
            doc_type: CONTACT_TYPE.to_string(),
            owner: key.owner().to_string(),
            created_at: now,
            profile,
        }
    }

    /// Parse a raw store document. Store bookkeeping fields (`_deleted_conflicts`
    /// and friends) are ignored.
    pub fn from_json(doc: serde_json::Value) -> DomainResult<Self> {
        serde_json::from_value(doc).map_err(|e| DomainError::malformed(e.to_string()))
    }

    pub fn to_json(&self) -> DomainResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| DomainError::malformed(e.to_string()))
    }

    /// Shape for clients: composite key replaced by the plain id.
    pub fn into_contact(self) -> DomainResult<Contact> {
        let key = ContactKey::parse(&self.key).map_err(|e| DomainError::malformed(e.to_string()))?;
        if key.owner().as_str() != self.owner {
            return Err(DomainError::malformed(format!(
                "{} is not keyed under owner {}",
                self.key, self.owner
            )));
        }
        let id = key.id.into_inner();
        let rev = self
            .rev
            .ok_or_else(|| DomainError::malformed(format!("{} has no revision", self.key)))?;
        Ok(Contact {
            id,
            rev,
            doc_type: self.doc_type,
            owner: self.owner,
            created_at: self.created_at,
            profile: self.profile,
        })
    }
}

/// A contact as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    #[serde(rename = "_rev")]
    pub rev: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub profile: ContactProfile,
}
