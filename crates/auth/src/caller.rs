use contacts_core::OwnerId;

use crate::JwtClaims;

/// The authenticated caller of a request.
///
/// `uid` is the stable identity that owns contacts; `is_admin` unlocks the
/// cross-owner listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    uid: OwnerId,
    is_admin: bool,
}

impl Caller {
    pub fn new(uid: OwnerId, is_admin: bool) -> Self {
        Self { uid, is_admin }
    }

    pub fn uid(&self) -> &OwnerId {
        &self.uid
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

impl TryFrom<&JwtClaims> for Caller {
    type Error = contacts_core::DomainError;

    fn try_from(claims: &JwtClaims) -> Result<Self, Self::Error> {
        Ok(Self::new(OwnerId::new(claims.sub.clone())?, claims.is_admin()))
    }
}
