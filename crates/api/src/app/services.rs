use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Value as JsonValue, json};
use thiserror::Error;
use tracing::{debug, instrument};

use contacts_auth::Caller;
use contacts_core::{
    CONTACT_TYPE, Contact, ContactDocument, ContactId, ContactKey, ContactProfile, DomainError,
    KEY_PREFIX, KEY_RANGE_END,
};
use contacts_infra::bootstrap::BY_OWNER_INDEX;
use contacts_infra::document_store::{
    CouchDbStore, DocumentStore, InMemoryDocumentStore, KeyRange, PutResponse, StoreError,
    tombstone,
};

use crate::config::StoreConfig;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Build the configured document store.
pub fn build_store(config: &StoreConfig) -> Arc<dyn DocumentStore> {
    match config {
        StoreConfig::InMemory => Arc::new(InMemoryDocumentStore::new()),
        StoreConfig::CouchDb(couch) => {
            tracing::info!(url = %couch.url, database = %couch.database, "using CouchDB document store");
            Arc::new(CouchDbStore::new(couch.clone()))
        }
    }
}

/// Contact operations: one store round trip each.
///
/// Every key is derived from the caller's own `uid`, so a caller can only ever
/// address its own namespace. The admin override applies to [`Self::list`] only.
#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn DocumentStore>,
}

impl ContactService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[cfg(test)]
    fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// All contacts for admins, the caller's own otherwise.
    #[instrument(skip(self, caller), fields(owner = %caller.uid(), admin = caller.is_admin()))]
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Contact>, ServiceError> {
        let docs = if caller.is_admin() {
            self.store
                .all_docs(&KeyRange::new(KEY_PREFIX, KEY_RANGE_END))
                .await?
        } else {
            let key = json!([caller.uid().as_str(), CONTACT_TYPE]);
            self.store.query(BY_OWNER_INDEX, &key).await?
        };

        docs.into_iter().map(to_contact).collect()
    }

    #[instrument(skip(self, caller), fields(owner = %caller.uid()))]
    pub async fn get(&self, caller: &Caller, id: ContactId) -> Result<Contact, ServiceError> {
        let key = ContactKey::new(caller.uid().clone(), id);
        let doc = self.store.get(&key.as_storage_key()).await?;
        to_contact(doc)
    }

    /// Create or fully replace a contact. `rev` must name the current revision
    /// when the contact already exists.
    #[instrument(skip(self, caller, profile), fields(owner = %caller.uid()))]
    pub async fn put(
        &self,
        caller: &Caller,
        id: ContactId,
        profile: ContactProfile,
        rev: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PutResponse, ServiceError> {
        profile.validate()?;

        let key = ContactKey::new(caller.uid().clone(), id);
        let mut doc = ContactDocument::new(&key, profile, now);
        doc.rev = rev;

        let res = self.store.put(&key.as_storage_key(), doc.to_json()?).await?;
        debug!(key = %res.id, rev = %res.rev, "contact written");
        Ok(res)
    }

    /// Tombstone the caller's contact at revision `rev`.
    #[instrument(skip(self, caller), fields(owner = %caller.uid()))]
    pub async fn remove(&self, caller: &Caller, id: ContactId, rev: String) -> Result<PutResponse, ServiceError> {
        if rev.is_empty() {
            return Err(DomainError::validation("\"rev\" is not allowed to be empty").into());
        }

        let key = ContactKey::new(caller.uid().clone(), id).as_storage_key();
        let res = self.store.put(&key, tombstone(&key, &rev)).await?;
        debug!(key = %res.id, rev = %res.rev, "contact deleted");
        Ok(res)
    }
}

fn to_contact(doc: JsonValue) -> Result<Contact, ServiceError> {
    Ok(ContactDocument::from_json(doc)?.into_contact()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contacts_core::OwnerId;

    fn caller(uid: &str, admin: bool) -> Caller {
        Caller::new(OwnerId::new(uid).unwrap(), admin)
    }

    fn cid(id: &str) -> ContactId {
        ContactId::new(id).unwrap()
    }

    fn profile(given: &str) -> ContactProfile {
        ContactProfile {
            given_name: given.to_string(),
            family_name: "B".to_string(),
            org: None,
            email: "a@b.com".to_string(),
            tel: "1".to_string(),
            street_address: "x".to_string(),
            locality: "y".to_string(),
            region: "z".to_string(),
            post_code: "0".to_string(),
            country: "US".to_string(),
        }
    }

    async fn service() -> ContactService {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        contacts_infra::register(store.as_ref()).await.unwrap();
        ContactService::new(store)
    }

    #[tokio::test]
    async fn put_then_get_returns_stamped_record() {
        let svc = service().await;
        let u1 = caller("u1", false);
        let now = Utc::now();

        let res = svc.put(&u1, cid("c1"), profile("A"), None, now).await.unwrap();
        assert_eq!(res.id, "contact/u1/c1");

        let contact = svc.get(&u1, cid("c1")).await.unwrap();
        assert_eq!(contact.id, "c1");
        assert_eq!(contact.owner, "u1");
        assert_eq!(contact.doc_type, "contact");
        assert_eq!(contact.rev, res.rev);
        assert_eq!(contact.created_at, now);
        assert_eq!(contact.profile, profile("A"));
    }

    #[tokio::test]
    async fn invalid_profile_never_reaches_the_store() {
        let svc = service().await;
        let mut p = profile("A");
        p.email = "nope".to_string();

        let err = svc.put(&caller("u1", false), cid("c1"), p, None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert!(svc.store().get("contact/u1/c1").await.is_err());
    }

    #[tokio::test]
    async fn update_resets_created_at() {
        let svc = service().await;
        let u1 = caller("u1", false);
        let first = Utc::now();
        let res = svc.put(&u1, cid("c1"), profile("A"), None, first).await.unwrap();

        let later = first + chrono::Duration::seconds(30);
        svc.put(&u1, cid("c1"), profile("Z"), Some(res.rev), later).await.unwrap();

        let contact = svc.get(&u1, cid("c1")).await.unwrap();
        assert_eq!(contact.created_at, later);
        assert_eq!(contact.profile.given_name, "Z");
    }

    #[tokio::test]
    async fn list_scopes_by_owner_unless_admin() {
        let svc = service().await;
        for (owner, id) in [("u1", "a"), ("u1", "b"), ("u2", "a"), ("u3", "c")] {
            svc.put(&caller(owner, false), cid(id), profile(owner), None, Utc::now())
                .await
                .unwrap();
        }

        let mine = svc.list(&caller("u1", false)).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|c| c.owner == "u1"));

        let all = svc.list(&caller("root", true)).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn get_has_no_admin_override() {
        let svc = service().await;
        svc.put(&caller("u1", false), cid("c1"), profile("A"), None, Utc::now())
            .await
            .unwrap();

        let err = svc.get(&caller("root", true), cid("c1")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn remove_requires_current_revision() {
        let svc = service().await;
        let u1 = caller("u1", false);
        let res = svc.put(&u1, cid("c1"), profile("A"), None, Utc::now()).await.unwrap();

        let err = svc.remove(&u1, cid("c1"), "1-stale".to_string()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Conflict(_))));
        assert!(svc.get(&u1, cid("c1")).await.is_ok());

        let gone = svc.remove(&u1, cid("c1"), res.rev).await.unwrap();
        assert!(gone.ok);
        assert!(matches!(
            svc.get(&u1, cid("c1")).await.unwrap_err(),
            ServiceError::Store(StoreError::NotFound(_))
        ));
    }
}
