//! One-time registration of the contacts database.
//!
//! Run at service start, before routes are mounted. Every step is idempotent
//! and any failure is fatal to startup.

use serde_json::{Value as JsonValue, json};
use tracing::{info, instrument};

use crate::document_store::{
    DocumentStore, IndexDefinition, SecurityGroup, SecurityObject, StoreError, UpdateValidator,
};

/// Role allowed to administer and read the database directly.
pub const DATABASE_ADMIN_ROLE: &str = "_admin";

/// Secondary index mapping `[owner, type]` to the document.
pub const BY_OWNER_INDEX: &str = "by_owner";

/// Name under which the type check is installed.
pub const TYPE_VALIDATOR: &str = "require_type";

const REQUIRE_TYPE_SOURCE: &str = r#"function (newDoc, oldDoc, userCtx, secObj) {
  if (newDoc._deleted) {
    return;
  }
  if (typeof newDoc.type !== 'string') {
    throw ({ forbidden: 'doc.type must be a string' });
  }
}"#;

const BY_OWNER_MAP_SOURCE: &str = r#"function (doc) {
  emit([doc.owner, doc.type], doc);
}"#;

fn require_type(doc: &JsonValue) -> Result<(), String> {
    if doc.get("_deleted").and_then(JsonValue::as_bool).unwrap_or(false) {
        return Ok(());
    }
    match doc.get("type") {
        Some(JsonValue::String(_)) => Ok(()),
        _ => Err("doc.type must be a string".to_string()),
    }
}

fn emit_by_owner(doc: &JsonValue) -> Option<(JsonValue, JsonValue)> {
    let field = |name: &str| doc.get(name).cloned().unwrap_or(JsonValue::Null);
    Some((json!([field("owner"), field("type")]), doc.clone()))
}

/// Admins and members both restricted to [`DATABASE_ADMIN_ROLE`].
pub fn security() -> SecurityObject {
    let admin_only = SecurityGroup {
        names: vec![],
        roles: vec![DATABASE_ADMIN_ROLE.to_string()],
    };
    SecurityObject {
        admins: admin_only.clone(),
        members: admin_only,
    }
}

/// Rejects any non-deleted write lacking a string `type`.
pub fn type_validator() -> UpdateValidator {
    UpdateValidator {
        name: TYPE_VALIDATOR,
        source: REQUIRE_TYPE_SOURCE,
        check: require_type,
    }
}

pub fn by_owner_index() -> IndexDefinition {
    IndexDefinition {
        name: BY_OWNER_INDEX,
        map_source: BY_OWNER_MAP_SOURCE,
        emit: emit_by_owner,
    }
}

/// Ensure the database exists, lock it down, install the type validator and
/// build the `by_owner` index.
#[instrument(skip(store))]
pub async fn register(store: &dyn DocumentStore) -> Result<(), StoreError> {
    store.ensure_database().await?;
    store.set_security(&security()).await?;
    store.set_validator(&type_validator()).await?;
    store.define_index(&by_owner_index()).await?;

    info!(index = BY_OWNER_INDEX, validator = TYPE_VALIDATOR, "contacts database registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::InMemoryDocumentStore;

    #[test]
    fn validator_skips_tombstones() {
        assert_eq!(require_type(&json!({ "_deleted": true })), Ok(()));
        assert_eq!(require_type(&json!({ "type": "contact" })), Ok(()));
        assert!(require_type(&json!({ "type": null })).is_err());
        assert!(require_type(&json!({})).is_err());
    }

    #[test]
    fn by_owner_emits_owner_type_pair() {
        let doc = json!({ "_id": "contact/u1/c1", "owner": "u1", "type": "contact" });
        let (key, value) = emit_by_owner(&doc).unwrap();
        assert_eq!(key, json!(["u1", "contact"]));
        assert_eq!(value, doc);

        let (key, _) = emit_by_owner(&json!({ "type": "contact" })).unwrap();
        assert_eq!(key, json!([null, "contact"]));
    }

    #[test]
    fn security_restricts_both_tiers_to_admin_role() {
        let sec = security();
        assert_eq!(sec.admins.roles, vec!["_admin"]);
        assert_eq!(sec.members, sec.admins);
    }

    #[tokio::test]
    async fn register_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        register(&store).await.unwrap();
        store.put("contact/u1/c1", json!({ "type": "contact", "owner": "u1" })).await.unwrap();

        register(&store).await.unwrap();

        assert_eq!(store.security(), Some(security()));
        assert_eq!(store.design(), (vec![TYPE_VALIDATOR], vec![BY_OWNER_INDEX]));
        // Existing data survives a second registration.
        assert!(store.get("contact/u1/c1").await.is_ok());
    }
}
