//! Document store boundary.
//!
//! The service consumes a document database through a narrow contract:
//! get-by-key, put-by-key (optimistic concurrency via revision tokens),
//! key-range scans and secondary-index queries, plus the one-time setup calls
//! used by [`crate::bootstrap`].

pub mod couchdb;
pub mod in_memory;
pub mod r#trait;

pub use couchdb::{CouchDbConfig, CouchDbStore};
pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{
    DocumentStore, IndexDefinition, KeyRange, PutResponse, SecurityGroup, SecurityObject,
    StoreError, UpdateValidator, tombstone,
};
