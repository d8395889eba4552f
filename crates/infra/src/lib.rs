//! Infrastructure layer: document store clients and startup registration.

pub mod bootstrap;
pub mod document_store;

pub use bootstrap::register;
pub use document_store::{DocumentStore, KeyRange, PutResponse, StoreError};
