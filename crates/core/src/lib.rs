//! `contacts-core`: domain building blocks for the contacts resource.
//!
//! This crate contains **pure domain** types (no IO, no HTTP, no storage).

pub mod contact;
pub mod error;
pub mod id;

pub use contact::{
    CONTACT_TYPE, Contact, ContactDocument, ContactKey, ContactProfile, KEY_PREFIX, KEY_RANGE_END,
};
pub use error::{DomainError, DomainResult};
pub use id::{ContactId, OwnerId};
