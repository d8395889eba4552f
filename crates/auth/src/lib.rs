//! `contacts-auth`: authentication boundary for the contacts service.
//!
//! This crate is decoupled from HTTP and storage: it turns a bearer token into
//! a [`Caller`] (stable `uid` + admin flag) and nothing more.

pub mod caller;
pub mod claims;
pub mod jwt;
pub mod roles;

pub use caller::Caller;
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use roles::Role;
