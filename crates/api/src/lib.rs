//! HTTP API: server, routing, and request/response mapping for `/_contacts`.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
