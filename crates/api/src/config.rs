//! Process configuration, read once from the environment at startup.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `JWT_SECRET` | `dev-secret` (with a warning) | HS256 secret for bearer tokens |
//! | `BIND_ADDR` | `0.0.0.0:8080` | listen address |
//! | `COUCHDB_URL` | unset → in-memory store | CouchDB server base URL |
//! | `COUCHDB_USER` / `COUCHDB_PASSWORD` | unset | basic auth for CouchDB |
//! | `CONTACTS_DB` | `contacts` | database name |

use std::net::SocketAddr;

use contacts_infra::document_store::CouchDbConfig;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATABASE: &str = "contacts";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid BIND_ADDR {0:?}: {1}")]
    BindAddr(String, std::net::AddrParseError),

    #[error("invalid COUCHDB_URL {0:?}: {1}")]
    CouchDbUrl(String, url::ParseError),
}

/// Which document store backs the service.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    InMemory,
    CouchDb(CouchDbConfig),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::BindAddr(bind_raw.clone(), e))?;

        let store = match get("COUCHDB_URL") {
            Some(raw) => {
                let url = Url::parse(&raw).map_err(|e| ConfigError::CouchDbUrl(raw.clone(), e))?;
                StoreConfig::CouchDb(CouchDbConfig {
                    url,
                    database: get("CONTACTS_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                    username: get("COUCHDB_USER"),
                    password: get("COUCHDB_PASSWORD"),
                })
            }
            None => {
                tracing::warn!("COUCHDB_URL not set; contacts are kept in memory");
                StoreConfig::InMemory
            }
        };

        Ok(Self {
            jwt_secret,
            bind_addr,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_in_memory_dev_setup() {
        let cfg = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(matches!(cfg.store, StoreConfig::InMemory));
    }

    #[test]
    fn couchdb_settings_are_collected() {
        let cfg = ApiConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("COUCHDB_URL", "http://couch:5984"),
            ("COUCHDB_USER", "admin"),
            ("COUCHDB_PASSWORD", "pw"),
        ]))
        .unwrap();

        assert_eq!(cfg.jwt_secret, "s");
        assert_eq!(cfg.bind_addr.port(), 9000);
        let StoreConfig::CouchDb(couch) = cfg.store else {
            panic!("expected CouchDB store config");
        };
        assert_eq!(couch.url.as_str(), "http://couch:5984/");
        assert_eq!(couch.database, DEFAULT_DATABASE);
        assert_eq!(couch.username.as_deref(), Some("admin"));
        assert_eq!(couch.password.as_deref(), Some("pw"));
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("BIND_ADDR", "nope")])),
            Err(ConfigError::BindAddr(..))
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("COUCHDB_URL", "not a url")])),
            Err(ConfigError::CouchDbUrl(..))
        ));
    }
}
