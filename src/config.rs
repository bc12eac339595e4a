//! Server configuration read from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `KANBAN_HTTP_ADDR` | `0.0.0.0:3000` | listen address |
//! | `KANBAN_DB_PATH` | unset | SQLite file the board is loaded from and synced to |
//! | `KANBAN_SPRINT_JSON` | unset | sprint record used to seed an empty store |

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const ADDR_VAR: &str = "KANBAN_HTTP_ADDR";
pub const DB_PATH_VAR: &str = "KANBAN_DB_PATH";
pub const SPRINT_JSON_VAR: &str = "KANBAN_SPRINT_JSON";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var} '{value}': {source}")]
    InvalidAddr {
        var: &'static str,
        value: String,
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db_path: Option<PathBuf>,
    pub sprint_json: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup. Blank
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let raw_addr = get(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = raw_addr
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidAddr {
                var: ADDR_VAR,
                value: raw_addr.clone(),
                source,
            })?;
        Ok(Self {
            addr,
            db_path: get(DB_PATH_VAR).map(PathBuf::from),
            sprint_json: get(SPRINT_JSON_VAR).map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr, DEFAULT_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.db_path, None);
        assert_eq!(config.sprint_json, None);
    }

    #[test]
    fn values_are_read_and_blank_ones_ignored() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ADDR_VAR, "127.0.0.1:8080"),
            (DB_PATH_VAR, "/tmp/board.db"),
            (SPRINT_JSON_VAR, "  "),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/board.db")));
        assert_eq!(config.sprint_json, None);
    }

    #[test]
    fn bad_address_is_reported() {
        let err = ServerConfig::from_lookup(lookup(&[(ADDR_VAR, "not-an-addr")])).unwrap_err();
        assert!(err.to_string().contains(ADDR_VAR));
    }
}
