//! Configuration for the waitlist server
//!
//! Every value has a compile-time default and can be overridden at runtime
//! via a dedicated environment variable. The durable store is opt-in: with
//! no `WAITLIST_DATABASE_URL` the server keeps signups in memory for the
//! lifetime of the process.

use std::time::Duration;

/// Default logical database name reported by status queries.
const DEFAULT_DATABASE_NAME: &str = "waitlist";

/// Default timeout for the durable-store handshake (in seconds).
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default lifetime of an idle pooled connection (in seconds).
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 45;

/// Default HTTP listen address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";

/// Connection parameters for the durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurableSettings {
    /// Connection string, e.g. `sqlite:///var/lib/waitlist/waitlist.db`.
    pub url: String,
    pub database_name: String,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl DurableSettings {
    /// Settings for `url` with every other value at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }
}

/// Snapshot of the environment taken at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: Option<DurableSettings>,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> Self {
        let database = get_database_url().map(|url| DurableSettings {
            url,
            database_name: get_database_name(),
            connect_timeout: Duration::from_secs(get_connect_timeout_secs()),
            idle_timeout: Duration::from_secs(get_idle_timeout_secs()),
        });

        Self {
            database,
            bind_addr: get_bind_addr(),
        }
    }
}

/// Get the durable-store connection string.
///
/// Returns `None` when `WAITLIST_DATABASE_URL` is unset or blank.
pub fn get_database_url() -> Option<String> {
    std::env::var("WAITLIST_DATABASE_URL")
        .ok()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Get the logical database name.
///
/// Priority:
/// 1. `WAITLIST_DATABASE_NAME` env variable if set and not blank
/// 2. `waitlist` as fallback
pub fn get_database_name() -> String {
    if let Ok(name) = std::env::var("WAITLIST_DATABASE_NAME") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }

    DEFAULT_DATABASE_NAME.to_string()
}

/// Get the connect timeout in seconds.
///
/// Priority:
/// 1. `WAITLIST_CONNECT_TIMEOUT_SECS` env variable if set (falls back to
///    default if the value cannot be parsed as a `u64`)
/// 2. `5` seconds as fallback
pub fn get_connect_timeout_secs() -> u64 {
    if let Ok(timeout) = std::env::var("WAITLIST_CONNECT_TIMEOUT_SECS") {
        return timeout.parse().unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    DEFAULT_CONNECT_TIMEOUT_SECS
}

/// Get the idle-connection timeout in seconds.
///
/// Priority:
/// 1. `WAITLIST_IDLE_TIMEOUT_SECS` env variable if set (falls back to
///    default if the value cannot be parsed as a `u64`)
/// 2. `45` seconds as fallback
pub fn get_idle_timeout_secs() -> u64 {
    if let Ok(timeout) = std::env::var("WAITLIST_IDLE_TIMEOUT_SECS") {
        return timeout.parse().unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS);
    }

    DEFAULT_IDLE_TIMEOUT_SECS
}

/// Get the HTTP listen address.
///
/// Priority:
/// 1. `WAITLIST_BIND_ADDR` env variable if set
/// 2. `127.0.0.1:3001` as fallback
pub fn get_bind_addr() -> String {
    if let Ok(addr) = std::env::var("WAITLIST_BIND_ADDR") {
        return addr;
    }

    DEFAULT_BIND_ADDR.to_string()
}
