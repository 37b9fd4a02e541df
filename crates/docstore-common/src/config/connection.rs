//! Connection configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::ENV_PREFIX;
use crate::error::{StoreError, StoreResult};

/// Connection configuration as supplied by the caller.
///
/// Every field is required by `Session::init`; they are optional here so a
/// partially filled config can report exactly which field is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Engine host.
    #[serde(default)]
    pub host: Option<String>,
    /// Engine port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Default database for unqualified table names.
    #[serde(default)]
    pub database: Option<String>,
    /// Username.
    #[serde(default)]
    pub user: Option<String>,
    /// Password (never written back out).
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

/// A fully populated connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Engine host.
    pub host: String,
    /// Engine port.
    pub port: u16,
    /// Default database.
    pub database: String,
    /// Username.
    pub user: String,
    /// Password.
    pub password: String,
}

impl ConnectionParams {
    /// Returns `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ConnectionConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the database name.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the username.
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Checks that every field is present, naming the first missing one.
    pub fn validated(&self) -> StoreResult<ConnectionParams> {
        fn required<T: Clone>(value: Option<&T>, field: &str) -> StoreResult<T> {
            value.cloned().ok_or_else(|| StoreError::InvalidConfig {
                field: field.to_string(),
                message: format!("{field} is required"),
            })
        }

        Ok(ConnectionParams {
            host: required(self.host.as_ref(), "host")?,
            port: required(self.port.as_ref(), "port")?,
            user: required(self.user.as_ref(), "user")?,
            password: required(self.password.as_ref(), "password")?,
            database: required(self.database.as_ref(), "database")?,
        })
    }

    /// Reads `DOCSTORE_HOST`, `DOCSTORE_PORT`, `DOCSTORE_DATABASE`,
    /// `DOCSTORE_USER` and `DOCSTORE_PASSWORD`. Unset variables stay `None`.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any `DOCSTORE_*` key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        let port = match var("PORT") {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|e| {
                StoreError::InvalidConfig {
                    field: "port".to_string(),
                    message: format!("invalid port '{raw}': {e}"),
                }
            })?),
            None => None,
        };

        Ok(Self {
            host: var("HOST"),
            port,
            database: var("DATABASE"),
            user: var("USER"),
            password: var("PASSWORD"),
        })
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| file_error(path, &e))?;
        toml::from_str(&content).map_err(|e| file_error(path, &e))
    }

    /// Saves configuration to a TOML file, without the password.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| file_error(path, &e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| file_error(path, &e))?;
        }

        std::fs::write(path, content).map_err(|e| file_error(path, &e))
    }

    /// Fills every unset field from `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            host: self.host.or(other.host),
            port: self.port.or(other.port),
            database: self.database.or(other.database),
            user: self.user.or(other.user),
            password: self.password.or(other.password),
        }
    }
}

fn file_error(path: &Path, err: &dyn std::fmt::Display) -> StoreError {
    StoreError::InvalidConfig {
        field: "file".to_string(),
        message: format!("{}: {err}", path.display()),
    }
}
