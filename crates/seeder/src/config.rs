//! Connection parameters and the competition data file.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::SeedError;
use crate::models::Answer;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_DB_PASSWORD: &str = "";
pub const DEFAULT_DB_NAME: &str = "matemattici_competition";

/// Where to connect, resolved once at startup.
///
/// Resolution order, later sources winning: built-in defaults, the `database`
/// object of the data file, then the `DB_*` environment variables.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_DB_PASSWORD.to_string(),
            database: DEFAULT_DB_NAME.to_string(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mysql://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl ConnectionConfig {
    /// Resolves the configuration from defaults, optional file overrides and
    /// the process environment.
    pub fn resolve(file: Option<&ConnectionOverrides>) -> Result<Self, SeedError> {
        Self::resolve_with(file, |key| std::env::var(key).ok())
    }

    /// Same as [`ConnectionConfig::resolve`] with an explicit variable lookup.
    pub fn resolve_with<F>(file: Option<&ConnectionOverrides>, lookup: F) -> Result<Self, SeedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(overrides) = file {
            config.apply(overrides);
        }
        config.apply(&ConnectionOverrides::from_lookup(lookup)?);
        Ok(config)
    }

    fn apply(&mut self, overrides: &ConnectionOverrides) {
        if let Some(host) = &overrides.host {
            self.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(user) = &overrides.user {
            self.user = user.clone();
        }
        if let Some(password) = &overrides.password {
            self.password = password.clone();
        }
        if let Some(database) = &overrides.database {
            self.database = database.clone();
        }
    }
}

/// A partial [`ConnectionConfig`]; unset fields leave the lower layer alone.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl fmt::Debug for ConnectionOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOverrides")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionOverrides {
    /// Reads `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD` and `DB_NAME`.
    /// A variable set to the empty string still counts as set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SeedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("DB_PORT") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| SeedError::Config(format!("DB_PORT is not a port: {raw:?}")))?,
            ),
            None => None,
        };

        Ok(Self {
            host: lookup("DB_HOST"),
            port,
            user: lookup("DB_USER"),
            password: lookup("DB_PASSWORD"),
            database: lookup("DB_NAME"),
        })
    }
}

/// Contents of `competition_data.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionFile {
    pub id: i64,
    pub start_timestamp: String,
    pub end_timestamp: String,
    pub problems: Vec<ProblemEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<ConnectionOverrides>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemEntry {
    pub id: i64,
    pub number: i64,
    pub answer: Answer,
}

impl CompetitionFile {
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SeedError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
            .map_err(|e| SeedError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
