//! Structured options for building a database probe.
//!
//! Field names follow the probe configuration keys (`user`, `password`,
//! `databaseUrl`, `driverClassName`, `queries`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::query::QuerySet;
use crate::source::ConnectionSettings;

fn default_driver() -> String {
    "libsql".to_string()
}

/// Queries as written in configuration: either a JSON-encoded array of
/// objects or a plain list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuerySource {
    List(Vec<String>),
    Encoded(String),
}

impl QuerySource {
    pub fn to_query_set(&self) -> Result<QuerySet, ConfigError> {
        match self {
            QuerySource::List(queries) => Ok(queries.iter().cloned().collect()),
            QuerySource::Encoded(encoded) => QuerySet::from_json(encoded),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseOptions {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database_url: String,
    #[serde(default = "default_driver")]
    pub driver_class_name: String,
    pub queries: QuerySource,
}

impl DatabaseOptions {
    pub fn settings(&self) -> Result<ConnectionSettings, ConfigError> {
        Ok(ConnectionSettings::new(
            self.user.clone(),
            self.password.clone(),
            self.database_url.clone(),
            self.driver_class_name.parse()?,
        ))
    }

    pub fn query_set(&self) -> Result<QuerySet, ConfigError> {
        self.queries.to_query_set()
    }
}

impl fmt::Debug for DatabaseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseOptions")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database_url", &self.database_url)
            .field("driver_class_name", &self.driver_class_name)
            .field("queries", &self.queries)
            .finish()
    }
}
