use std::time::Duration;

use thiserror::Error;

/// Configuration that cannot be turned into a working probe.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("queries are not valid JSON")]
    QueryJson(#[from] serde_json::Error),

    #[error("queries must be a JSON array of objects, found {0}")]
    QueryShape(&'static str),

    #[error("query `{key}` must be a string")]
    QueryValue { key: String },

    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("invalid hub url `{url}`: {reason}")]
    HubUrl { url: String, reason: String },

    #[error("probe topic must not be empty")]
    EmptyTopic,

    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Failures talking to the monitored data source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("database error")]
    Database(#[from] libsql::Error),

    #[error("could not get a connection from the pool")]
    Pool(#[from] deadpool::managed::PoolError<libsql::Error>),

    #[error("could not build the connection pool")]
    PoolBuild(#[from] deadpool::managed::BuildError),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures delivering a notification to the hub.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to encode notification")]
    Encode(#[from] serde_json::Error),

    #[error("failed to post notification to {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors raised while constructing a probe. Per-cycle failures never surface here.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to the data source")]
    Source(#[from] SourceError),

    #[error("failed to build the http client")]
    Client(#[from] reqwest::Error),
}
