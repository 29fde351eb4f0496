//! Data sources a probe can poll.
//!
//! A [`ConnectionProvider`] turns [`ConnectionSettings`] into a [`RowSource`],
//! the reusable handle a probe owns for its whole lifetime. The libsql
//! implementation keeps a small connection pool behind that handle.

mod pool;
mod provider;
mod settings;
mod value;

pub use pool::{LibsqlManager, LibsqlPool};
pub use provider::{DEFAULT_QUERY_TIMEOUT, LibsqlProvider, LibsqlSource};
pub use settings::{ConnectionSettings, Driver};
pub use value::{COLUMN_SEPARATOR, ColumnValue, Row};

use async_trait::async_trait;

use crate::error::SourceError;

/// Supplies a query handle for a configured data source
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Open the data source described by `settings`
    async fn connect(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn RowSource>, SourceError>;
}

/// Query handle bound to one data source
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Run `query` with `param` as its only bound parameter and collect every row
    async fn fetch(&self, query: &str, param: &str) -> Result<Vec<Row>, SourceError>;
}
