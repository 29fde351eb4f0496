use std::time::Duration;

use async_trait::async_trait;
use libsql::{Builder, Database, params};
use tokio::time::timeout;
use tracing::{debug, info};

use super::pool::{LibsqlManager, LibsqlPool};
use super::settings::{ConnectionSettings, Driver};
use super::value::{ColumnValue, Row};
use super::{ConnectionProvider, RowSource};
use crate::error::SourceError;

/// Default upper bound on a single query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_MAX_CONNECTIONS: usize = 2;

/// Opens libsql databases (local files or remote servers) behind a
/// connection pool.
#[derive(Debug, Clone)]
pub struct LibsqlProvider {
    max_connections: usize,
    query_timeout: Duration,
}

impl Default for LibsqlProvider {
    fn default() -> Self {
        Self { max_connections: DEFAULT_MAX_CONNECTIONS, query_timeout: DEFAULT_QUERY_TIMEOUT }
    }
}

impl LibsqlProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    async fn open_database(settings: &ConnectionSettings) -> Result<Database, SourceError> {
        let database = match settings.driver {
            Driver::Local => Builder::new_local(settings.local_path()).build().await?,
            Driver::Remote => {
                Builder::new_remote(settings.url.clone(), settings.password.clone())
                    .build()
                    .await?
            }
        };
        Ok(database)
    }
}

#[async_trait]
impl ConnectionProvider for LibsqlProvider {
    async fn connect(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn RowSource>, SourceError> {
        let database = Self::open_database(settings).await?;
        let pool = LibsqlPool::builder(LibsqlManager::new(database))
            .max_size(self.max_connections)
            .build()?;

        // Fail at construction rather than on the first poll
        drop(pool.get().await?);

        info!(
            driver = %settings.driver,
            url = %settings.url,
            user = %settings.user,
            "Connected to data source"
        );

        Ok(Box::new(LibsqlSource { pool, query_timeout: self.query_timeout }))
    }
}

/// Pooled libsql handle owned by one probe
pub struct LibsqlSource {
    pool: LibsqlPool,
    query_timeout: Duration,
}

impl LibsqlSource {
    async fn run_query(&self, query: &str, param: &str) -> Result<Vec<Row>, SourceError> {
        let conn = self.pool.get().await?;
        let mut rows = conn.query(query, params![param.to_string()]).await?;
        let width = rows.column_count();

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            let mut columns = Vec::with_capacity(usize::try_from(width).unwrap_or_default());
            for idx in 0..width {
                columns.push(ColumnValue::from(row.get_value(idx)?));
            }
            results.push(Row::new(columns));
        }

        Ok(results)
    }
}

#[async_trait]
impl RowSource for LibsqlSource {
    async fn fetch(&self, query: &str, param: &str) -> Result<Vec<Row>, SourceError> {
        let rows = timeout(self.query_timeout, self.run_query(query, param))
            .await
            .map_err(|_| SourceError::Timeout(self.query_timeout))??;

        debug!(rows = rows.len(), "Query returned");
        Ok(rows)
    }
}
