use crate::model::{Customer, CustomerId};
use async_trait::async_trait;
use metrics::histogram;
use sqlx::{Connection, PgConnection};
use std::time::Instant;
use tracing::{debug, warn};

/// The fixed statement executed for every created customer.
pub const IDENTITY_QUERY: &str = "SELECT 1";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("failed to execute query: {0}")]
    Query(#[source] sqlx::Error),
}

#[async_trait]
pub trait CustomerStorage: Send + Sync {
    /// Persists the customer and returns its identifier.
    async fn create_customer(&self, customer: &Customer) -> Result<CustomerId, StorageError>;
}

/// Postgres-backed storage that opens one connection per call.
///
/// The payload is not written anywhere: the returned identifier is the
/// scalar produced by [`IDENTITY_QUERY`].
#[derive(Clone)]
pub struct ProdCustomerStorage {
    database_url: String,
}

impl ProdCustomerStorage {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Opens a connection and pings the server once.
    pub async fn check_connection(&self) -> Result<(), StorageError> {
        let mut conn = self.connect().await?;
        conn.ping().await.map_err(StorageError::Query)?;
        Self::release(conn).await;
        Ok(())
    }

    async fn connect(&self) -> Result<PgConnection, StorageError> {
        PgConnection::connect(&self.database_url)
            .await
            .map_err(StorageError::Connect)
    }

    async fn release(conn: PgConnection) {
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close database connection cleanly");
        }
    }

    async fn query_scalar(&self) -> Result<i32, StorageError> {
        let mut conn = self.connect().await?;

        debug!("Executing query: {}", IDENTITY_QUERY);
        let result = sqlx::query_scalar::<_, i32>(IDENTITY_QUERY)
            .fetch_one(&mut conn)
            .await
            .map_err(StorageError::Query);

        Self::release(conn).await;
        result
    }
}

#[async_trait]
impl CustomerStorage for ProdCustomerStorage {
    async fn create_customer(&self, _customer: &Customer) -> Result<CustomerId, StorageError> {
        let start = Instant::now();
        let result = self.query_scalar().await;
        histogram!("customer_query_seconds").record(start.elapsed().as_secs_f64());
        result
    }
}
