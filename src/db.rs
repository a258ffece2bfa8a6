use crate::config::{DatabaseConfig, SslMode};
use crate::error::ApiError;
use crate::migration::PgCatalog;
use crate::models::Offer;
use crate::repository::OfferRepository;
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tracing::{error, info};

/// Repository layer over a PostgreSQL connection pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Builds the pool and checks that a connection can be opened.
    pub async fn new(config: DatabaseConfig) -> Result<Self, ApiError> {
        info!("Creating PostgreSQL connection pool for host: {}:{}", config.host, config.port);

        let pool = Self::create_pool(config)?;

        let db = Database { pool };
        db.test_connection().await?;

        Ok(db)
    }

    fn create_pool(config: DatabaseConfig) -> Result<Pool, ApiError> {
        let mut pg_config = Config::new();

        pg_config.host = Some(config.host);
        pg_config.port = Some(config.port);
        pg_config.dbname = Some(config.database);
        pg_config.user = Some(config.username);
        pg_config.password = Some(config.password);
        pg_config.connect_timeout = Some(config.connection_timeout);

        pg_config.ssl_mode = Some(match config.ssl_mode {
            SslMode::Disable => deadpool_postgres::SslMode::Disable,
            SslMode::Prefer => deadpool_postgres::SslMode::Prefer,
            SslMode::Require => deadpool_postgres::SslMode::Require,
        });

        pg_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(config.max_connections as usize);
        pool_config.timeouts.wait = Some(config.connection_timeout);
        pg_config.pool = Some(pool_config);

        let tls_connector = TlsConnector::builder().build().map_err(|e| {
            error!("Failed to create TLS connector: {}", e);
            ApiError::Internal(anyhow::anyhow!("TLS connector creation failed: {}", e))
        })?;
        let tls = MakeTlsConnector::new(tls_connector);

        pg_config.create_pool(Some(Runtime::Tokio1), tls).map_err(|e| {
            error!("Failed to create connection pool: {}", e);
            ApiError::Internal(anyhow::anyhow!("Connection pool creation failed: {}", e))
        })
    }

    /// Borrows a connection; it goes back to the pool when the `Object` drops.
    async fn get_connection(&self) -> Result<Object, ApiError> {
        self.pool.get().await.map_err(ApiError::from)
    }

    pub async fn test_connection(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Database connection test failed: {}", e);
            ApiError::from(e)
        })?;

        info!("Database connection test successful");
        Ok(())
    }

    /// Schema catalog sharing this pool, for the Schema Manager.
    pub fn schema_catalog(&self) -> PgCatalog {
        PgCatalog::new(self.pool.clone())
    }
}

#[async_trait]
impl OfferRepository for Database {
    async fn list_all(&self) -> Result<Vec<Offer>, ApiError> {
        let client = self.get_connection().await?;
        let query = "SELECT id, title, description FROM offers ORDER BY id ASC";

        let rows = client.query(query, &[]).await.map_err(ApiError::from)?;

        // Map every row before returning so a bad row fails the whole listing
        let offers = rows
            .iter()
            .map(Offer::from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::from)?;

        Ok(offers)
    }
}
