#[cfg(feature = "postgres")]
use std::time::Duration;

#[cfg(feature = "postgres")]
use std::sync::Arc;

#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

#[cfg(feature = "postgres")]
use blogicum_core::service::Repositories;

#[cfg(feature = "postgres")]
use super::postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
    PostgresPostRepository, PostgresUserRepository,
};

/// Configuration for the database connection pool.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Database connection pool.
///
/// # Example
/// ```ignore
/// let db = DatabaseConnections::init(&config).await?;
/// let repos = db.repositories();
/// ```
#[cfg(feature = "postgres")]
pub struct DatabaseConnections {
    pub main: Arc<DbConn>,
}

#[cfg(feature = "postgres")]
impl DatabaseConnections {
    /// Open the connection pool described by `config`.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connection...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(true)
            .to_owned();

        let main = Database::connect(opts).await?;
        tracing::info!("Database connected (pool: {})", config.max_connections);

        Ok(Self {
            main: Arc::new(main),
        })
    }

    /// Every repository port, backed by the main pool.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(PostgresUserRepository::new(Arc::clone(&self.main))),
            posts: Arc::new(PostgresPostRepository::new(Arc::clone(&self.main))),
            comments: Arc::new(PostgresCommentRepository::new(Arc::clone(&self.main))),
            categories: Arc::new(PostgresCategoryRepository::new(Arc::clone(&self.main))),
            locations: Arc::new(PostgresLocationRepository::new(Arc::clone(&self.main))),
        }
    }

    /// Round-trip to the database.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.main.ping().await
    }
}
