//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::BlogService;
use blogicum_core::ports::MediaStorage;
use blogicum_core::service::Repositories;
use blogicum_infra::{Argon2PasswordService, InMemoryStore, LocalMediaStorage};

#[cfg(feature = "postgres")]
use blogicum_infra::DatabaseConnections;

use crate::config::AppConfig;

/// Which storage backend the repositories run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Postgres => "postgres",
            StorageKind::Memory => "memory",
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub media: Arc<dyn MediaStorage>,
    /// URL prefix uploaded files are served under.
    pub media_url: String,
    /// Largest accepted upload, enforced while the body streams in.
    pub max_upload_bytes: usize,
    pub storage: StorageKind,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state, falling back to the in-memory store when
    /// no database is configured or reachable.
    pub async fn new(config: &AppConfig) -> Self {
        let media: Arc<dyn MediaStorage> = Arc::new(LocalMediaStorage::new(
            config.media.root.clone(),
            config.media.max_upload_bytes,
        ));

        #[cfg(feature = "postgres")]
        let (db, repos, storage) = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let repos = connections.repositories();
                    (Some(Arc::new(connections)), repos, StorageKind::Postgres)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    (None, InMemoryStore::new().repositories(), StorageKind::Memory)
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (None, InMemoryStore::new().repositories(), StorageKind::Memory)
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (repos, storage) = {
            tracing::info!("Running without postgres feature - using in-memory store");
            (InMemoryStore::new().repositories(), StorageKind::Memory)
        };

        let mut state = Self::from_parts(repos, media, config);
        state.storage = storage;
        #[cfg(feature = "postgres")]
        {
            state.db = db;
        }

        tracing::info!(storage = storage.as_str(), "Application state initialized");
        state
    }

    /// Assemble the state around existing repositories.
    pub fn from_parts(repos: Repositories, media: Arc<dyn MediaStorage>, config: &AppConfig) -> Self {
        let blog = BlogService::new(
            repos,
            media.clone(),
            Arc::new(Argon2PasswordService::default()),
            config.blog.clone(),
        );

        Self {
            blog,
            media,
            media_url: config.media.url.clone(),
            max_upload_bytes: config.media.max_upload_bytes,
            storage: StorageKind::Memory,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }
}
