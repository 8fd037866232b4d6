use crate::config::{Namespace, StorageConfig};
use crate::domain::{Field, FieldValue, RecordId};
use crate::models::anime::Anime;
use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod repositories;

/// Handle to the configured collection.
///
/// Cloning is cheap; all clones share one connection pool for the lifetime of
/// the process.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    collection: String,
}

impl Store {
    /// Opens `<data_dir>/<database>.db` and makes sure the collection exists.
    pub async fn open(storage: &StorageConfig, namespace: &Namespace) -> Result<Self> {
        let path = Path::new(&storage.data_dir).join(format!("{}.db", namespace.database));
        let db_url = format!("sqlite:{}", path.display());

        Self::with_pool_options(
            &db_url,
            &namespace.collection,
            storage.max_db_connections,
            storage.min_db_connections,
        )
        .await
    }

    pub async fn new(db_url: &str, collection: &str) -> Result<Self> {
        Self::with_pool_options(db_url, collection, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        collection: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file: {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        let store = Self {
            conn,
            collection: collection.to_string(),
        };
        store.anime_repo().ensure_collection().await?;

        info!(
            "Database connected, collection '{}' ready (pool: {}-{})",
            collection, min_connections, max_connections
        );

        Ok(store)
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn anime_repo(&self) -> repositories::anime::AnimeRepository {
        repositories::anime::AnimeRepository::new(self.conn.clone(), self.collection.clone())
    }

    pub async fn list_all_anime(&self) -> Result<Vec<Anime>> {
        self.anime_repo().list_all().await
    }

    pub async fn add_anime(&self, anime: &Anime) -> Result<()> {
        self.anime_repo().insert(anime).await
    }

    pub async fn remove_anime(&self, id: &RecordId) -> Result<bool> {
        self.anime_repo().delete(id).await
    }

    pub async fn set_anime_field(
        &self,
        id: &RecordId,
        field: Field,
        value: &FieldValue,
    ) -> Result<bool> {
        self.anime_repo().set_field(id, field, value).await
    }
}
