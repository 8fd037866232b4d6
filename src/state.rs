use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{Config, Namespace};
use crate::db::Store;
use crate::services::{AnimeService, SeaOrmAnimeService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub anime_service: Arc<dyn AnimeService>,
}

impl SharedState {
    pub async fn new(config: Config, namespace: &Namespace) -> anyhow::Result<Self> {
        let store = Store::open(&config.storage, namespace).await?;
        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let anime_service: Arc<dyn AnimeService> =
            Arc::new(SeaOrmAnimeService::new(Arc::new(store.clone())));

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            anime_service,
        }
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
