use std::sync::Arc;

use anyhow::Result;
use echhapa_shared::{
    article_store::ArticleStore, layout_store::LayoutStore, media_store::MediaStore, schema,
    settings_store::SettingsStore, taxonomy_store::TaxonomyStore, user_store::UserStore, Database,
};

use crate::{auth::SessionStore, config::ServerConfig};

/// Shared application state: one store per domain concern over a single
/// database handle, plus the in-memory session map.
#[derive(Clone)]
pub struct AppState {
    pub articles: ArticleStore,
    pub layout: LayoutStore,
    pub taxonomy: TaxonomyStore,
    pub users: UserStore,
    pub settings: SettingsStore,
    pub media: MediaStore,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Open the database, ensure the schema and seed rows exist, and wire up
    /// the stores.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let db = Database::open(&config.db_path)?;
        schema::init(&db)?;
        Ok(Self::with_database(db, config))
    }

    /// Build state over an existing database. Tests use this with an
    /// in-memory connection.
    pub fn with_database(db: Database, config: ServerConfig) -> Self {
        Self {
            articles: ArticleStore::new(db.clone()),
            layout: LayoutStore::new(db.clone()),
            taxonomy: TaxonomyStore::new(db.clone()),
            users: UserStore::new(db.clone()),
            settings: SettingsStore::new(db.clone()),
            media: MediaStore::new(db),
            sessions: Arc::new(SessionStore::new()),
            config: Arc::new(config),
        }
    }
}
