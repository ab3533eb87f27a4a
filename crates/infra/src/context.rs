//! Sync context - wires configuration into storage, adapters and orchestrator

use std::sync::Arc;

use tidesync_core::{Paginator, SyncOrchestrator, TemplatePaths, TokenSource, TreeCrawler};
use tidesync_domain::{CalendarEvent, Config, ResourceNode, Result};
use tracing::{info, instrument};

use crate::config;
use crate::database::{DbManager, SqliteEventReconciler, SqliteLeafStore};
use crate::http::HttpPageSource;

/// Everything a sync run needs, built from one [`Config`]
pub struct SyncContext {
    pub config: Config,
    pub db: DbManager,
    pub leaves: Arc<SqliteLeafStore>,
    pub events: Arc<SqliteEventReconciler>,
    pub orchestrator: SyncOrchestrator,
}

impl SyncContext {
    /// Open the database, apply the schema and build the orchestrator
    ///
    /// Hierarchy crawls list containers through `config.remote.children_path`.
    /// Both listings share `tokens`.
    ///
    /// # Errors
    /// Returns `TideSyncError::Config` for an invalid base URL or pool size and
    /// `TideSyncError::Database` if the store cannot be opened or migrated.
    #[instrument(skip_all, fields(db_path = %config.database.path, base_url = %config.remote.base_url))]
    pub fn from_config(config: &Config, tokens: TokenSource) -> Result<Self> {
        let db = DbManager::from_config(&config.database)?;
        db.run_migrations()?;
        let health = db.health_check()?;

        let leaves = Arc::new(SqliteLeafStore::new(db.clone()));
        let events = Arc::new(SqliteEventReconciler::new(db.clone()));

        let node_listing = Paginator::from_config(
            Arc::new(HttpPageSource::<ResourceNode>::from_config(&config.remote)?),
            tokens.clone(),
            &config.sync,
        );
        let crawler = TreeCrawler::new(node_listing, leaves.clone())
            .with_paths(Arc::new(TemplatePaths::from(&config.remote)));

        let event_listing = Paginator::from_config(
            Arc::new(HttpPageSource::<CalendarEvent>::from_config(&config.remote)?),
            tokens,
            &config.sync,
        );

        let orchestrator = SyncOrchestrator::new(&config.sync)
            .with_crawler(crawler)
            .with_events(event_listing, events.clone());

        info!(
            max_connections = health.max_connections,
            concurrency = config.sync.concurrency,
            "sync context ready"
        );

        Ok(Self { config: config.clone(), db, leaves, events, orchestrator })
    }

    /// Load configuration from the environment or a config file, then build
    pub fn load(tokens: TokenSource) -> Result<Self> {
        let config = config::load()?;
        Self::from_config(&config, tokens)
    }
}
