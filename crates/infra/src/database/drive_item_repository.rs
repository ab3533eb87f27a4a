//! SQLite implementation of the `LeafStore` port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tidesync_core::LeafStore;
use tidesync_domain::{NodeKind, ResourceNode, Result};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::DbManager;
use crate::errors::InfraError;

/// Leaves discovered by the crawler, keyed by `(owner_id, remote_id)`
#[derive(Debug, Clone)]
pub struct SqliteLeafStore {
    db: DbManager,
}

impl SqliteLeafStore {
    pub fn new(db: DbManager) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn find_item(&self, owner_id: &str, remote_id: &str) -> Result<Option<ResourceNode>> {
        let (owner_id, remote_id) = (owner_id.to_string(), remote_id.to_string());
        self.db
            .run_blocking(move |db| {
                let conn = db.get_connection()?;
                let node = conn
                    .query_row(
                        "SELECT remote_id, name, kind, parent_remote_id, size, mime_type, modified_at
                         FROM drive_items
                         WHERE owner_id = ?1 AND remote_id = ?2",
                        params![owner_id, remote_id],
                        map_node_row,
                    )
                    .optional()
                    .map_err(InfraError::from)?;
                Ok(node)
            })
            .await
    }

    pub async fn count_for_owner(&self, owner_id: &str) -> Result<u64> {
        let owner_id = owner_id.to_string();
        self.db
            .run_blocking(move |db| {
                let conn = db.get_connection()?;
                let count: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM drive_items WHERE owner_id = ?1",
                        params![owner_id],
                        |row| row.get(0),
                    )
                    .map_err(InfraError::from)?;
                Ok(count.max(0) as u64)
            })
            .await
    }
}

#[async_trait]
impl LeafStore for SqliteLeafStore {
    #[instrument(skip(self, leaf), fields(remote_id = %leaf.id))]
    async fn persist_leaf(&self, owner_id: &str, leaf: &ResourceNode) -> Result<()> {
        let leaf = leaf.clone();
        let owner_id = owner_id.to_string();

        self.db
            .run_blocking(move |db| {
                let conn = db.get_connection()?;
                conn.execute(
                    "INSERT INTO drive_items (
                        id, owner_id, remote_id, parent_remote_id, name, kind,
                        size, mime_type, modified_at, synced_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(owner_id, remote_id) DO UPDATE SET
                        parent_remote_id = excluded.parent_remote_id,
                        name = excluded.name,
                        kind = excluded.kind,
                        size = excluded.size,
                        mime_type = excluded.mime_type,
                        modified_at = excluded.modified_at,
                        synced_at = excluded.synced_at",
                    params![
                        Uuid::now_v7().to_string(),
                        owner_id,
                        leaf.id,
                        leaf.parent_id,
                        leaf.name,
                        leaf.kind.to_string(),
                        leaf.size,
                        leaf.mime_type,
                        leaf.modified_at.map(|at| at.timestamp()),
                        Utc::now().timestamp(),
                    ],
                )
                .map_err(InfraError::from)?;
                Ok(())
            })
            .await?;

        debug!("persisted leaf");
        Ok(())
    }
}

fn map_node_row(row: &Row<'_>) -> rusqlite::Result<ResourceNode> {
    let kind: String = row.get(2)?;
    let kind = kind
        .parse::<NodeKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?;
    let modified_at: Option<i64> = row.get(6)?;

    Ok(ResourceNode {
        id: row.get(0)?,
        name: row.get(1)?,
        kind,
        parent_id: row.get(3)?,
        size: row.get(4)?,
        mime_type: row.get(5)?,
        modified_at: modified_at.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
    })
}
