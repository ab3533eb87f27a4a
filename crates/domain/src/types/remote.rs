//! Remote collection shapes: cursor pages and hierarchy nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// One page of a remote listing.
///
/// `next_cursor` is opaque; its presence means more pages exist. Services that
/// follow the Graph conventions answer with `value` / `@odata.nextLink`, where
/// the cursor is a full URL that replaces the request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "value", default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(
        rename = "nextCursor",
        alias = "@odata.nextLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// A final page (no cursor).
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next_cursor: None }
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Tag of a hierarchy node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Has children; the crawler descends into it.
    #[serde(alias = "folder")]
    Container,
    /// Persisted directly.
    #[serde(alias = "file")]
    Leaf,
}

impl_domain_status_conversions!(NodeKind {
    Container => "container",
    Leaf => "leaf",
});

/// A node discovered while listing a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl ResourceNode {
    pub fn container(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::bare(id.into(), name.into(), NodeKind::Container)
    }

    pub fn leaf(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::bare(id.into(), name.into(), NodeKind::Leaf)
    }

    fn bare(id: String, name: String, kind: NodeKind) -> Self {
        Self { id, name, kind, parent_id: None, size: None, mime_type: None, modified_at: None }
    }

    pub fn is_container(&self) -> bool {
        self.kind == NodeKind::Container
    }
}
