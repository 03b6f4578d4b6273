//! Repository traits describing persistence adapters.
//!
//! The backing store is a plain get/save/list document store with no native
//! transactions; every save is a whole-document overwrite, so concurrent
//! writers are last-writer-wins.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::VideoLibraryItem;
use crate::domain::types::AssetStatus;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("store timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Filters accepted by the list operation.
#[derive(Debug, Clone, Default)]
pub struct ItemQueryFilter {
    pub status: Option<AssetStatus>,
    pub channel_id: Option<String>,
    pub geo: Option<String>,
    pub role_family: Option<String>,
}

impl ItemQueryFilter {
    /// Whether an item passes every set filter. Geo and role family match the
    /// active manifest's job snapshot.
    pub fn matches(&self, item: &VideoLibraryItem) -> bool {
        if let Some(status) = self.status {
            if item.status != status {
                return false;
            }
        }
        if let Some(channel_id) = &self.channel_id {
            if &item.channel_id != channel_id {
                return false;
            }
        }
        let job = &item.active_manifest().job;
        if let Some(geo) = &self.geo {
            if &job.geo != geo {
                return false;
            }
        }
        if let Some(role_family) = &self.role_family {
            if &job.role_family != role_family {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait LibraryRepo: Send + Sync {
    async fn find_item(&self, id: Uuid) -> Result<Option<VideoLibraryItem>, RepoError>;

    /// Whole-document overwrite; no field-level merge.
    async fn save_item(&self, item: &VideoLibraryItem) -> Result<(), RepoError>;

    async fn list_items(
        &self,
        owner_user_id: Uuid,
        filter: &ItemQueryFilter,
    ) -> Result<Vec<VideoLibraryItem>, RepoError>;
}
