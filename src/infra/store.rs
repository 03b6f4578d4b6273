//! In-memory document store adapter.
//!
//! Mirrors the production store's contract: whole-document overwrites, no
//! transactions, last-writer-wins. The default backing for tests and
//! single-node development deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::application::repos::{ItemQueryFilter, LibraryRepo, RepoError};
use crate::domain::entities::VideoLibraryItem;

#[derive(Default)]
pub struct InMemoryLibraryStore {
    items: DashMap<Uuid, VideoLibraryItem>,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl LibraryRepo for InMemoryLibraryStore {
    async fn find_item(&self, id: Uuid) -> Result<Option<VideoLibraryItem>, RepoError> {
        Ok(self.items.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save_item(&self, item: &VideoLibraryItem) -> Result<(), RepoError> {
        self.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn list_items(
        &self,
        owner_user_id: Uuid,
        filter: &ItemQueryFilter,
    ) -> Result<Vec<VideoLibraryItem>, RepoError> {
        let mut items: Vec<VideoLibraryItem> = self
            .items
            .iter()
            .filter(|entry| entry.owner_user_id == owner_user_id && filter.matches(entry))
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }
}
