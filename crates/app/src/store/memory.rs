//! In-memory collection.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::uuids::TypedUuid;

use super::{Collection, Document, Filter, Sort, StoreError, table::Table};

/// Process-local collection; contents are lost when the process exits.
#[derive(Debug)]
pub struct MemoryCollection<R> {
    table: RwLock<Table<R>>,
}

impl<R: Document> MemoryCollection<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table::default()),
        }
    }
}

impl<R: Document> Default for MemoryCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Document> Collection<R> for MemoryCollection<R> {
    async fn find(
        &self,
        filter: &Filter,
        sort: Option<Sort>,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<R>, StoreError> {
        self.table.read().await.find(filter, sort, skip, limit)
    }

    async fn count_matching(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.table.read().await.count(filter)
    }

    async fn find_by_id(&self, id: TypedUuid<R>) -> Result<Option<R>, StoreError> {
        Ok(self.table.read().await.get(id).cloned())
    }

    async fn insert(&self, record: R) -> Result<R, StoreError> {
        self.table.write().await.insert(record)
    }

    async fn update_by_id(&self, id: TypedUuid<R>, record: R) -> Result<Option<R>, StoreError> {
        self.table.write().await.replace(id, record)
    }

    async fn delete_by_id(&self, id: TypedUuid<R>) -> Result<Option<R>, StoreError> {
        Ok(self.table.write().await.remove(id))
    }
}
