#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{EventEntity, EventListItemEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for event aggregates.
///
/// `save_event` takes the version the caller loaded; the backend must reject
/// the write when the persisted version has moved on.
pub trait EventStore: Send + Sync {
    fn save_event(
        &self,
        event: EventEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_event(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<EventEntity>>>;
    fn list_events(&self) -> BoxFuture<'static, StorageResult<Vec<EventListItemEntity>>>;
    fn delete_event(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
