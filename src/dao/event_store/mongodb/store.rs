use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoEventDocument, doc_id, doc_id_at_version},
};
use crate::dao::{
    event_store::EventStore,
    models::{EventEntity, EventListItemEntity},
    storage::StorageResult,
};

const EVENT_COLLECTION_NAME: &str = "events";

#[derive(Clone)]
pub struct MongoEventStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoEventStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"live": 1, "updated_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("event_live_updated_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: EVENT_COLLECTION_NAME,
                index: "live,updated_at",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoEventDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoEventDocument>(EVENT_COLLECTION_NAME)
    }

    /// Persist the event document, enforcing the optimistic version check.
    ///
    /// Version 0 means the aggregate was never saved: the write upserts.
    /// Any other version must match the stored one exactly or the write is
    /// rejected with a conflict.
    async fn save_event(&self, event: EventEntity, expected_version: u64) -> MongoResult<()> {
        let id = event.id;
        let document: MongoEventDocument = event.into();
        let collection = self.collection().await;

        if expected_version == 0 {
            collection
                .replace_one(doc_id(id), &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::SaveEvent { id, source })?;
            return Ok(());
        }

        let result = collection
            .replace_one(doc_id_at_version(id, expected_version), &document)
            .await
            .map_err(|source| MongoDaoError::SaveEvent { id, source })?;

        if result.matched_count == 0 {
            return Err(MongoDaoError::VersionConflict {
                id,
                expected: expected_version,
            });
        }
        Ok(())
    }

    async fn find_event(&self, id: Uuid) -> MongoResult<Option<EventEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadEvent { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn list_events(&self) -> MongoResult<Vec<EventListItemEntity>> {
        let collection = self.collection().await;

        let documents: Vec<MongoEventDocument> = collection
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListEvents { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListEvents { source })?;

        Ok(documents
            .into_iter()
            .map(|document| {
                let entity: EventEntity = document.into();
                (&entity).into()
            })
            .collect())
    }

    async fn delete_event(&self, id: Uuid) -> MongoResult<bool> {
        let collection = self.collection().await;
        let result = collection
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteEvent { id, source })?;
        Ok(result.deleted_count > 0)
    }
}

impl EventStore for MongoEventStore {
    fn save_event(
        &self,
        event: EventEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_event(event, expected_version)
                .await
                .map_err(Into::into)
        })
    }

    fn find_event(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_event(id).await.map_err(Into::into) })
    }

    fn list_events(&self) -> BoxFuture<'static, StorageResult<Vec<EventListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_events().await.map_err(Into::into) })
    }

    fn delete_event(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_event(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
