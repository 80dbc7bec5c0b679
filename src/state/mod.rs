//! Shared application state: per-event timeline handles, the storage slot
//! with its degraded flag, collaborator handles, and viewer presence.

pub mod effects;
pub mod phase;
pub mod reconcile;
pub mod timeline;

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::event_store::EventStore,
    roster::{FeatureSink, RosterProvider},
    state::timeline::EventTimeline,
};

/// Cheaply clonable handle to the whole application state.
pub type SharedState = Arc<AppState>;

/// Per-event serialization boundary: every mutation takes the write lock.
pub type EventHandle = Arc<RwLock<EventTimeline>>;

/// Central application state shared across routes and background tasks.
pub struct AppState {
    config: AppConfig,
    event_store: RwLock<Option<Arc<dyn EventStore>>>,
    degraded: watch::Sender<bool>,
    events: DashMap<Uuid, EventHandle>,
    roster: Arc<dyn RosterProvider>,
    features: Arc<dyn FeatureSink>,
    presence: DashMap<Uuid, DashMap<Uuid, SystemTime>>,
}

impl AppState {
    /// Construct the shared state wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        roster: Arc<dyn RosterProvider>,
        features: Arc<dyn FeatureSink>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            event_store: RwLock::new(None),
            degraded: degraded_tx,
            events: DashMap::new(),
            roster,
            features,
            presence: DashMap::new(),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the roster collaborator.
    pub fn roster(&self) -> Arc<dyn RosterProvider> {
        self.roster.clone()
    }

    /// Handle to the auto-feature collaborator.
    pub fn features(&self) -> Arc<dyn FeatureSink> {
        self.features.clone()
    }

    /// Obtain a handle to the current event store, if one is installed.
    pub async fn event_store(&self) -> Option<Arc<dyn EventStore>> {
        let guard = self.event_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new event store implementation and leave degraded mode.
    pub async fn install_event_store(&self, store: Arc<dyn EventStore>) {
        {
            let mut guard = self.event_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current event store and enter degraded mode.
    pub async fn clear_event_store(&self) {
        {
            let mut guard = self.event_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    ///
    /// Owned by the storage supervisor; it can be raised during a health
    /// outage even while a store handle is still installed.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Cached handle for an event aggregate, if it was already loaded.
    pub fn cached_event(&self, id: Uuid) -> Option<EventHandle> {
        self.events.get(&id).map(|entry| entry.value().clone())
    }

    /// Cache an event aggregate and return its handle.
    pub fn insert_event(&self, event: EventTimeline) -> EventHandle {
        let id = event.id;
        let handle: EventHandle = Arc::new(RwLock::new(event));
        self.events.insert(id, handle.clone());
        handle
    }

    /// Identifiers of every cached event.
    pub fn cached_event_ids(&self) -> Vec<Uuid> {
        self.events.iter().map(|entry| *entry.key()).collect()
    }

    /// Drop an event from the cache along with its presence registry.
    pub fn remove_event(&self, id: Uuid) {
        self.events.remove(&id);
        self.presence.remove(&id);
    }

    /// Record a viewer heartbeat for an event.
    pub fn record_heartbeat(&self, event_id: Uuid, viewer_id: Uuid, now: SystemTime) {
        self.presence
            .entry(event_id)
            .or_default()
            .insert(viewer_id, now);
    }

    /// Count viewers seen within the presence TTL, pruning stale sessions.
    pub fn viewer_count(&self, event_id: Uuid, now: SystemTime) -> usize {
        let ttl = Duration::from_secs(self.config.presence_ttl_secs);
        let Some(sessions) = self.presence.get(&event_id) else {
            return 0;
        };
        sessions.retain(|_, seen| {
            now.duration_since(*seen)
                .map(|age| age <= ttl)
                .unwrap_or(true)
        });
        sessions.len()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{LogFeatureSink, SnapshotRoster};

    fn state() -> SharedState {
        AppState::new(
            AppConfig::default(),
            Arc::new(SnapshotRoster::new()),
            Arc::new(LogFeatureSink),
        )
    }

    #[test]
    fn stale_viewer_sessions_are_pruned_from_the_count() {
        let state = state();
        let event_id = Uuid::from_u128(1);
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(10_000);

        state.record_heartbeat(event_id, Uuid::from_u128(10), now);
        state.record_heartbeat(
            event_id,
            Uuid::from_u128(11),
            now - Duration::from_secs(state.config().presence_ttl_secs + 5),
        );

        assert_eq!(state.viewer_count(event_id, now), 1);
        assert_eq!(state.viewer_count(Uuid::from_u128(2), now), 0);
    }

    #[tokio::test]
    async fn state_starts_degraded_until_a_store_is_installed() {
        let state = state();
        assert!(state.is_degraded().await);
        assert!(state.event_store().await.is_none());
    }
}
