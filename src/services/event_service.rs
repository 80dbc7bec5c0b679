//! Event lifecycle coordination: create/load/list/delete plus the roster
//! sync entry point. Aggregates live in the in-memory cache; the storage
//! backend is written through best-effort so a database outage degrades the
//! service instead of taking it down.

use std::time::SystemTime;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{models::EventEntity, storage::StorageError},
    dto::admin::{ActionResponse, CreateEventRequest, EventListItem, EventSummary, RosterSyncRequest},
    error::ServiceError,
    state::{EventHandle, SharedState, timeline::EventTimeline},
};

/// Resolve an event handle, falling back to storage on a cache miss.
pub async fn resolve_event(state: &SharedState, id: Uuid) -> Result<EventHandle, ServiceError> {
    if let Some(handle) = state.cached_event(id) {
        return Ok(handle);
    }

    let Some(store) = state.event_store().await else {
        return Err(ServiceError::NotFound(format!("event `{id}` not found")));
    };
    let Some(entity) = store.find_event(id).await? else {
        return Err(ServiceError::NotFound(format!("event `{id}` not found")));
    };

    let (timeline, roster) = entity.into_timeline();
    if !roster.is_empty() {
        state.roster().sync_snapshot(id, roster).await;
    }
    Ok(state.insert_event(timeline))
}

/// Write the aggregate through to storage, tolerating outages.
///
/// The in-memory aggregate is authoritative; a failed write leaves it
/// untouched and is only logged. A version conflict means another replica
/// wrote concurrently, which the single-writer deployment does not expect,
/// so it is surfaced loudly in the logs.
pub async fn persist_event(state: &SharedState, event: &EventTimeline) {
    let Some(store) = state.event_store().await else {
        warn!(event_id = %event.id, "no storage backend; keeping event in memory only");
        return;
    };

    let roster = state.roster().contestants(event.id).await;
    let expected = event.version.saturating_sub(1);
    let entity = EventEntity::from_timeline(event, &roster);
    match store.save_event(entity, expected).await {
        Ok(()) => {}
        Err(StorageError::VersionConflict { id, expected }) => {
            warn!(event_id = %id, expected, "event write lost an optimistic version race");
        }
        Err(err) => {
            warn!(event_id = %event.id, error = %err, "failed to persist event; continuing in memory");
        }
    }
}

fn parse_instant(field: &str, value: &str) -> Result<SystemTime, ServiceError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map(SystemTime::from)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid `{field}` timestamp: {err}")))
}

/// Create a new event aggregate and persist its initial document.
pub async fn create_event(
    state: &SharedState,
    request: CreateEventRequest,
    now: SystemTime,
) -> Result<EventSummary, ServiceError> {
    let config = state.config();
    let mut configured_minutes = config.default_phase_minutes.clone();
    if let Some(overrides) = request.phase_minutes {
        for (phase, minutes) in overrides {
            configured_minutes.insert(phase, minutes);
        }
    }

    let registration_opens_at = request
        .registration_opens_at
        .as_deref()
        .map(|value| parse_instant("registration_opens_at", value))
        .transpose()?;
    let registration_closes_at = request
        .registration_closes_at
        .as_deref()
        .map(|value| parse_instant("registration_closes_at", value))
        .transpose()?;
    if let (Some(opens), Some(closes)) = (registration_opens_at, registration_closes_at) {
        if closes <= opens {
            return Err(ServiceError::InvalidInput(
                "registration must close after it opens".into(),
            ));
        }
    }

    let mut event = EventTimeline::new(
        Uuid::new_v4(),
        request.name,
        request.capacity.unwrap_or(config.default_capacity),
        configured_minutes,
        registration_opens_at,
        registration_closes_at,
        now,
    );
    if let Some(seconds) = request.commercial_seconds {
        event.commercial_seconds = seconds;
    }
    event.version = 1;

    info!(event_id = %event.id, name = %event.name, "created event");
    persist_event(state, &event).await;
    let summary = EventSummary::from(&event);
    state.insert_event(event);
    Ok(summary)
}

/// List events known to this backend.
///
/// Storage is the source of truth when available; otherwise the in-memory
/// cache keeps the list usable in degraded mode.
pub async fn list_events(state: &SharedState) -> Result<Vec<EventListItem>, ServiceError> {
    if let Some(store) = state.event_store().await {
        let entities = store.list_events().await?;
        return Ok(entities
            .into_iter()
            .map(|entity| EventListItem {
                id: entity.id,
                name: entity.name,
                live: entity.live,
            })
            .collect());
    }

    let mut items = Vec::new();
    for id in state.cached_event_ids() {
        if let Some(handle) = state.cached_event(id) {
            let event = handle.read().await;
            items.push(EventListItem {
                id: event.id,
                name: event.name.clone(),
                live: event.live,
            });
        }
    }
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

/// Full operator projection of one event.
pub async fn get_event(state: &SharedState, id: Uuid) -> Result<EventSummary, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let event = handle.read().await;
    Ok(EventSummary::from(&*event))
}

/// Delete an event from cache and storage.
pub async fn delete_event(state: &SharedState, id: Uuid) -> Result<ActionResponse, ServiceError> {
    state.remove_event(id);
    if let Some(store) = state.event_store().await {
        store.delete_event(id).await?;
    }
    info!(event_id = %id, "deleted event");
    Ok(ActionResponse {
        message: format!("event `{id}` deleted"),
    })
}

/// Accept a roster snapshot push and reschedule performances from it.
pub async fn sync_roster(
    state: &SharedState,
    id: Uuid,
    request: RosterSyncRequest,
    now: SystemTime,
) -> Result<ActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let entries = request
        .contestants
        .into_iter()
        .map(Into::into)
        .collect::<Vec<_>>();
    let count = state.roster().sync_snapshot(id, entries).await;

    let roster = state.roster().contestants(id).await;
    let mut event = handle.write().await;
    if event.live {
        event.schedule_performances(&roster, now);
    }
    event.version += 1;
    persist_event(state, &event).await;

    Ok(ActionResponse {
        message: format!("roster snapshot accepted ({count} entries)"),
    })
}
