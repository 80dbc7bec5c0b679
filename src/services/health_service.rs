use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Build the health payload, pinging the storage backend when one is attached.
///
/// A failed ping is logged but the response still reflects the degraded flag
/// owned by the storage supervisor, so this endpoint never flips state itself.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.event_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("health probed while no storage backend is attached"),
    }

    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
