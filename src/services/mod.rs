/// OpenAPI documentation generation.
pub mod documentation;
/// Event lifecycle management and persistence coordination.
pub mod event_service;
/// Health check service.
pub mod health_service;
/// Selection raffle execution and transparency projections.
pub mod raffle_service;
/// Read-time reconciliation and the public status projection.
pub mod status_service;
/// Storage connection supervision with automatic reconnection.
pub mod storage_supervisor;
/// Operator-facing timeline mutations.
pub mod timeline_service;
