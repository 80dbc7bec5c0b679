use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status, `"ok"` or `"degraded"`.
    pub status: &'static str,
    /// True while a storage backend is connected.
    pub storage: bool,
    /// Package version of the running backend.
    pub version: &'static str,
}

impl HealthResponse {
    /// The backend is fully operational.
    pub fn ok() -> Self {
        Self {
            status: "ok",
            storage: true,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// The backend is serving from memory without persistence.
    pub fn degraded() -> Self {
        Self {
            status: "degraded",
            storage: false,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_response_reports_missing_storage() {
        let response = HealthResponse::degraded();
        assert_eq!(response.status, "degraded");
        assert!(!response.storage);
        assert!(!response.version.is_empty());
    }
}
