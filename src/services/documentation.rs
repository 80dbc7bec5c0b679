use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Stagecast Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::public::event_status,
        crate::routes::public::heartbeat,
        crate::routes::public::raffle_disclosure,
        crate::routes::public::verify_raffle,
        crate::routes::admin::list_events,
        crate::routes::admin::create_event,
        crate::routes::admin::get_event,
        crate::routes::admin::delete_event,
        crate::routes::admin::sync_roster,
        crate::routes::admin::start_event,
        crate::routes::admin::advance_phase,
        crate::routes::admin::pause_event,
        crate::routes::admin::resume_event,
        crate::routes::admin::adjust_time,
        crate::routes::admin::jump_to_phase,
        crate::routes::admin::advance_slot,
        crate::routes::admin::complete_commercials,
        crate::routes::admin::stop_event,
        crate::routes::admin::restart_event,
        crate::routes::admin::run_raffle,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::admin::EventListItem,
            crate::dto::admin::EventSummary,
            crate::dto::admin::CreateEventRequest,
            crate::dto::admin::ContestantInput,
            crate::dto::admin::RosterSyncRequest,
            crate::dto::admin::AdjustTimeRequest,
            crate::dto::admin::JumpRequest,
            crate::dto::admin::RaffleRunRequest,
            crate::dto::admin::ActionResponse,
            crate::dto::admin::PhaseActionResponse,
            crate::dto::public::StatusResponse,
            crate::dto::public::CurrentPerformer,
            crate::dto::public::HeartbeatRequest,
            crate::dto::public::HeartbeatResponse,
            crate::dto::phase::PhaseSnapshot,
            crate::dto::phase::SlotSnapshot,
            crate::dto::phase::AdjustmentSnapshot,
            crate::dto::phase::VisibleStatus,
            crate::dto::phase::WinnerDto,
            crate::dto::raffle::RaffleDisclosureResponse,
            crate::dto::raffle::DisclosedEntry,
            crate::dto::raffle::VerifyRequest,
            crate::dto::raffle::VerifyResponse,
            crate::state::phase::PhaseName,
            crate::raffle::RaffleOutcome,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Audience-facing event status"),
        (name = "admin", description = "Operator controls for event timelines"),
        (name = "raffle", description = "Verifiable selection raffle"),
    )
)]
pub struct ApiDoc;
