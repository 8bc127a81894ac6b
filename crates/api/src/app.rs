use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use domain::services::{
    AdminService, NotificationService, ParticipantService, PassportService, ReservationService,
    TimeslotService, TriviaService,
};
use domain::store::EventStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin_key, security_headers, trace_id,
};
use crate::routes::{admin, checkin, health, reservations, scan, timeslots, trivia, users};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn EventStore>,
    pub participants: Arc<ParticipantService>,
    pub trivia: Arc<TriviaService>,
    pub timeslots: Arc<TimeslotService>,
    pub reservations: Arc<ReservationService>,
    pub admin: Arc<AdminService>,
    pub passport: Arc<PassportService>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn EventStore>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        let capacity = config.event.default_slot_capacity;
        Self {
            participants: Arc::new(ParticipantService::new(store.clone())),
            trivia: Arc::new(TriviaService::new(store.clone())),
            timeslots: Arc::new(TimeslotService::new(store.clone(), capacity)),
            reservations: Arc::new(ReservationService::new(store.clone(), notifier)),
            admin: Arc::new(AdminService::new(store.clone())),
            passport: Arc::new(PassportService::new(store.clone())),
            config: Arc::new(config),
            store,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        // Development: any origin
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Escape room surface under `/escaperoom/api`.
fn escaperoom_routes(state: &AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/admin/registration-status", get(admin::registration_status))
        .route(
            "/admin/registration-control",
            post(admin::set_registration_control).delete(admin::reset_registration_control),
        )
        .route(
            "/admin/timeslot-config",
            get(admin::get_timeslot_config).post(admin::set_timeslot_config),
        )
        .route("/admin/generate-timeslots", post(admin::generate_timeslots))
        .route("/admin/timeslots", delete(admin::clear_timeslots))
        .route("/admin/users-data", get(admin::export_users))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_key,
        ));

    Router::new()
        .route("/users/register-multiple", post(users::register_multiple))
        .route("/users/search", get(users::search))
        .route("/trivia/questions", get(trivia::questions))
        .route("/trivia/validate", post(trivia::validate))
        .route("/timeslots", get(timeslots::availability))
        .route("/reservations", post(reservations::create))
        .route("/reservations/multiple", post(reservations::create_multiple))
        .route("/reservations/resend", post(reservations::resend))
        .route("/checkin/validate", post(checkin::validate))
        .route("/checkin/confirm", post(checkin::confirm))
        .route("/checkin/cancel", post(checkin::cancel))
        .route("/checkin/reassign", post(checkin::reassign))
        .route("/checkin/group/checkin", post(checkin::group_checkin))
        .route("/checkin/group/reassign", post(checkin::group_reassign))
        .route("/checkin/groups/checked-in", get(checkin::checked_in_groups))
        .route("/checkin/groups/rate", post(checkin::rate_group))
        .merge(admin_routes)
}

/// Passport scanner surface under `/api/scan`.
fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(scan::register))
        .route("/validate", post(scan::validate))
        .route("/entrada", post(scan::entrada))
        .route("/entrega", post(scan::entrega))
        .route("/completo", post(scan::completo))
        .route("/sorteo", post(scan::sorteo))
        .route("/history", get(scan::history))
        .route("/stats", get(scan::stats))
}

pub fn create_app(
    config: Config,
    store: Arc<dyn EventStore>,
    notifier: Arc<dyn NotificationService>,
) -> Router {
    let state = AppState::new(config, store, notifier);
    let config = state.config.clone();

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .nest("/escaperoom/api", escaperoom_routes(&state))
        .nest("/api/scan", scan_routes())
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn_with_state(
            config.security.hsts_enabled,
            security_headers,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state)
}
