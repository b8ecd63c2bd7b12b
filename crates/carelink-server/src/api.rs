use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use carelink_store::Database;

use crate::appointments;
use crate::auth;
use crate::caregivers;
use crate::config::ServerConfig;
use crate::guard;
use crate::messaging;
use crate::patients;
use crate::profiles;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::reviews;
use crate::sessions::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub sessions: SessionManager,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let public = Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    // Everything below requires a resolved session; role checks happen in
    // the handlers via the guard helpers.
    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/profiles", get(profiles::list))
        .route(
            "/profiles/:id",
            get(profiles::get_one).put(profiles::upsert),
        )
        .route("/profiles/:id/status", patch(profiles::set_status))
        .route("/caregivers", get(caregivers::list_verified))
        .route(
            "/caregivers/:id/profile",
            get(caregivers::get_one).put(caregivers::upsert),
        )
        .route("/caregivers/:id/verify", patch(caregivers::verify))
        .route("/caregivers/:id/reviews", get(reviews::for_caregiver))
        .route(
            "/patients/:id/profile",
            get(patients::get_one).put(patients::upsert),
        )
        .route(
            "/appointments",
            post(appointments::book).get(appointments::list_all),
        )
        .route("/appointments/mine", get(appointments::list_mine))
        .route(
            "/appointments/:id",
            get(appointments::get_one)
                .put(appointments::update)
                .delete(appointments::delete),
        )
        .route("/appointments/:id/status", patch(appointments::set_status))
        .route("/messages", post(messaging::send))
        .route("/messages/unread-count", get(messaging::unread_count))
        .route("/messages/with/:peer_id", get(messaging::conversation))
        .route("/messages/:id/read", post(messaging::mark_read))
        .route("/reviews", post(reviews::create))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_session,
        ));

    public
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    registration_open: bool,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        registration_open: state.config.registration_open,
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
