use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{alerts, auth, machines, metrics, notifications, ws};
use crate::middleware::{require_machine, require_operator};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origin
                .parse::<HeaderValue>()
                .expect("ALLOWED_ORIGIN must be a valid header value"),
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // agent wire: registration rides an operator session, ingestion rides an API key.
    let agent_register = Router::new()
        .route("/register", post(machines::register_machine))
        .layer(middleware::from_fn_with_state(state.clone(), require_operator));

    let agent_metrics = Router::new()
        .route("/metrics", post(metrics::ingest))
        .layer(middleware::from_fn_with_state(state.clone(), require_machine));

    let agent_stratum = Router::new().merge(agent_register).merge(agent_metrics);

    let auth_public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password));

    let auth_protected = Router::new()
        .route("/me", get(auth::me))
        .route("/change-password", post(auth::change_password))
        .route("/users", get(auth::list_users).post(auth::create_user))
        .route("/users/:id", axum::routing::delete(auth::delete_user))
        .layer(middleware::from_fn_with_state(state.clone(), require_operator));

    let alerts_stratum = Router::new()
        .route("/rules", get(alerts::list_rules).post(alerts::create_rule))
        .route(
            "/rules/:id",
            axum::routing::put(alerts::update_rule).delete(alerts::delete_rule),
        )
        .route("/events", get(alerts::list_events))
        .route("/events/:id/ack", post(alerts::acknowledge_event))
        .layer(middleware::from_fn_with_state(state.clone(), require_operator));

    let machines_stratum = Router::new()
        .route("/", get(machines::list_machines))
        .route(
            "/:id",
            get(machines::get_machine)
                .patch(machines::update_machine)
                .delete(machines::delete_machine),
        )
        .route("/:id/enable", post(machines::enable_machine))
        .route("/:id/disable", post(machines::disable_machine))
        .route("/:id/rotate-key", post(machines::rotate_key))
        .layer(middleware::from_fn_with_state(state.clone(), require_operator));

    let observability_stratum = Router::new()
        .route("/metrics", get(metrics::latest_metrics))
        .route("/ws", get(ws::stream_metrics))
        .route("/system/info", get(metrics::system_info))
        .layer(middleware::from_fn_with_state(state.clone(), require_operator));

    let webhooks_stratum = Router::new()
        .route(
            "/webhooks",
            get(notifications::list_webhooks).post(notifications::create_webhook),
        )
        .route(
            "/webhooks/:id",
            axum::routing::put(notifications::update_webhook).delete(notifications::delete_webhook),
        )
        .route("/webhooks/:id/test", post(notifications::test_webhook))
        .route(
            "/telegram",
            get(notifications::list_telegram).post(notifications::create_telegram),
        )
        .route(
            "/telegram/:id",
            axum::routing::put(notifications::update_telegram).delete(notifications::delete_telegram),
        )
        .route("/telegram/:id/test", post(notifications::test_telegram))
        .layer(middleware::from_fn_with_state(state.clone(), require_operator));

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/agent", agent_stratum)
        .nest("/auth", auth_public.merge(auth_protected))
        .nest("/alerts", alerts_stratum)
        .nest("/machines", machines_stratum)
        .nest("/notifications", webhooks_stratum)
        .merge(observability_stratum)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
