// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    docs::ApiDoc,
    handlers::{attempt, auth, contribution, events},
    state::AppState,
    utils::jwt::{auth_middleware, host_middleware, student_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, host, teacher, student).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, event store, image host).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Role check runs after authentication: layers apply bottom-up.
    let host_routes = Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/{id}",
            get(events::get_event).delete(events::delete_event),
        )
        .route("/events/{id}/publish", post(events::publish_event))
        .route("/events/{id}/results", get(events::event_results))
        .layer(middleware::from_fn(host_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let teacher_routes = Router::new()
        .route("/events", get(contribution::list_teacher_events))
        .route("/events/{id}", get(contribution::get_teacher_event))
        .route("/events/{id}/questions", put(contribution::contribute))
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let student_routes = Router::new()
        .route("/events", get(attempt::list_published_events))
        .route("/events/{id}", get(attempt::get_paper))
        .route("/events/{id}/submit", post(attempt::submit_attempt))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/host", host_routes)
        .nest("/api/teacher", teacher_routes)
        .nest("/api/student", student_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
