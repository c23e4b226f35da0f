use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use rebanho_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/access/me",
            get(handlers::access::access_summary_handler),
        )
        .route(
            "/api/access/check",
            get(handlers::access::access_check_handler),
        )
        .route(
            "/api/access/refresh",
            post(handlers::access::refresh_access_handler),
        )
        .route(
            "/api/security/profiles",
            get(handlers::security::list_profiles_handler)
                .post(handlers::security::create_profile_handler),
        )
        .route(
            "/api/security/profiles/{profile_id}/grants",
            get(handlers::security::list_profile_grants_handler)
                .put(handlers::security::update_profile_grant_handler),
        )
        .route(
            "/api/security/profiles/{profile_id}/deactivate",
            post(handlers::security::deactivate_profile_handler),
        )
        .route(
            "/api/security/permissions",
            get(handlers::security::list_permission_catalog_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
