//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! CORS → Auth validator → Audit logger → Admin gate

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(ctx: ApiContext) -> Router {
    let cors = cors_layer(&ctx.config.domain);

    // Admin routes: the role check runs inside the auth stack below.
    let admin = Router::new()
        .route("/readings/:id", get(endpoints::admin::readings))
        .route("/readings/:id/stats", get(endpoints::admin::stats))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_admin));

    // Protected routes: require a valid access token
    //
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Auth → Audit (innermost) → Handler
    let protected = Router::new()
        .route(
            "/bp",
            post(endpoints::readings::create).get(endpoints::readings::list),
        )
        .route("/bp/import", post(endpoints::readings::import))
        .route("/alerts", get(endpoints::alerts::list))
        .with_state(ctx.clone())
        .nest("/admin", admin)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    // Public routes
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/refresh", post(endpoints::refresh::refresh))
        .route("/bp-google-sheet", get(endpoints::sheet::latest))
        .with_state(ctx);

    Router::new()
        .nest("/api/auth", protected)
        .nest("/api", public)
        .layer(cors)
}

/// CORS for the single configured front-end origin, with credentials.
fn cors_layer(domain: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match HeaderValue::from_str(domain) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(%domain, error = %e, "APP_DOMAIN_NAME is not a valid origin; CORS disabled");
            layer
        }
    }
}
