use axum::routing::get;
use axum::{middleware, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::identity::{self, ServerState};
use crate::openapi;

pub mod services;
pub mod versions;

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "OK"))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public health and docs routes, plus
/// the identity-guarded catalog routes.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let api = Router::new()
        .route("/services", get(services::list).post(services::create))
        .route(
            "/services/:id",
            get(services::get)
                .put(services::upsert)
                .patch(services::update)
                .delete(services::delete),
        )
        .route("/services/:id/versions", get(versions::list).post(versions::create))
        .route(
            "/services/:id/versions/:version_id",
            get(versions::get)
                .put(versions::upsert)
                .patch(versions::update)
                .delete(versions::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), identity::require_identity));

    Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
