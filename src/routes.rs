use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{self, AppState};
use crate::models::{
    Diagnostics, ErrorBody, Lead, LeadCreated, LeadPayload, LeadsPage, MessageResponse,
};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root,
        handlers::hello,
        handlers::diagnostics,
        handlers::create_lead,
        handlers::list_leads,
    ),
    components(schemas(
        LeadPayload,
        Lead,
        LeadCreated,
        LeadsPage,
        MessageResponse,
        Diagnostics,
        ErrorBody,
    )),
    info(title = "Lead Capture API")
)]
pub struct ApiDoc;

/// Builds the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/hello", get(handlers::hello))
        .route("/test", get(handlers::diagnostics))
        .route(
            "/api/leads",
            post(handlers::create_lead).get(handlers::list_leads),
        )
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
