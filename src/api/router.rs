//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! JSON routes live under `/api/`; illustrations are served from `/images/`.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the application router.
pub fn api_router(ctx: ApiContext) -> Router {
    let images = ServeDir::new(ctx.qa.images().dir());

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/intake", post(endpoints::intake::submit))
        .route("/ask", post(endpoints::ask::ask))
        .route("/reports/:file", get(endpoints::reports::download))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .nest_service("/images", images)
        .layer(CorsLayer::permissive())
}
