//! API routes and handlers.

mod assets;
mod types;

use axum::{Router, routing::get};

use super::state::AppState;

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/types", get(types::list_types))
        .route(
            "/assets/{asset_type}/{asset_id}",
            get(assets::get_asset)
                .post(assets::create_asset)
                .put(assets::edit_asset)
                .delete(assets::remove_asset),
        )
        .route(
            "/assets/{asset_type}/{asset_id}/versions",
            get(assets::list_versions),
        )
        .route("/assets/{asset_type}/{asset_id}/diff", get(assets::diff_versions));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}
