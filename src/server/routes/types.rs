//! Asset type catalog handler.

use axum::{Json, extract::State};
use tracing::{info, instrument};

use crate::ledger::TypeSummary;

use super::super::{error::ApiError, state::AppState};

/// List known asset types with their live asset counts.
#[instrument(skip(state))]
pub async fn list_types(State(state): State<AppState>) -> Result<Json<Vec<TypeSummary>>, ApiError> {
    let types = state.service().list_types()?;
    info!(count = types.len(), "listed types");
    Ok(Json(types))
}
