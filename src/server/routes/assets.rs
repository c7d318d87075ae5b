//! Asset operation handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::asset::Asset;
use crate::diff::VersionDiff;
use crate::value::Fields;

use super::super::{error::ApiError, identity::Caller, state::AppState};

/// Query parameters for reading an asset.
#[derive(Debug, Deserialize, Default)]
pub struct GetQuery {
    pub version: Option<u64>,
}

/// Query parameters for creating an asset.
#[derive(Debug, Deserialize, Default)]
pub struct CreateQuery {
    /// Present (with any value) to enable import mode.
    pub import: Option<String>,
}

/// Query parameters for editing an asset.
#[derive(Debug, Deserialize, Default)]
pub struct EditQuery {
    /// Comma separated field names to remove.
    pub delete_fields: Option<String>,
}

/// Query parameters for listing versions.
#[derive(Debug, Deserialize, Default)]
pub struct VersionsQuery {
    pub size: Option<usize>,
    /// Present to return diffs instead of records.
    pub diff: Option<String>,
}

/// Query parameters for an ad-hoc diff.
#[derive(Debug, Deserialize, Default)]
pub struct DiffQuery {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

/// Result of a write.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub id: String,
    pub version: u64,
}

fn parse_fields(body: &[u8], allow_empty: bool) -> Result<Fields, ApiError> {
    if allow_empty && body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Fields::new());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Body must be a JSON object: {}", e)))
}

fn split_fields(list: Option<&str>) -> Vec<String> {
    list.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Get the current state of an asset, or a past version with `?version=`.
#[instrument(skip(state), fields(asset_type = %asset_type, asset_id = %asset_id))]
pub async fn get_asset(
    State(state): State<AppState>,
    Path((asset_type, asset_id)): Path<(String, String)>,
    query: Result<Query<GetQuery>, QueryRejection>,
) -> Result<Json<Asset>, ApiError> {
    let Query(query) = query?;
    let asset = match query.version {
        Some(version) => state.service().get_version(&asset_type, &asset_id, version)?,
        None => state.service().get(&asset_type, &asset_id)?,
    };
    info!(version = asset.version(), "retrieved asset");
    Ok(Json(asset))
}

/// Create an asset from a JSON object body.
#[instrument(skip(state, caller, body), fields(asset_type = %asset_type, asset_id = %asset_id, body_len = body.len()))]
pub async fn create_asset(
    State(state): State<AppState>,
    Path((asset_type, asset_id)): Path<(String, String)>,
    query: Result<Query<CreateQuery>, QueryRejection>,
    Caller(caller): Caller,
    body: Bytes,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let data = parse_fields(&body, false)?;
    let import = query.import.is_some();
    debug!(user = %caller.user, is_admin = caller.is_admin, import, "creating asset");

    let version = state
        .service()
        .create(&asset_type, &asset_id, data, &caller, import)?;

    info!(version, "asset created");
    Ok((
        StatusCode::CREATED,
        Json(WriteResponse {
            id: asset_id,
            version,
        }),
    )
        .into_response())
}

/// Edit an asset: overlay the JSON body and drop `?delete_fields=`.
#[instrument(skip(state, caller, body), fields(asset_type = %asset_type, asset_id = %asset_id, body_len = body.len()))]
pub async fn edit_asset(
    State(state): State<AppState>,
    Path((asset_type, asset_id)): Path<(String, String)>,
    query: Result<Query<EditQuery>, QueryRejection>,
    Caller(caller): Caller,
    body: Bytes,
) -> Result<Json<WriteResponse>, ApiError> {
    let Query(query) = query?;
    let data = parse_fields(&body, true)?;
    let delete_fields = split_fields(query.delete_fields.as_deref());
    debug!(user = %caller.user, delete_fields = ?delete_fields, "editing asset");

    let version = state
        .service()
        .edit(&asset_type, &asset_id, data, &delete_fields, &caller)?;

    info!(version, "asset edited");
    Ok(Json(WriteResponse {
        id: asset_id,
        version,
    }))
}

/// Delete an asset. Its history stays readable.
#[instrument(skip(state, caller), fields(asset_type = %asset_type, asset_id = %asset_id))]
pub async fn remove_asset(
    State(state): State<AppState>,
    Path((asset_type, asset_id)): Path<(String, String)>,
    Caller(caller): Caller,
) -> Result<Json<WriteResponse>, ApiError> {
    let version = state.service().remove(&asset_type, &asset_id, &caller)?;

    info!(version, user = %caller.user, "asset removed");
    Ok(Json(WriteResponse {
        id: asset_id,
        version,
    }))
}

/// List recent versions, newest first, or their diffs with `?diff`.
#[instrument(skip(state), fields(asset_type = %asset_type, asset_id = %asset_id))]
pub async fn list_versions(
    State(state): State<AppState>,
    Path((asset_type, asset_id)): Path<(String, String)>,
    query: Result<Query<VersionsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    if query.diff.is_some() {
        let diffs = state
            .service()
            .diff_versions(&asset_type, &asset_id, query.size)?;
        info!(count = diffs.len(), "computed version diffs");
        return Ok(Json(diffs).into_response());
    }

    let versions = state
        .service()
        .get_versions(&asset_type, &asset_id, query.size)?;
    info!(count = versions.len(), "listed versions");
    Ok(Json(versions).into_response())
}

/// Diff two chosen versions with `?from=&to=`.
#[instrument(skip(state), fields(asset_type = %asset_type, asset_id = %asset_id))]
pub async fn diff_versions(
    State(state): State<AppState>,
    Path((asset_type, asset_id)): Path<(String, String)>,
    query: Result<Query<DiffQuery>, QueryRejection>,
) -> Result<Json<VersionDiff>, ApiError> {
    let Query(query) = query?;
    let (Some(from), Some(to)) = (query.from, query.to) else {
        return Err(ApiError::bad_request("Both 'from' and 'to' versions are required"));
    };
    let diff = state
        .service()
        .diff_between(&asset_type, &asset_id, from, to)?;
    info!(from, to, changes = diff.changes.len(), "computed diff");
    Ok(Json(diff))
}
