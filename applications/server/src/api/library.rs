/// Library API routes
use crate::{error::Result, state::AppState};
use axum::{extract::State, Json};
use lyra_core::{SearchQuery, SearchResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Terms per field, e.g. `{"artist": ["new order"]}`
    pub query: SearchQuery,
    /// Limit the search to backends owning these URI roots
    pub uris: Option<Vec<String>>,
    #[serde(default)]
    pub exact: bool,
}

/// POST /api/library/search - Search every backend, one result per backend
pub async fn search(
    State(app_state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResult>>> {
    let results = app_state
        .core
        .search(request.query, request.uris, request.exact)
        .await?;
    Ok(Json(results))
}
