//! Search API endpoint.

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::SearchResult;
use crate::search::answer::{generate_answer, simulate_typing_delay};
use crate::search::{self, ResultFilter, SortOrder};
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Free-text query.
    #[serde(default)]
    pub q: String,
    /// Category id filter; `all` or absent keeps every category.
    #[serde(default)]
    pub category: Option<String>,
    /// relevance (default), rating or name.
    #[serde(default)]
    pub sort: SortOrder,
}

/// Ranked matches plus the synthesized summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// GET /api/search - Search the tool catalog.
pub async fn search_tools(
    State(state): State<AppState>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<SearchResponse> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;
    let ranked = search::search(&params.q, &state.catalog);

    // The summary describes every match, before the client-side filter narrows them.
    let answer = generate_answer(&params.q, &ranked);

    let results = search::refine(
        ranked,
        &ResultFilter {
            category: params.category,
            sort: params.sort,
        },
    );

    if !answer.is_empty() && state.config.typing_delay {
        tokio::time::sleep(simulate_typing_delay()).await;
    }

    let total = results.len();
    success(SearchResponse {
        query: params.q,
        results,
        total,
        answer: Some(answer).filter(|a| !a.is_empty()),
    })
}
