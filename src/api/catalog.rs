//! Catalog API endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Category, Tool};
use crate::AppState;

/// GET /api/tools - List all tools in catalog order.
pub async fn list_tools(State(state): State<AppState>) -> ApiResult<Vec<Tool>> {
    success(state.catalog.tools.clone())
}

/// GET /api/tools/trending - List trending tools.
pub async fn trending_tools(State(state): State<AppState>) -> ApiResult<Vec<Tool>> {
    success(state.catalog.trending().into_iter().cloned().collect())
}

/// GET /api/tools/{slug} - Get a single tool.
pub async fn get_tool(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Tool> {
    match state.catalog.tool_by_slug(&slug) {
        Some(tool) => success(tool.clone()),
        None => Err(AppError::NotFound(format!("Tool {} not found", slug))),
    }
}

/// GET /api/categories - List categories with their subcategories.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    success(state.catalog.categories.clone())
}
