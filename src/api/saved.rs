//! Saved bundle and workflow endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;

use super::{success, ApiResult};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{Collection, SaveItemRequest, SavedBundle, SavedItem, SavedWorkflow};
use crate::AppState;

/// Build the stored record from a save request.
fn saved_item_from_request(request: SaveItemRequest) -> Result<SavedItem, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let id = request
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Ok(SavedItem {
        id,
        name: request.name,
        description: request.description,
        cost: request.cost,
        tools: request.tools,
        metadata: request.metadata,
        saved_at: Utc::now().to_rfc3339(),
    })
}

async fn list_saved(
    state: &AppState,
    collection: Collection,
    user: &CurrentUser,
) -> ApiResult<Vec<SavedItem>> {
    let items = state.user_data.saved_items(collection, user.id()).await?;
    success(items)
}

async fn save(
    state: &AppState,
    collection: Collection,
    user: &CurrentUser,
    request: Result<Json<SaveItemRequest>, JsonRejection>,
) -> ApiResult<SavedItem> {
    // Anonymous callers get 401 even when the body is invalid.
    if user.id().is_none() {
        return Err(AppError::Unauthenticated(format!(
            "Sign in to save a {}",
            collection.label()
        )));
    }

    let Json(request) = request.map_err(|e| AppError::Validation(e.body_text()))?;
    let item = saved_item_from_request(request)?;
    state
        .user_data
        .add_saved_item(collection, user.id(), item.clone())
        .await?;

    // Publishing a workflow retires the user's draft.
    if collection == Collection::Workflows {
        if let Err(e) = state.user_data.clear_draft(user.id()).await {
            tracing::warn!(error = %e, "Failed to clear draft after publishing workflow");
        }
    }

    success(item)
}

async fn remove(
    state: &AppState,
    collection: Collection,
    user: &CurrentUser,
    id: &str,
) -> ApiResult<()> {
    state
        .user_data
        .remove_saved_item(collection, user.id(), id)
        .await?;
    success(())
}

/// GET /api/bundles - List the user's saved bundles.
pub async fn list_bundles(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Vec<SavedBundle>> {
    list_saved(&state, Collection::Bundles, &user).await
}

/// POST /api/bundles - Save a bundle.
pub async fn save_bundle(
    State(state): State<AppState>,
    user: CurrentUser,
    request: Result<Json<SaveItemRequest>, JsonRejection>,
) -> ApiResult<SavedBundle> {
    save(&state, Collection::Bundles, &user, request).await
}

/// DELETE /api/bundles/{id} - Remove a saved bundle.
pub async fn delete_bundle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    remove(&state, Collection::Bundles, &user, &id).await
}

/// GET /api/workflows - List the user's saved workflows.
pub async fn list_workflows(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Vec<SavedWorkflow>> {
    list_saved(&state, Collection::Workflows, &user).await
}

/// POST /api/workflows - Save a workflow.
pub async fn save_workflow(
    State(state): State<AppState>,
    user: CurrentUser,
    request: Result<Json<SaveItemRequest>, JsonRejection>,
) -> ApiResult<SavedWorkflow> {
    save(&state, Collection::Workflows, &user, request).await
}

/// DELETE /api/workflows/{id} - Remove a saved workflow.
pub async fn delete_workflow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    remove(&state, Collection::Workflows, &user, &id).await
}
