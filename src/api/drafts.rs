//! Workflow draft endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;

use super::{success, ApiResult};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{SaveDraftRequest, WorkflowDraft};
use crate::AppState;

/// GET /api/draft - Get the user's active draft, or null.
pub async fn get_draft(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Option<WorkflowDraft>> {
    let draft = state.user_data.draft(user.id()).await?;
    success(draft)
}

/// PUT /api/draft - Autosave the user's draft.
pub async fn save_draft(
    State(state): State<AppState>,
    user: CurrentUser,
    request: Result<Json<SaveDraftRequest>, JsonRejection>,
) -> ApiResult<WorkflowDraft> {
    let Some(user_id) = user.id() else {
        return Err(AppError::Unauthenticated(
            "Sign in to save a workflow draft".to_string(),
        ));
    };
    let Json(request) = request.map_err(|e| AppError::Validation(e.body_text()))?;

    let draft = WorkflowDraft {
        id: WorkflowDraft::id_for(user_id),
        name: request.name,
        workflow: request.workflow,
        auto_saved: request.auto_saved,
        updated_at: Utc::now().to_rfc3339(),
    };

    state
        .user_data
        .upsert_draft(Some(user_id), draft.clone())
        .await?;
    success(draft)
}

/// DELETE /api/draft - Discard the user's draft.
pub async fn delete_draft(State(state): State<AppState>, user: CurrentUser) -> ApiResult<()> {
    state.user_data.clear_draft(user.id()).await?;
    success(())
}
