//! User data persistence with a local mirror.
//!
//! Every operation tries the remote store first and always ends in the local mirror:
//! successful remote reads overwrite the mirror, failed remote reads fall back to it, and
//! writes land in the mirror whatever the remote outcome. Remote failures are logged and
//! never returned to callers. Only a missing user identity is an error, and only for
//! mutations.

mod local;

pub use local::*;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Collection, SavedItem, WorkflowDraft};

/// Result of a remote store call, free of backend-specific error shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome<T> {
    Ok(T),
    /// The backing table has not been created yet.
    NotProvisioned,
    Failed(String),
}

/// Relational store holding user data, keyed by user id.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select_saved(&self, collection: Collection, user_id: &str)
        -> RemoteOutcome<Vec<SavedItem>>;

    async fn insert_saved(
        &self,
        collection: Collection,
        user_id: &str,
        item: &SavedItem,
    ) -> RemoteOutcome<()>;

    async fn delete_saved(
        &self,
        collection: Collection,
        user_id: &str,
        id: &str,
    ) -> RemoteOutcome<()>;

    async fn select_draft(&self, user_id: &str) -> RemoteOutcome<Option<WorkflowDraft>>;

    async fn upsert_draft(&self, user_id: &str, draft: &WorkflowDraft) -> RemoteOutcome<()>;

    async fn delete_draft(&self, user_id: &str) -> RemoteOutcome<()>;
}

fn draft_key(user_id: &str) -> String {
    format!("workflow_draft:{}", user_id)
}

/// Unwrap a successful outcome, logging the degraded paths.
fn degrade<T>(outcome: RemoteOutcome<T>, operation: &str, table: &str) -> Option<T> {
    match outcome {
        RemoteOutcome::Ok(value) => Some(value),
        RemoteOutcome::NotProvisioned => {
            tracing::warn!(
                operation,
                table,
                "Remote table not provisioned, using local mirror"
            );
            None
        }
        RemoteOutcome::Failed(reason) => {
            tracing::warn!(
                operation,
                table,
                %reason,
                "Remote store failed, using local mirror"
            );
            None
        }
    }
}

/// Saved bundles, saved workflows and workflow drafts for signed-in users.
pub struct UserDataService {
    remote: Arc<dyn RemoteStore>,
    local: Arc<dyn LocalStore>,
}

impl UserDataService {
    pub fn new(remote: Arc<dyn RemoteStore>, local: Arc<dyn LocalStore>) -> Self {
        Self { remote, local }
    }

    // ==================== SAVED COLLECTIONS ====================

    /// All saved items of a collection. Empty when nobody is signed in.
    pub async fn saved_items(
        &self,
        collection: Collection,
        user: Option<&str>,
    ) -> Result<Vec<SavedItem>, AppError> {
        let Some(user_id) = user else {
            return Ok(Vec::new());
        };

        let key = collection.local_key(user_id);

        let outcome = self.remote.select_saved(collection, user_id).await;
        match degrade(outcome, "select", collection.table()) {
            Some(items) => {
                match self.write_mirror(&key, &items).await {
                    Ok(()) => {
                        tracing::debug!(key = %key, count = items.len(), "Mirrored remote items")
                    }
                    Err(e) => tracing::warn!(key = %key, error = %e, "Failed to refresh local mirror"),
                }
                Ok(items)
            }
            None => Ok(self.read_mirror(&key).await.unwrap_or_default()),
        }
    }

    /// Save an item remotely if possible and always append it to the local mirror.
    pub async fn add_saved_item(
        &self,
        collection: Collection,
        user: Option<&str>,
        item: SavedItem,
    ) -> Result<(), AppError> {
        let user_id = require_user(user, collection.label())?;

        let outcome = self.remote.insert_saved(collection, user_id, &item).await;
        degrade(outcome, "insert", collection.table());

        let key = collection.local_key(user_id);
        let mut items: Vec<SavedItem> = self.read_mirror(&key).await.unwrap_or_default();
        items.push(item);
        self.write_mirror(&key, &items).await
    }

    /// Delete an item remotely if possible and always drop it from the local mirror.
    pub async fn remove_saved_item(
        &self,
        collection: Collection,
        user: Option<&str>,
        id: &str,
    ) -> Result<(), AppError> {
        let user_id = require_user(user, collection.label())?;

        let outcome = self.remote.delete_saved(collection, user_id, id).await;
        degrade(outcome, "delete", collection.table());

        let key = collection.local_key(user_id);
        let Some(mut items) = self.read_mirror::<Vec<SavedItem>>(&key).await else {
            return Ok(());
        };

        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(());
        }
        self.write_mirror(&key, &items).await
    }

    // ==================== WORKFLOW DRAFT ====================

    /// The user's active draft. `None` when nobody is signed in.
    pub async fn draft(&self, user: Option<&str>) -> Result<Option<WorkflowDraft>, AppError> {
        let Some(user_id) = user else {
            return Ok(None);
        };
        let key = draft_key(user_id);

        let outcome = self.remote.select_draft(user_id).await;
        match degrade(outcome, "select", "workflow_drafts") {
            Some(Some(draft)) => {
                if let Err(e) = self.write_mirror(&key, &draft).await {
                    tracing::warn!(key = %key, error = %e, "Failed to refresh local draft");
                }
                Ok(Some(draft))
            }
            Some(None) => {
                if let Err(e) = self.local.remove(&key).await {
                    tracing::warn!(key = %key, error = %e, "Failed to clear local draft");
                }
                Ok(None)
            }
            None => Ok(self.read_mirror(&key).await),
        }
    }

    /// Replace the user's single draft.
    pub async fn upsert_draft(
        &self,
        user: Option<&str>,
        draft: WorkflowDraft,
    ) -> Result<(), AppError> {
        let user_id = require_user(user, "workflow draft")?;

        let outcome = self.remote.upsert_draft(user_id, &draft).await;
        degrade(outcome, "upsert", "workflow_drafts");

        self.write_mirror(&draft_key(user_id), &draft).await
    }

    /// Discard the user's draft.
    pub async fn clear_draft(&self, user: Option<&str>) -> Result<(), AppError> {
        let user_id = require_user(user, "workflow draft")?;

        let outcome = self.remote.delete_draft(user_id).await;
        degrade(outcome, "delete", "workflow_drafts");

        self.local.remove(&draft_key(user_id)).await
    }

    // ==================== LOCAL MIRROR ====================

    /// Missing, unreadable and malformed values all read as `None`.
    async fn read_mirror<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.local.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read local mirror, treating as empty");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Malformed local data, treating as empty");
                None
            }
        }
    }

    async fn write_mirror<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("Failed to encode {}: {}", key, e)))?;
        self.local.set(key, json).await
    }
}

fn require_user<'a>(user: Option<&'a str>, what: &str) -> Result<&'a str, AppError> {
    user.ok_or_else(|| AppError::Unauthenticated(format!("Sign in to manage your {}s", what)))
}
