//! User-owned saved collections and workflow drafts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A logical collection of saved items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Bundles,
    Workflows,
}

impl Collection {
    /// Table holding the collection in the remote store.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Bundles => "saved_bundles",
            Collection::Workflows => "saved_workflows",
        }
    }

    /// Key of a user's local mirror, e.g. `saved_bundles:user-1`.
    pub fn local_key(&self, user_id: &str) -> String {
        format!("{}:{}", self.table(), user_id)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Collection::Bundles => "bundle",
            Collection::Workflows => "workflow",
        }
    }
}

/// A saved bundle or workflow. Created on save, deleted on removal, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub tools: Value,
    #[serde(default)]
    pub metadata: Value,
    pub saved_at: String,
}

pub type SavedBundle = SavedItem;
pub type SavedWorkflow = SavedItem;

/// Request body for saving a bundle or workflow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveItemRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub tools: Value,
    #[serde(default)]
    pub metadata: Value,
}

/// The single active workflow draft of a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDraft {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub workflow: Value,
    #[serde(default)]
    pub auto_saved: bool,
    pub updated_at: String,
}

impl WorkflowDraft {
    /// Synthetic identifier of a user's draft; one draft per user.
    pub fn id_for(user_id: &str) -> String {
        format!("draft-{}", user_id)
    }
}

/// Request body for upserting the workflow draft.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    pub name: String,
    #[serde(default)]
    pub workflow: Value,
    #[serde(default)]
    pub auto_saved: bool,
}
