//! SQLite-backed remote store for saved collections and drafts.
//!
//! Every statement is scoped by `user_id`. Errors are classified into `RemoteOutcome`
//! instead of being returned.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use crate::models::{Collection, SavedItem, WorkflowDraft};
use crate::persistence::{RemoteOutcome, RemoteStore};

/// PostgreSQL SQLSTATE for "relation does not exist".
const UNDEFINED_TABLE: &str = "42P01";

/// Database repository for user data.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteStore for Repository {
    // ==================== SAVED COLLECTIONS ====================

    async fn select_saved(
        &self,
        collection: Collection,
        user_id: &str,
    ) -> RemoteOutcome<Vec<SavedItem>> {
        let sql = format!(
            "SELECT id, name, description, cost, tools, metadata, saved_at FROM {} WHERE user_id = ? ORDER BY saved_at, rowid",
            collection.table()
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await;

        match result {
            Ok(rows) => RemoteOutcome::Ok(rows.iter().map(saved_item_from_row).collect()),
            Err(e) => classify(e),
        }
    }

    async fn insert_saved(
        &self,
        collection: Collection,
        user_id: &str,
        item: &SavedItem,
    ) -> RemoteOutcome<()> {
        let sql = format!(
            "INSERT INTO {} (id, user_id, name, description, cost, tools, metadata, saved_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            collection.table()
        );
        let result = sqlx::query(&sql)
            .bind(&item.id)
            .bind(user_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(&item.cost)
            .bind(item.tools.to_string())
            .bind(item.metadata.to_string())
            .bind(&item.saved_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => RemoteOutcome::Ok(()),
            Err(e) => classify(e),
        }
    }

    async fn delete_saved(
        &self,
        collection: Collection,
        user_id: &str,
        id: &str,
    ) -> RemoteOutcome<()> {
        let sql = format!(
            "DELETE FROM {} WHERE id = ? AND user_id = ?",
            collection.table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => RemoteOutcome::Ok(()),
            Err(e) => classify(e),
        }
    }

    // ==================== WORKFLOW DRAFT ====================

    async fn select_draft(&self, user_id: &str) -> RemoteOutcome<Option<WorkflowDraft>> {
        let result = sqlx::query(
            "SELECT id, name, workflow, auto_saved, updated_at FROM workflow_drafts WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => RemoteOutcome::Ok(row.as_ref().map(draft_from_row)),
            Err(e) => classify(e),
        }
    }

    async fn upsert_draft(&self, user_id: &str, draft: &WorkflowDraft) -> RemoteOutcome<()> {
        let result = sqlx::query(
            r#"INSERT INTO workflow_drafts (user_id, id, name, workflow, auto_saved, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   id = excluded.id,
                   name = excluded.name,
                   workflow = excluded.workflow,
                   auto_saved = excluded.auto_saved,
                   updated_at = excluded.updated_at"#,
        )
        .bind(user_id)
        .bind(&draft.id)
        .bind(&draft.name)
        .bind(draft.workflow.to_string())
        .bind(draft.auto_saved as i32)
        .bind(&draft.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => RemoteOutcome::Ok(()),
            Err(e) => classify(e),
        }
    }

    async fn delete_draft(&self, user_id: &str) -> RemoteOutcome<()> {
        let result = sqlx::query("DELETE FROM workflow_drafts WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => RemoteOutcome::Ok(()),
            Err(e) => classify(e),
        }
    }
}

/// Missing tables are `NotProvisioned`; everything else is `Failed`.
fn classify<T>(err: sqlx::Error) -> RemoteOutcome<T> {
    if let sqlx::Error::Database(db_err) = &err {
        let missing_table = db_err.code().as_deref() == Some(UNDEFINED_TABLE)
            || db_err.message().contains("no such table");
        if missing_table {
            return RemoteOutcome::NotProvisioned;
        }
    }
    RemoteOutcome::Failed(err.to_string())
}

// Helper functions for row conversion

fn saved_item_from_row(row: &sqlx::sqlite::SqliteRow) -> SavedItem {
    let tools: String = row.get("tools");
    let metadata: String = row.get("metadata");
    SavedItem {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        cost: row.get("cost"),
        tools: parse_json(&tools),
        metadata: parse_json(&metadata),
        saved_at: row.get("saved_at"),
    }
}

fn draft_from_row(row: &sqlx::sqlite::SqliteRow) -> WorkflowDraft {
    let workflow: String = row.get("workflow");
    let auto_saved: i32 = row.get("auto_saved");
    WorkflowDraft {
        id: row.get("id"),
        name: row.get("name"),
        workflow: parse_json(&workflow),
        auto_saved: auto_saved != 0,
        updated_at: row.get("updated_at"),
    }
}

fn parse_json(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or(Value::Null)
}
