//! Static tool catalog.
//!
//! Loaded once at startup from bundled JSON (or a configured file) and never mutated.

use std::path::Path;

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Category, Subcategory, Tool};

const BUNDLED_CATALOG: &str = include_str!("../../data/catalog.json");

/// Immutable, ordered collection of tools and categories.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub tools: Vec<Tool>,
}

impl Catalog {
    /// Parse a catalog from its JSON document.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Catalog(format!("Invalid catalog data: {}", e)))
    }

    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self, AppError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Load from `path` when given, otherwise fall back to the bundled catalog.
    pub async fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let Some(path) = path else {
            return Self::bundled();
        };

        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Catalog(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Subcategories of the owning category that the tool belongs to, in category order.
    pub fn subcategories_of<'a>(&'a self, tool: &Tool) -> Vec<&'a Subcategory> {
        self.category(&tool.category)
            .map(|category| {
                category
                    .subcategories
                    .iter()
                    .filter(|sub| tool.subcategories.iter().any(|id| id == &sub.id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First tool with the given slug, in catalog order.
    pub fn tool_by_slug(&self, slug: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.slug == slug)
    }

    pub fn trending(&self) -> Vec<&Tool> {
        self.tools.iter().filter(|t| t.trending).collect()
    }
}
