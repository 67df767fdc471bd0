//! Category and subcategory models.

use serde::{Deserialize, Serialize};

/// A subcategory owned by exactly one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A top-level category with its ordered subcategories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}
