//! Tool model for cataloged AI products.

use serde::{Deserialize, Serialize};

/// Pricing tier of a tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PricingType {
    Free,
    Freemium,
    Paid,
}

/// Pricing descriptor attached to a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    #[serde(rename = "type")]
    pub kind: PricingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_price: Option<String>,
}

impl Pricing {
    /// Whether the tool can be used without paying.
    pub fn has_free_tier(&self) -> bool {
        matches!(self.kind, PricingType::Free | PricingType::Freemium)
    }
}

/// A cataloged AI product or service. Read-only after the catalog loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    pub category: String,
    #[serde(default)]
    pub subcategories: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    /// 0 to 5
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    pub pricing: Pricing,
    #[serde(default)]
    pub trending: bool,
}

/// A tool matched by a search, with the rule that matched it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(flatten)]
    pub tool: Tool,
    pub match_score: u32,
    pub match_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory_name: Option<String>,
}
