//! Catalog search.
//!
//! Scores tools against a free-text query with a fixed priority cascade: the first rule a
//! tool satisfies decides its score and reason. Matching is a case-insensitive substring
//! test of the whole query, with no tokenization or fuzzy matching.

pub mod answer;

use std::cmp::Ordering;

use serde::Deserialize;

use crate::catalog::Catalog;
use crate::models::{SearchResult, Tool};

/// Match rules in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    ExactName,
    NameContains,
    Description,
    LongDescription,
    Feature,
    Category,
    Subcategory,
}

impl MatchRule {
    pub const PRIORITY: [MatchRule; 7] = [
        MatchRule::ExactName,
        MatchRule::NameContains,
        MatchRule::Description,
        MatchRule::LongDescription,
        MatchRule::Feature,
        MatchRule::Category,
        MatchRule::Subcategory,
    ];

    pub fn score(self) -> u32 {
        match self {
            MatchRule::ExactName => 100,
            MatchRule::NameContains => 90,
            MatchRule::Description => 80,
            MatchRule::LongDescription => 70,
            MatchRule::Feature => 60,
            MatchRule::Category => 50,
            MatchRule::Subcategory => 40,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            MatchRule::ExactName => "Exact name match",
            MatchRule::NameContains => "Name contains search term",
            MatchRule::Description => "Description match",
            MatchRule::LongDescription => "Detailed description match",
            MatchRule::Feature => "Feature match",
            MatchRule::Category => "Category match",
            MatchRule::Subcategory => "Subcategory match",
        }
    }

    /// `term` must already be lower-cased.
    fn matches(self, term: &str, tool: &Tool, catalog: &Catalog) -> bool {
        match self {
            MatchRule::ExactName => tool.name.to_lowercase() == term,
            MatchRule::NameContains => contains(&tool.name, term),
            MatchRule::Description => contains(&tool.description, term),
            MatchRule::LongDescription => contains(&tool.long_description, term),
            MatchRule::Feature => tool.features.iter().any(|f| contains(f, term)),
            MatchRule::Category => catalog
                .category(&tool.category)
                .is_some_and(|c| contains(&c.name, term) || contains(&c.description, term)),
            MatchRule::Subcategory => catalog
                .subcategories_of(tool)
                .iter()
                .any(|s| contains(&s.name, term) || contains(&s.description, term)),
        }
    }
}

fn contains(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(term)
}

/// Search the catalog, best matches first.
///
/// Ties keep catalog order. A blank query yields no results.
pub fn search(query: &str, catalog: &Catalog) -> Vec<SearchResult> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<SearchResult> = catalog
        .tools
        .iter()
        .filter_map(|tool| {
            let rule = MatchRule::PRIORITY
                .into_iter()
                .find(|rule| rule.matches(&term, tool, catalog))?;
            Some(to_result(tool, rule, catalog))
        })
        .collect();

    // sort_by is stable
    results.sort_by(|a, b| b.match_score.cmp(&a.match_score));

    tracing::debug!(query = %term, matches = results.len(), "Catalog search");
    results
}

fn to_result(tool: &Tool, rule: MatchRule, catalog: &Catalog) -> SearchResult {
    SearchResult {
        tool: tool.clone(),
        match_score: rule.score(),
        match_reason: rule.reason().to_string(),
        category_name: catalog.category(&tool.category).map(|c| c.name.clone()),
        subcategory_name: catalog
            .subcategories_of(tool)
            .first()
            .map(|s| s.name.clone()),
    }
}

/// Total order applied to a result list. Each one replaces relevance order entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Relevance,
    Rating,
    Name,
}

/// Client-side category filter plus sort selector.
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    /// Category id; `None` or `"all"` keeps every category.
    pub category: Option<String>,
    pub sort: SortOrder,
}

/// Apply the category filter, then the selected sort order.
pub fn refine(mut results: Vec<SearchResult>, filter: &ResultFilter) -> Vec<SearchResult> {
    if let Some(category) = filter.category.as_deref().filter(|c| *c != "all") {
        results.retain(|r| r.tool.category == category);
    }

    match filter.sort {
        SortOrder::Relevance => results.sort_by(|a, b| b.match_score.cmp(&a.match_score)),
        SortOrder::Rating => results.sort_by(|a, b| b.tool.rating.total_cmp(&a.tool.rating)),
        SortOrder::Name => results.sort_by(|a, b| compare_names(&a.tool.name, &b.tool.name)),
    }

    results
}

/// Case-insensitive ordering for display names, ties broken by the raw strings.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
