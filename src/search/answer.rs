//! Summary sentences for search results.
//!
//! The query is classified by an ordered table of intent patterns; the first match picks
//! the template. Rendering is deterministic. Only the typing delay is random.

use std::collections::HashSet;
use std::time::Duration;

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::models::SearchResult;

/// What the user appears to be asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Discovery,
    Best,
    Pricing,
    HowTo,
    Comparison,
    Alternatives,
}

/// Checked top to bottom; earlier entries win.
static INTENT_PATTERNS: Lazy<Vec<(Intent, Regex)>> = Lazy::new(|| {
    [
        // "recommended" is left to Best.
        (
            Intent::Discovery,
            r"\b(looking for|search(ing)? for|need(s|ed)?|want(s|ed)?|find(s|ing)?|recommend(s|ation|ations)?)\b",
        ),
        (Intent::Best, r"\b(best|top|leading|popular|recommended)\b"),
        (
            Intent::Pricing,
            r"\b(free|pricing|cost|affordable|cheap|budget)\w*",
        ),
        (
            Intent::HowTo,
            r"\b(how to|how do|how can)\b|\b(tutorial|guide|learn)\w*",
        ),
        (
            Intent::Comparison,
            r"\b(vs|versus|compar(e|es|ed|ing|ison|isons)|difference between|better than)\b",
        ),
        (
            Intent::Alternatives,
            r"\b(alternatives?|replacements?|instead of|similar to)\b",
        ),
    ]
    .into_iter()
    .map(|(intent, pattern)| (intent, Regex::new(pattern).expect("intent pattern")))
    .collect()
});

/// Classify a query, or `None` when no intent pattern matches.
pub fn classify(query: &str) -> Option<Intent> {
    let query = query.to_lowercase();
    INTENT_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&query))
        .map(|(intent, _)| *intent)
}

/// Render a one-paragraph summary of `results` for `query`.
///
/// Returns an empty string when there is nothing to summarize; callers should not render it.
pub fn generate_answer(query: &str, results: &[SearchResult]) -> String {
    let query = query.trim();
    if query.is_empty() || results.is_empty() {
        return String::new();
    }

    let stats = AnswerStats::new(results);
    match classify(query) {
        Some(intent) => intent.render(&stats),
        None => render_default(query, &stats),
    }
}

/// Random 500-1500 ms pause shown before an answer appears.
pub fn simulate_typing_delay() -> Duration {
    Duration::from_millis(rand::rng().random_range(500..=1500))
}

struct AnswerStats<'a> {
    results: &'a [SearchResult],
    categories: Vec<&'a str>,
    average_rating: f64,
    free_count: usize,
    top_rated: &'a SearchResult,
}

impl<'a> AnswerStats<'a> {
    /// `results` must be non-empty.
    fn new(results: &'a [SearchResult]) -> Self {
        let mut seen = HashSet::new();
        let categories = results
            .iter()
            .filter_map(|r| r.category_name.as_deref())
            .filter(|name| seen.insert(*name))
            .collect();

        let average_rating =
            results.iter().map(|r| r.tool.rating).sum::<f64>() / results.len() as f64;

        let free_count = results
            .iter()
            .filter(|r| r.tool.pricing.has_free_tier())
            .count();

        // First result wins rating ties.
        let top_rated = results.iter().skip(1).fold(&results[0], |best, r| {
            if r.tool.rating > best.tool.rating {
                r
            } else {
                best
            }
        });

        Self {
            results,
            categories,
            average_rating,
            free_count,
            top_rated,
        }
    }

    fn total(&self) -> usize {
        self.results.len()
    }

    fn first(&self) -> &'a SearchResult {
        &self.results[0]
    }

    fn names(&self, limit: usize) -> Vec<&'a str> {
        self.results
            .iter()
            .take(limit)
            .map(|r| r.tool.name.as_str())
            .collect()
    }

    fn rating_range(&self) -> (f64, f64) {
        self.results
            .iter()
            .map(|r| r.tool.rating)
            .fold((f64::MAX, f64::MIN), |(lo, hi), rating| {
                (lo.min(rating), hi.max(rating))
            })
    }
}

impl Intent {
    fn render(self, stats: &AnswerStats<'_>) -> String {
        match self {
            Intent::Discovery => format!(
                "I found {} that match what you're looking for. Top matches include {}. {} with an average rating of {:.1}/5.",
                count_tools(stats.total()),
                join_names(&stats.names(3)),
                category_coverage(&stats.categories),
                stats.average_rating,
            ),
            Intent::Best => {
                let top = stats.top_rated;
                let others: Vec<&str> = stats
                    .results
                    .iter()
                    .filter(|r| !std::ptr::eq(*r, top))
                    .take(4)
                    .map(|r| r.tool.name.as_str())
                    .collect();

                let mut answer = format!(
                    "The top-rated choice is {}, rated {:.1}/5 by {} reviewers.",
                    top.tool.name, top.tool.rating, top.tool.review_count,
                );
                if !others.is_empty() {
                    answer.push_str(&format!(
                        " Other leading options include {}.",
                        join_names(&others)
                    ));
                }
                answer.push_str(&format!(
                    " Across {}, the average rating is {:.1}/5.",
                    count_tools(stats.total()),
                    stats.average_rating,
                ));
                answer
            }
            Intent::Pricing => {
                if stats.free_count == 0 {
                    return format!(
                        "None of the {} offers a free plan. {} are paid options worth comparing on features.",
                        count_tools(stats.total()),
                        join_names(&stats.names(3)),
                    );
                }

                let free_names: Vec<&str> = stats
                    .results
                    .iter()
                    .filter(|r| r.tool.pricing.has_free_tier())
                    .take(3)
                    .map(|r| r.tool.name.as_str())
                    .collect();
                let mut answer = format!(
                    "{} of the {} {} a free or freemium plan, including {}.",
                    stats.free_count,
                    count_tools(stats.total()),
                    verb(stats.free_count, "offers", "offer"),
                    join_names(&free_names),
                );
                let paid = stats.total() - stats.free_count;
                if paid > 0 {
                    answer.push_str(&format!(
                        " The remaining {} {} a paid subscription.",
                        paid,
                        verb(paid, "requires", "require"),
                    ));
                }
                answer
            }
            Intent::HowTo => {
                let first = stats.first();
                format!(
                    "To get started, try {}. {} is a good first step, rated {:.1}/5 from {} reviews. Browse all {} to compare features.",
                    join_names(&stats.names(3)),
                    first.tool.name,
                    first.tool.rating,
                    first.tool.review_count,
                    count_tools(stats.total()),
                )
            }
            Intent::Comparison => {
                let (low, high) = stats.rating_range();
                format!(
                    "Comparing {}: {}. Ratings range from {:.1} to {:.1}/5, and {} {} a free or freemium plan.",
                    count_tools(stats.total()),
                    join_names(&stats.names(5)),
                    low,
                    high,
                    stats.free_count,
                    verb(stats.free_count, "offers", "offer"),
                )
            }
            Intent::Alternatives => format!(
                "Here are {} worth considering as alternatives: {}. {} leads with a {:.1}/5 rating.",
                count_tools(stats.total()),
                join_names(&stats.names(5)),
                stats.top_rated.tool.name,
                stats.top_rated.tool.rating,
            ),
        }
    }
}

fn render_default(query: &str, stats: &AnswerStats<'_>) -> String {
    let top = join_names(&stats.names(3));
    match stats.categories.len() {
        1 => format!(
            "Every match is in {}. Start with {}; the {} here average {:.1}/5.",
            stats.categories[0],
            top,
            count_tools(stats.total()),
            stats.average_rating,
        ),
        n if n >= 5 => format!(
            "Your search covers a comprehensive range of {} categories, including {}, with {} in total. Top matches: {}.",
            n,
            join_names(&stats.categories[..3]),
            count_tools(stats.total()),
            top,
        ),
        n if n >= 2 => format!(
            "Results span {} categories: {}. Highlights include {}.",
            n,
            join_names(&stats.categories),
            top,
        ),
        _ => format!(
            "Found {} matching \"{}\". Top matches: {}.",
            count_tools(stats.total()),
            query,
            top,
        ),
    }
}

fn category_coverage(categories: &[&str]) -> String {
    match categories.len() {
        0 => "They come from across the catalog".to_string(),
        1 => format!("They are all in {}", categories[0]),
        _ => format!("They span {}", join_names(categories)),
    }
}

fn count_tools(n: usize) -> String {
    if n == 1 {
        "1 tool".to_string()
    } else {
        format!("{} tools", n)
    }
}

fn verb(n: usize, singular: &'static str, plural: &'static str) -> &'static str {
    if n == 1 {
        singular
    } else {
        plural
    }
}

/// "A", "A and B", "A, B and C".
fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}
