//! Local fuzzy index over the canonical card name catalog
//!
//! Loaded once per process from the Scryfall name catalog and queried
//! read-only to correct user typos before any per-card network call.

use crate::api::ScryfallClient;
use crate::error::ApiResult;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Inputs shorter than this carry too little signal to rank
const MIN_QUERY_LEN: usize = 2;
/// Partial token hits rank just below whole-string matches
const TOKEN_WEIGHT: f64 = 0.95;

/// Immutable snapshot of all known canonical card names
#[derive(Default)]
pub struct NameIndex {
    names: OnceLock<Vec<String>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a fixed corpus (tests, offline use)
    pub fn from_names(names: Vec<String>) -> Self {
        let index = Self::new();
        let _ = index.names.set(names);
        index
    }

    /// Fetch the full name catalog once. Safe to call again; the first
    /// loaded corpus wins. Lookups before loading return empty results.
    pub async fn load(&self, client: &ScryfallClient) -> ApiResult<usize> {
        if let Some(names) = self.names.get() {
            log::debug!("Name index already loaded");
            return Ok(names.len());
        }

        let names = client.card_names().await?;
        let count = names.len();
        let _ = self.names.set(names);
        log::info!("Loaded name index with {} card names", count);
        Ok(count)
    }

    pub fn is_loaded(&self) -> bool {
        self.names.get().is_some()
    }

    /// The single closest canonical name to a free-text input
    pub fn best_match(&self, input: &str) -> Option<String> {
        self.top_matches(input, 1).into_iter().next()
    }

    /// Up to `limit` closest names, best-first. Deterministic for a given
    /// corpus and input; empty for unloaded indexes and sub-2-char input.
    pub fn top_matches(&self, input: &str, limit: usize) -> Vec<String> {
        let query = input.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }
        let Some(names) = self.names.get() else {
            return Vec::new();
        };

        let query = query.to_lowercase();
        let mut scored: Vec<(f64, &String)> = names
            .iter()
            .map(|name| (similarity(&query, &name.to_lowercase()), name))
            .collect();

        // Best score first; ties broken by name order for determinism
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.clone())
            .collect()
    }
}

/// Similarity of a lowercased query to a lowercased candidate: the better
/// of the whole-string ratio and a token-level pass that scores each query
/// token against its best candidate token.
fn similarity(query: &str, candidate: &str) -> f64 {
    if query == candidate {
        return 1.0;
    }

    let whole = ratio(query, candidate);

    let query_tokens: Vec<&str> = query.split_whitespace().collect();
    let candidate_tokens: Vec<&str> = candidate.split_whitespace().collect();
    if query_tokens.is_empty() || candidate_tokens.is_empty() {
        return whole;
    }

    let token_sum: f64 = query_tokens
        .iter()
        .map(|q| {
            candidate_tokens
                .iter()
                .map(|c| ratio(q, c))
                .fold(0.0, f64::max)
        })
        .sum();
    let token_avg = token_sum / query_tokens.len() as f64;

    whole.max(token_avg * TOKEN_WEIGHT)
}

/// Normalized similarity ratio in [0, 1] based on edit distance
fn ratio(a: &str, b: &str) -> f64 {
    let len = a.chars().count().max(b.chars().count());
    if len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / len as f64
}

/// Character-level edit distance (two-row dynamic programming)
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
#[path = "name_index_tests.rs"]
mod tests;
