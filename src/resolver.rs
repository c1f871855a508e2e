//! Resolution service: cache-first card lookup with bulk network fallback

use crate::api::{fallback_record, Lookup, ScryfallClient};
use crate::cache::{cache_key, CardCache};
use crate::models::{CardRecord, CardRequest, DeckEntry};
use std::collections::{HashMap, HashSet};

/// Terminal outcome of resolving one card. Every variant carries a valid
/// record; `Fallback` marks a synthesized placeholder.
#[derive(Debug)]
pub enum Resolution {
    Cached(CardRecord),
    Fetched(CardRecord),
    Fallback(CardRecord),
}

impl Resolution {
    pub fn record(&self) -> &CardRecord {
        match self {
            Resolution::Cached(r) | Resolution::Fetched(r) | Resolution::Fallback(r) => r,
        }
    }

    pub fn into_record(self) -> CardRecord {
        match self {
            Resolution::Cached(r) | Resolution::Fetched(r) | Resolution::Fallback(r) => r,
        }
    }
}

/// Orchestrates the cache store and the Scryfall client. The cache is
/// self-healing: every successful network fetch is written back.
pub struct Resolver {
    client: ScryfallClient,
    cache: CardCache,
}

impl Resolver {
    pub fn new(client: ScryfallClient, cache: CardCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &CardCache {
        &self.cache
    }

    pub fn client(&self) -> &ScryfallClient {
        &self.client
    }

    /// Resolve a single request: cache, then exact network lookup (which
    /// itself cascades to fuzzy), then fallback synthesis. The fallback is
    /// not cached; it carries no real data worth keeping.
    pub async fn resolve_one(&self, request: &CardRequest) -> Resolution {
        if let Some(record) = self.cache.lookup(&request.name) {
            return Resolution::Cached(record);
        }

        match self.client.fetch_exact(&request.name).await {
            Lookup::Found(record) => {
                self.cache.store(&request.name, &record);
                Resolution::Fetched(record)
            }
            Lookup::NotFound => {
                log::info!("No catalog match for '{}', using placeholder", request.name);
                Resolution::Fallback(fallback_record(&request.name, None))
            }
        }
    }

    /// Resolve a whole deck's worth of requests in at most one bulk pass
    /// over the uncached subset. Returns a name-to-record map covering
    /// every distinct requested name; the caller applies it to its own
    /// entries (see [`apply_records`]).
    pub async fn resolve_deck(&self, requests: &[CardRequest]) -> HashMap<String, CardRecord> {
        let mut resolved = HashMap::new();
        let mut missing: Vec<String> = Vec::new();
        let mut seen = HashSet::new();

        for request in requests {
            // Dedupe on the normalized key so case variants of the same
            // card share one lookup and one fetch.
            if !seen.insert(cache_key(&request.name)) {
                continue;
            }
            match self.cache.lookup(&request.name) {
                Some(record) => {
                    resolved.insert(request.name.clone(), record);
                }
                None => missing.push(request.name.clone()),
            }
        }

        if !missing.is_empty() {
            log::info!(
                "Resolving deck: {} cached, {} to fetch",
                resolved.len(),
                missing.len()
            );
            let fetched = self.client.fetch_bulk(&missing).await;
            for (name, record) in fetched {
                self.cache.store(&name, &record);
                resolved.insert(name, record);
            }
        } else {
            log::info!("Resolving deck: all {} cards cached", resolved.len());
        }

        resolved
    }
}

/// Apply a resolved name-to-record map to a caller's deck entries. Names
/// are matched through the normalized cache key, so case variants of one
/// card all receive a clone of the same record; quantities are never
/// touched.
pub fn apply_records(entries: &mut [DeckEntry], resolved: &HashMap<String, CardRecord>) {
    let by_key: HashMap<String, &CardRecord> = resolved
        .iter()
        .map(|(name, record)| (cache_key(name), record))
        .collect();

    for entry in entries.iter_mut() {
        if let Some(record) = by_key.get(&cache_key(&entry.request.name)) {
            entry.record = Some((*record).clone());
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
