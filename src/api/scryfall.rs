//! Scryfall API client: single-card, bulk-collection and catalog lookups
//!
//! All network failures are logged and degrade to `Lookup::NotFound` or a
//! synthesized placeholder record; nothing here is fatal to the caller.

use crate::error::{ApiError, ApiResult};
use crate::models::CardRecord;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::sleep;

const SCRYFALL_API: &str = "https://api.scryfall.com";
const USER_AGENT: &str = "DeckResolver/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Scryfall's documented ceiling for /cards/collection identifiers
const BATCH_SIZE: usize = 75;
/// Courtesy delay between successive bulk batch requests
const BATCH_DELAY: Duration = Duration::from_millis(100);
/// Courtesy delay before each per-card request when a batch has failed
const SINGLE_RETRY_DELAY: Duration = Duration::from_millis(75);
/// Courtesy delay before fuzzy lookups and image downloads
const COURTESY_DELAY: Duration = Duration::from_millis(50);

/// Scryfall card response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScryfallCard {
    pub name: String,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub type_line: Option<String>,
    #[serde(default)]
    pub oracle_text: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub toughness: Option<String>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub set: Option<String>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    /// For double-faced cards, images are in card_faces
    #[serde(default)]
    pub card_faces: Option<Vec<CardFace>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImageUris {
    pub small: Option<String>,
    pub normal: Option<String>,
    pub large: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CardFace {
    pub name: String,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

impl ScryfallCard {
    /// Get the primary image URL (normal size)
    pub fn image_url(&self) -> Option<&str> {
        // Try direct image_uris first
        if let Some(ref uris) = self.image_uris {
            return uris.normal.as_deref();
        }
        // For double-faced cards, get front face image
        if let Some(ref faces) = self.card_faces {
            if let Some(face) = faces.first() {
                if let Some(ref uris) = face.image_uris {
                    return uris.normal.as_deref();
                }
            }
        }
        None
    }
}

/// Identifier entry for a /cards/collection request
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkIdentifier {
    pub name: String,
}

#[derive(Debug, Serialize)]
struct BulkRequest {
    identifiers: Vec<BulkIdentifier>,
}

/// Response from /cards/collection: found cards plus unmatched identifiers
#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub data: Vec<ScryfallCard>,
    #[serde(default)]
    pub not_found: Vec<BulkIdentifier>,
}

#[derive(Debug, Deserialize)]
struct CardNamesResponse {
    data: Vec<String>,
}

/// Outcome of a single-card network lookup. "Not found" is a first-class
/// result, not an error; transport failures are logged and collapse into it.
#[derive(Debug)]
pub enum Lookup {
    Found(CardRecord),
    NotFound,
}

impl Lookup {
    pub fn into_option(self) -> Option<CardRecord> {
        match self {
            Lookup::Found(record) => Some(record),
            Lookup::NotFound => None,
        }
    }
}

/// Client for the Scryfall REST API
pub struct ScryfallClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for ScryfallClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScryfallClient {
    pub fn new() -> Self {
        Self::with_base_url(SCRYFALL_API)
    }

    /// Client pointed at an alternate base URL (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .header("User-Agent", USER_AGENT)
    }

    /// Fetch a card by exact name. A "not found" response cascades to a
    /// fuzzy lookup; any other failure is logged and yields `NotFound`.
    pub async fn fetch_exact(&self, name: &str) -> Lookup {
        let url = format!(
            "{}/cards/named?exact={}",
            self.base_url,
            urlencoding::encode(name)
        );

        match self.get_card(&url).await {
            Ok(Some(card)) => Lookup::Found(self.to_record(card).await),
            Ok(None) => {
                log::debug!("No exact match for '{}', trying fuzzy lookup", name);
                self.fetch_fuzzy(name).await
            }
            Err(e) => {
                log::warn!("Error fetching card '{}': {}", name, e);
                Lookup::NotFound
            }
        }
    }

    /// Fetch a card by fuzzy name match
    pub async fn fetch_fuzzy(&self, name: &str) -> Lookup {
        sleep(COURTESY_DELAY).await;

        let url = format!(
            "{}/cards/named?fuzzy={}",
            self.base_url,
            urlencoding::encode(name)
        );

        match self.get_card(&url).await {
            Ok(Some(card)) => Lookup::Found(self.to_record(card).await),
            Ok(None) => Lookup::NotFound,
            Err(e) => {
                log::warn!("Error in fuzzy lookup for '{}': {}", name, e);
                Lookup::NotFound
            }
        }
    }

    /// GET a single card endpoint. 404 maps to Ok(None); any other error
    /// status or transport failure is an error for the caller to log.
    async fn get_card(&self, url: &str) -> ApiResult<Option<ScryfallCard>> {
        let response = self.get(url).send().await?;

        if response.status().is_success() {
            Ok(Some(response.json::<ScryfallCard>().await?))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Err(ApiError::HttpStatus(response.status()))
        }
    }

    /// Download artwork bytes. Absent URL or any failure yields None; a
    /// card without an image is a valid state, not an error.
    pub async fn fetch_image(&self, url: &str) -> Option<Vec<u8>> {
        if url.is_empty() {
            return None;
        }

        sleep(COURTESY_DELAY).await;

        match self.get(url).send().await {
            Ok(response) if response.status().is_success() => match response.bytes().await {
                Ok(bytes) => Some(bytes.to_vec()),
                Err(e) => {
                    log::warn!("Failed to read image bytes from {}: {}", url, e);
                    None
                }
            },
            Ok(response) => {
                log::warn!("Image fetch failed with status {}: {}", response.status(), url);
                None
            }
            Err(e) => {
                log::warn!("Error downloading image {}: {}", url, e);
                None
            }
        }
    }

    /// Resolve many card names in one pass. Names are deduplicated, split
    /// into batches of 75 and submitted sequentially. A failed batch
    /// degrades to per-card exact lookups. The result always contains
    /// exactly one record per distinct input name: found, fuzzy-resolved
    /// or synthesized placeholder.
    pub async fn fetch_bulk(&self, names: &[String]) -> HashMap<String, CardRecord> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = names
            .iter()
            .filter(|n| seen.insert(n.to_lowercase()))
            .collect();

        let mut result = HashMap::new();

        for batch in unique.chunks(BATCH_SIZE) {
            match self.fetch_batch(batch).await {
                Ok(batch_result) => {
                    result.extend(batch_result);
                    // Rate limiting between batches
                    sleep(BATCH_DELAY).await;
                }
                Err(e) => {
                    log::warn!(
                        "Bulk request for {} cards failed, falling back to individual lookups: {}",
                        batch.len(),
                        e
                    );

                    for name in batch {
                        sleep(SINGLE_RETRY_DELAY).await;
                        match self.fetch_exact(name).await {
                            Lookup::Found(record) => {
                                result.insert((*name).clone(), record);
                            }
                            Lookup::NotFound => {
                                result.insert((*name).clone(), fallback_record(name, None));
                            }
                        }
                    }
                }
            }
        }

        result
    }

    /// Submit one batch to /cards/collection and convert the response.
    /// Found cards are keyed by the requested name (matched back
    /// case-insensitively, also by front face for double-faced cards);
    /// unmatched identifiers get placeholder records. Every requested
    /// name ends up with exactly one entry.
    async fn fetch_batch(&self, batch: &[&String]) -> ApiResult<HashMap<String, CardRecord>> {
        let payload = BulkRequest {
            identifiers: batch
                .iter()
                .map(|n| BulkIdentifier { name: (*n).clone() })
                .collect(),
        };

        let response = self
            .http
            .post(format!("{}/cards/collection", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .header("User-Agent", USER_AGENT)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }

        let bulk: BulkResponse = response.json().await?;

        let requested: HashMap<String, &String> =
            batch.iter().map(|n| (n.to_lowercase(), *n)).collect();

        let mut result = HashMap::new();

        for card in bulk.data {
            // Double-faced cards come back as "Front // Back", so a request
            // for the front face alone must match the combined name too.
            let front_face = card.name.split(" // ").next().unwrap_or(&card.name);
            let key = requested
                .get(&card.name.to_lowercase())
                .or_else(|| requested.get(&front_face.to_lowercase()))
                .map(|n| (*n).clone())
                .unwrap_or_else(|| card.name.clone());
            let record = self.to_record(card).await;
            result.insert(key, record);
        }

        for missing in bulk.not_found {
            log::info!("Card not in catalog, synthesizing placeholder: {}", missing.name);
            result.insert(missing.name.clone(), fallback_record(&missing.name, None));
        }

        // A response card we could not match back leaves its requested
        // name unanswered; give that name a placeholder instead.
        for name in batch {
            if !result.contains_key(*name) {
                log::warn!("No match for {} in batch response, using placeholder", name);
                result.insert((*name).clone(), fallback_record(name, None));
            }
        }

        Ok(result)
    }

    /// Fetch the full canonical card name catalog (one large GET)
    pub async fn card_names(&self) -> ApiResult<Vec<String>> {
        let url = format!("{}/catalog/card-names", self.base_url);
        let response = self.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }

        let names: CardNamesResponse = response.json().await?;
        Ok(names.data)
    }

    /// Convert a wire card into a resolved record, downloading its artwork
    async fn to_record(&self, card: ScryfallCard) -> CardRecord {
        let image_url = card.image_url().map(String::from);
        let image_data = match image_url {
            Some(url) => self.fetch_image(&url).await,
            None => None,
        };

        CardRecord {
            name: card.name,
            mana_cost: card.mana_cost.unwrap_or_default(),
            type_line: card.type_line.unwrap_or_default(),
            oracle_text: card.oracle_text.unwrap_or_default(),
            power: card.power,
            toughness: card.toughness,
            colors: card.colors.unwrap_or_default(),
            rarity: card.rarity.unwrap_or_else(|| "common".to_string()),
            set_code: card.set.unwrap_or_default(),
            image_data,
            cached_at: Utc::now(),
        }
    }
}

/// Synthesize a minimal placeholder record for a name the catalog could not
/// resolve, carrying over any locally-known fields so the caller always
/// receives a structurally valid card.
pub fn fallback_record(name: &str, known: Option<&CardRecord>) -> CardRecord {
    CardRecord {
        name: name.to_string(),
        mana_cost: known.map(|c| c.mana_cost.clone()).unwrap_or_default(),
        type_line: known.map(|c| c.type_line.clone()).unwrap_or_default(),
        oracle_text: known.map(|c| c.oracle_text.clone()).unwrap_or_default(),
        power: Some("0".to_string()),
        toughness: Some("0".to_string()),
        colors: Vec::new(),
        rarity: String::new(),
        set_code: String::new(),
        image_data: None,
        cached_at: Utc::now(),
    }
}

#[cfg(test)]
#[path = "scryfall_tests.rs"]
mod tests;
