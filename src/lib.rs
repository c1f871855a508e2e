//! Deck Resolver - MTG decklist resolution
//!
//! Resolves human-entered card names into fully populated card records via
//! the Scryfall API, with a two-tier (memory + disk) cache, local fuzzy
//! name correction and batched bulk fetching with partial-failure handling.

pub mod api;
pub mod cache;
pub mod decklist;
pub mod error;
pub mod models;
pub mod name_index;
pub mod resolver;

// Re-export commonly used items
pub use api::{fallback_record, Lookup, ScryfallClient};
pub use cache::{cache_key, CardCache};
pub use decklist::parse_decklist;
pub use error::{ApiError, ApiResult};
pub use models::{CardRecord, CardRequest, Deck, DeckEntry};
pub use name_index::NameIndex;
pub use resolver::{apply_records, Resolution, Resolver};
