//! Domain models for decks and resolved cards

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fully resolved card as returned by the resolution pipeline and stored
/// in the card cache. Replaced wholesale on refresh, never patched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardRecord {
    pub name: String,
    pub mana_cost: String,
    pub type_line: String,
    pub oracle_text: String,
    /// Power/toughness stay strings: "*", "1+*" and friends are valid values
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub colors: Vec<String>,
    pub rarity: String,
    pub set_code: String,
    #[serde(default)]
    pub image_data: Option<Vec<u8>>,
    /// When this record was produced by the API client or read from cache
    pub cached_at: DateTime<Utc>,
}

impl CardRecord {
    /// True for synthesized placeholder records (no real catalog data behind them)
    pub fn is_placeholder(&self) -> bool {
        self.rarity.is_empty() && self.set_code.is_empty()
    }
}

/// A user-facing lookup request: a card name, plus a quantity when the
/// request came from a deck entry. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRequest {
    pub name: String,
    pub quantity: Option<u32>,
}

impl CardRequest {
    /// Request a single card by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: None,
        }
    }

    /// Request `quantity` copies of a named card
    pub fn with_quantity(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity: Some(quantity),
        }
    }
}

/// One line of a deck: a request paired with its resolved record (if any)
#[derive(Debug, Clone)]
pub struct DeckEntry {
    pub request: CardRequest,
    pub record: Option<CardRecord>,
}

impl DeckEntry {
    pub fn new(request: CardRequest) -> Self {
        Self {
            request,
            record: None,
        }
    }

    /// Number of copies, clamped to at least 1
    pub fn quantity(&self) -> u32 {
        self.request.quantity.unwrap_or(1).max(1)
    }
}

/// A parsed deck: named list of entries, with an optional commander
#[derive(Debug, Clone, Default)]
pub struct Deck {
    pub name: String,
    pub commander: Option<DeckEntry>,
    pub entries: Vec<DeckEntry>,
}

impl Deck {
    /// Total card count across all entries (commander included)
    pub fn total_cards(&self) -> u32 {
        let main: u32 = self.entries.iter().map(|e| e.quantity()).sum();
        main + self.commander.as_ref().map_or(0, |c| c.quantity())
    }
}
