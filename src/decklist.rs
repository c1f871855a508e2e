//! Decklist text parser
//!
//! Accepts the common export format: optional "Commander"/"Deck" section
//! headers, `//` comments, and one `<quantity>[x] <name>` line per card.
//! Produces clean card names only; resolution happens elsewhere.

use crate::models::{CardRequest, Deck, DeckEntry};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DECK_LINE: Regex = Regex::new(r"^(\d+)x?\s+(.+)$").unwrap();
    static ref COMMANDER_LINE: Regex = Regex::new(r"^(?:1x?\s+)?(.+)$").unwrap();
}

/// Parse decklist text into a deck. Entry order follows the input.
pub fn parse_decklist(name: &str, text: &str) -> Deck {
    let mut deck = Deck {
        name: name.to_string(),
        ..Default::default()
    };
    let mut in_commander = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let lower = line.to_lowercase();
        let is_quantity_line = DECK_LINE.is_match(line);

        // Section headers are bare lines, never quantity lines
        if !is_quantity_line && lower.contains("commander") {
            in_commander = true;
            continue;
        }
        if !is_quantity_line && (lower.contains("deck") || lower.contains("main")) {
            in_commander = false;
            continue;
        }

        if in_commander {
            if let Some(caps) = COMMANDER_LINE.captures(line) {
                let card_name = caps[1].trim();
                deck.commander = Some(DeckEntry::new(CardRequest::with_quantity(card_name, 1)));
            }
            continue;
        }

        if let Some(caps) = DECK_LINE.captures(line) {
            let quantity: u32 = caps[1].parse().unwrap_or(1);
            let card_name = caps[2].trim();
            deck.entries
                .push(DeckEntry::new(CardRequest::with_quantity(card_name, quantity)));
        }
    }

    deck
}

#[cfg(test)]
#[path = "decklist_tests.rs"]
mod tests;
