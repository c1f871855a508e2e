//! Deck Resolver - MTG decklist resolution
//!
//! Resolves a decklist text file into full card data (rules text, mana
//! cost, artwork) via Scryfall, caching everything on disk for a day.

use clap::Parser;
use deck_resolver::{
    apply_records, parse_decklist, CardCache, DeckEntry, NameIndex, Resolver, ScryfallClient,
};
use std::path::PathBuf;

/// Resolve an MTG decklist into full card data via Scryfall
#[derive(Parser, Debug)]
#[command(name = "deck_resolver")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the decklist text file
    decklist: Option<PathBuf>,

    /// Directory for the on-disk card cache
    #[arg(long, default_value_t = default_cache_dir())]
    cache_dir: String,

    /// Delete the entire card cache before doing anything else
    #[arg(long, default_value_t = false)]
    clear_cache: bool,

    /// Sweep cache entries older than the freshness window
    #[arg(long, default_value_t = false)]
    purge_stale: bool,

    /// Suggest canonical card names for a possibly misspelled input
    #[arg(long)]
    suggest: Option<String>,
}

/// Returns the default cache directory: ~/.cache/deck_resolver/card_cache
fn default_cache_dir() -> String {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deck_resolver")
        .join("card_cache")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let cache = CardCache::new(&PathBuf::from(&args.cache_dir));
    if args.clear_cache {
        cache.purge_all();
    }
    if args.purge_stale {
        cache.purge_stale();
    }

    let client = ScryfallClient::new();

    if let Some(query) = args.suggest {
        suggest(&client, &query).await;
        return;
    }

    let Some(path) = args.decklist else {
        log::error!("No decklist given; pass a file path or use --suggest");
        std::process::exit(1);
    };

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            log::error!("Failed to read decklist {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let deck_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "deck".to_string());
    let mut deck = parse_decklist(&deck_name, &text);
    log::info!(
        "Parsed deck '{}': {} entries, {} cards",
        deck.name,
        deck.entries.len(),
        deck.total_cards()
    );

    let resolver = Resolver::new(client, cache);

    let mut requests: Vec<_> = deck.entries.iter().map(|e| e.request.clone()).collect();
    if let Some(commander) = &deck.commander {
        requests.push(commander.request.clone());
    }

    let resolved = resolver.resolve_deck(&requests).await;
    apply_records(&mut deck.entries, &resolved);
    if let Some(commander) = deck.commander.as_mut() {
        apply_records(std::slice::from_mut(commander), &resolved);
    }

    if let Some(commander) = &deck.commander {
        println!("Commander:");
        print_entry(commander);
    }
    println!("Deck ({} cards):", deck.total_cards());
    for entry in &deck.entries {
        print_entry(entry);
    }

    let placeholders = deck
        .entries
        .iter()
        .filter(|e| e.record.as_ref().is_some_and(|r| r.is_placeholder()))
        .count();
    if placeholders > 0 {
        println!("{} card(s) could not be resolved and got placeholders", placeholders);
    }
}

fn print_entry(entry: &DeckEntry) {
    match &entry.record {
        Some(record) => {
            let marker = if record.is_placeholder() { "  [?]" } else { "" };
            println!(
                "  {}x {} {} - {}{}",
                entry.quantity(),
                record.name,
                record.mana_cost,
                record.type_line,
                marker
            );
        }
        None => println!("  {}x {} (unresolved)", entry.quantity(), entry.request.name),
    }
}

async fn suggest(client: &ScryfallClient, query: &str) {
    let index = NameIndex::new();
    if let Err(e) = index.load(client).await {
        log::error!("Failed to load card name catalog: {}", e);
        std::process::exit(1);
    }

    let matches = index.top_matches(query, 5);
    if matches.is_empty() {
        println!("No suggestions for '{}'", query);
        return;
    }
    println!("Closest matches for '{}':", query);
    for name in matches {
        println!("  {}", name);
    }
}
