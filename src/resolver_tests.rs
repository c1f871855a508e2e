//! Tests for the resolution service (wiremock + tempfile backed)

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{apply_records, Resolution, Resolver};
use crate::api::ScryfallClient;
use crate::cache::CardCache;
use crate::models::{CardRecord, CardRequest, DeckEntry};
use chrono::Utc;
use tempfile::TempDir;

fn card_json(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "mana_cost": "",
        "type_line": "Basic Land",
        "oracle_text": "",
        "colors": [],
        "rarity": "common",
        "set": "lea"
    })
}

fn not_found_json() -> serde_json::Value {
    serde_json::json!({ "status": 404, "code": "not_found", "details": "No card found." })
}

fn record(name: &str) -> CardRecord {
    CardRecord {
        name: name.to_string(),
        mana_cost: "{1}".to_string(),
        type_line: "Artifact".to_string(),
        oracle_text: "{T}: Add {C}{C}.".to_string(),
        power: None,
        toughness: None,
        colors: vec![],
        rarity: "uncommon".to_string(),
        set_code: "lea".to_string(),
        image_data: None,
        cached_at: Utc::now(),
    }
}

fn resolver_for(server: &MockServer, dir: &TempDir) -> Resolver {
    Resolver::new(
        ScryfallClient::with_base_url(server.uri()),
        CardCache::new(dir.path()),
    )
}

#[tokio::test]
async fn resolve_one_fetches_then_serves_from_cache() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Exactly one network fetch for both requests
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .and(query_param("exact", "island"))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_json("Island")))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver_for(&server, &dir);

    let first = resolver.resolve_one(&CardRequest::named("island")).await;
    let first = match first {
        Resolution::Fetched(record) => record,
        other => panic!("expected a network fetch, got {:?}", other),
    };
    assert_eq!(first.name, "Island");

    // Different casing, same cache key: no second network call
    let second = resolver.resolve_one(&CardRequest::named("Island")).await;
    match second {
        Resolution::Cached(record) => assert_eq!(record, first),
        other => panic!("expected a cache hit, got {:?}", other),
    }
}

#[tokio::test]
async fn resolve_one_falls_back_when_nothing_matches() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_json()))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server, &dir);
    let result = resolver
        .resolve_one(&CardRequest::named("Nonexistent Card XYZ"))
        .await;

    let record = match result {
        Resolution::Fallback(record) => record,
        other => panic!("expected a fallback, got {:?}", other),
    };
    assert_eq!(record.name, "Nonexistent Card XYZ");
    assert_eq!(record.power.as_deref(), Some("0"));
    assert_eq!(record.toughness.as_deref(), Some("0"));
    assert!(record.colors.is_empty());

    // Placeholders carry no real data and are not cached
    assert!(resolver.cache().lookup("Nonexistent Card XYZ").is_none());
}

#[tokio::test]
async fn resolve_deck_bulk_fetches_only_the_uncached_subset() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let resolver = resolver_for(&server, &dir);

    // Sol Ring is already cached; only Lightning Bolt should hit the network
    let cached = record("Sol Ring");
    resolver.cache().store("Sol Ring", &cached);

    Mock::given(method("POST"))
        .and(path("/cards/collection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [card_json("Lightning Bolt")],
            "not_found": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let requests = vec![
        CardRequest::with_quantity("Sol Ring", 1),
        CardRequest::with_quantity("Lightning Bolt", 4),
    ];
    let resolved = resolver.resolve_deck(&requests).await;

    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved["Sol Ring"], cached);
    assert_eq!(resolved["Lightning Bolt"].name, "Lightning Bolt");

    // Bulk results are written back into the cache
    assert!(resolver.cache().lookup("Lightning Bolt").is_some());
}

#[tokio::test]
async fn resolve_deck_fully_cached_makes_no_network_calls() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let resolver = resolver_for(&server, &dir);

    Mock::given(method("POST"))
        .and(path("/cards/collection"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    resolver.cache().store("Sol Ring", &record("Sol Ring"));
    resolver.cache().store("Island", &record("Island"));

    let requests = vec![CardRequest::named("Sol Ring"), CardRequest::named("Island")];
    let resolved = resolver.resolve_deck(&requests).await;
    assert_eq!(resolved.len(), 2);
}

#[tokio::test]
async fn resolve_deck_deduplicates_requests_by_name() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let resolver = resolver_for(&server, &dir);

    Mock::given(method("POST"))
        .and(path("/cards/collection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [card_json("Island")],
            "not_found": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let requests = vec![
        CardRequest::with_quantity("Island", 10),
        CardRequest::with_quantity("Island", 14),
    ];
    let resolved = resolver.resolve_deck(&requests).await;
    assert_eq!(resolved.len(), 1);
}

#[tokio::test]
async fn resolve_deck_treats_case_variants_as_one_card() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let resolver = resolver_for(&server, &dir);

    Mock::given(method("POST"))
        .and(path("/cards/collection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [card_json("Island")],
            "not_found": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let requests = vec![
        CardRequest::with_quantity("Island", 10),
        CardRequest::with_quantity("island", 4),
    ];
    let resolved = resolver.resolve_deck(&requests).await;
    assert_eq!(resolved.len(), 1);

    // Both spellings receive the one shared record
    let mut entries: Vec<_> = requests.into_iter().map(DeckEntry::new).collect();
    apply_records(&mut entries, &resolved);
    for entry in &entries {
        assert_eq!(entry.record.as_ref().unwrap().name, "Island");
    }
}

#[tokio::test]
async fn resolve_deck_synthesizes_placeholders_for_unknown_names() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let resolver = resolver_for(&server, &dir);

    Mock::given(method("POST"))
        .and(path("/cards/collection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [card_json("Sol Ring")],
            "not_found": [{ "name": "Nonexistent Card XYZ" }]
        })))
        .mount(&server)
        .await;

    let requests = vec![
        CardRequest::named("Sol Ring"),
        CardRequest::named("Nonexistent Card XYZ"),
    ];
    let resolved = resolver.resolve_deck(&requests).await;

    assert_eq!(resolved.len(), 2);
    assert!(!resolved["Sol Ring"].is_placeholder());
    let placeholder = &resolved["Nonexistent Card XYZ"];
    assert_eq!(placeholder.name, "Nonexistent Card XYZ");
    assert!(placeholder.is_placeholder());
}

#[test]
fn apply_records_fills_every_matching_entry() {
    let mut entries = vec![
        DeckEntry::new(CardRequest::with_quantity("Island", 10)),
        DeckEntry::new(CardRequest::with_quantity("Sol Ring", 1)),
        DeckEntry::new(CardRequest::with_quantity("Island", 4)),
    ];

    let mut resolved = std::collections::HashMap::new();
    resolved.insert("Island".to_string(), record("Island"));

    apply_records(&mut entries, &resolved);

    assert_eq!(entries[0].record.as_ref().unwrap().name, "Island");
    assert_eq!(entries[2].record.as_ref().unwrap().name, "Island");
    assert!(entries[1].record.is_none());
    // Quantities are never touched by resolution
    assert_eq!(entries[0].quantity(), 10);
    assert_eq!(entries[2].quantity(), 4);
}
