//! Caching layer for resolved cards

pub mod card_cache;

pub use card_cache::{cache_key, CardCache};
