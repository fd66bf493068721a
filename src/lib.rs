//! # Royale Meta
//!
//! A Clash Royale meta-deck tracker that scores the current top-ladder
//! meta against a player's own card collection.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (cards, decks, archetypes, profiles)
//! - **client**: HTTP client for the game-data service
//! - **analysis**: Sampling, deck extraction, and archetype aggregation
//! - **calculate**: Display levels and affinity scoring
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod analysis;
pub mod api;
pub mod calculate;
pub mod client;
pub mod config;
pub mod models;

pub use models::*;
