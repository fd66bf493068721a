//! HTTP client for the game-data service.
//!
//! Wraps the Clash Royale public API behind the [`RoyaleApi`] trait so the
//! analysis engine can run against a mock in tests. Wire formats live in
//! [`wire`]; conversions into crate models happen here at the boundary.

pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::models::{CardDefinition, PlayerProfile, PlayerTag, DECK_SIZE};

use wire::{ApiCard, ApiProfile, BattleLogEntry, Paged, RankingEntry, SeasonRef};

/// Errors that can occur talking to the game-data service.
///
/// All of these are transport-level failures; whether one is fatal depends
/// on the caller's fallback policy.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, without a trailing slash
    pub base_url: String,

    /// Bearer token for the Authorization header
    pub token: String,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.clashroyale.com/v1".to_string(),
            token: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Typed access to the game-data service.
#[async_trait]
pub trait RoyaleApi: Send + Sync {
    /// Fetch a player's profile (collection, trophies, current deck).
    async fn fetch_profile(&self, tag: &PlayerTag) -> Result<PlayerProfile, ClientError>;

    /// Fetch the full card catalog.
    async fn fetch_card_catalog(&self) -> Result<Vec<CardDefinition>, ClientError>;

    /// Fetch the season listing; the most recent season is the last item.
    async fn fetch_seasons(&self) -> Result<Vec<String>, ClientError>;

    /// Fetch one rankings page by endpoint path (including query string).
    async fn fetch_rankings_page(&self, path: &str) -> Result<Vec<RankingEntry>, ClientError>;

    /// Fetch a player's battle log, most recent first.
    async fn fetch_battle_log(&self, tag: &PlayerTag) -> Result<Vec<BattleLogEntry>, ClientError>;

    /// Fetch a player's currently equipped deck, when it is a full 8 cards.
    async fn fetch_current_deck(
        &self,
        tag: &PlayerTag,
    ) -> Result<Option<[u32; DECK_SIZE]>, ClientError>;
}

/// Production [`RoyaleApi`] implementation over reqwest.
pub struct RoyaleClient {
    client: Client,
    base_url: String,
}

impl RoyaleClient {
    /// Create a client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        // Validate the base URL up front rather than on first request.
        url::Url::parse(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if !config.token.is_empty() {
            let bearer = format!("Bearer {}", config.token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&bearer)
                    .map_err(|_| ClientError::MalformedResponse("invalid API token".into()))?,
            );
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a path relative to the base URL and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.json().await?)
    }

    async fn get_profile_wire(&self, tag: &PlayerTag) -> Result<ApiProfile, ClientError> {
        self.get_json(&format!("/players/{}", tag.url_encoded()))
            .await
    }
}

#[async_trait]
impl RoyaleApi for RoyaleClient {
    async fn fetch_profile(&self, tag: &PlayerTag) -> Result<PlayerProfile, ClientError> {
        let wire = self.get_profile_wire(tag).await?;
        PlayerProfile::try_from(wire)
    }

    async fn fetch_card_catalog(&self) -> Result<Vec<CardDefinition>, ClientError> {
        let page: Paged<ApiCard> = self.get_json("/cards").await?;
        Ok(page.items.into_iter().map(CardDefinition::from).collect())
    }

    async fn fetch_seasons(&self) -> Result<Vec<String>, ClientError> {
        let page: Paged<SeasonRef> = self.get_json("/locations/global/seasons").await?;
        Ok(page.items.into_iter().map(|s| s.id).collect())
    }

    async fn fetch_rankings_page(&self, path: &str) -> Result<Vec<RankingEntry>, ClientError> {
        let page: Paged<RankingEntry> = self.get_json(path).await?;
        Ok(page.items)
    }

    async fn fetch_battle_log(&self, tag: &PlayerTag) -> Result<Vec<BattleLogEntry>, ClientError> {
        self.get_json(&format!("/players/{}/battlelog", tag.url_encoded()))
            .await
    }

    async fn fetch_current_deck(
        &self,
        tag: &PlayerTag,
    ) -> Result<Option<[u32; DECK_SIZE]>, ClientError> {
        let wire = self.get_profile_wire(tag).await?;
        let ids: Vec<u32> = wire.current_deck.iter().map(|c| c.id).collect();
        Ok(ids.try_into().ok())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.clashroyale.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_client_rejects_bad_base_url() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            RoyaleClient::new(config),
            Err(ClientError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let config = ClientConfig {
            base_url: "https://api.clashroyale.com/v1/".to_string(),
            ..Default::default()
        };
        let client = RoyaleClient::new(config).unwrap();
        assert_eq!(client.base_url, "https://api.clashroyale.com/v1");
    }
}
