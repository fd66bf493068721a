//! Wire formats for the game-data service.
//!
//! These structs mirror the upstream JSON (camelCase) and are converted into
//! crate models at the client boundary.

use serde::Deserialize;

use crate::models::{
    CardDefinition, OwnedCard, PlayerProfile, PlayerTag, Rarity, DECK_SIZE,
};

use super::ClientError;

/// Generic `{ "items": [...] }` listing wrapper.
#[derive(Debug, Deserialize)]
pub struct Paged<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconUrls {
    pub medium: Option<String>,
    pub evolution_medium: Option<String>,
}

/// A card definition as returned by the catalog endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCard {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub max_level: u32,
    #[serde(default)]
    pub elixir_cost: Option<u8>,
    #[serde(default)]
    pub icon_urls: IconUrls,
}

impl From<ApiCard> for CardDefinition {
    fn from(card: ApiCard) -> Self {
        CardDefinition {
            id: card.id,
            name: card.name,
            rarity: card
                .rarity
                .as_deref()
                .map(Rarity::from_name)
                .unwrap_or_default(),
            elixir_cost: card.elixir_cost.unwrap_or(0),
            max_level: card.max_level,
            icon_url: card.icon_urls.medium,
            evolution_icon_url: card.icon_urls.evolution_medium,
        }
    }
}

/// A card as it appears inside a player profile or deck.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlayerCard {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub evolution_level: Option<u32>,
}

impl From<ApiPlayerCard> for OwnedCard {
    fn from(card: ApiPlayerCard) -> Self {
        OwnedCard {
            id: card.id,
            name: card.name,
            level: card.level,
            rarity: card.rarity.as_deref().map(Rarity::from_name),
            evolution_level: card.evolution_level,
        }
    }
}

/// A player profile as returned by the players endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfile {
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub exp_level: u32,
    #[serde(default)]
    pub trophies: u32,
    #[serde(default)]
    pub cards: Vec<ApiPlayerCard>,
    #[serde(default)]
    pub current_deck: Vec<ApiPlayerCard>,
}

impl TryFrom<ApiProfile> for PlayerProfile {
    type Error = ClientError;

    fn try_from(profile: ApiProfile) -> Result<Self, Self::Error> {
        let tag = PlayerTag::parse(&profile.tag)
            .map_err(|e| ClientError::MalformedResponse(format!("profile tag: {e}")))?;

        Ok(PlayerProfile {
            tag,
            name: profile.name,
            trophies: profile.trophies,
            exp_level: profile.exp_level,
            cards: profile.cards.into_iter().map(OwnedCard::from).collect(),
            current_deck: profile.current_deck.iter().map(|c| c.id).collect(),
        })
    }
}

/// One entry of a seasons listing; the most recent season is the last item.
#[derive(Debug, Clone, Deserialize)]
pub struct SeasonRef {
    pub id: String,
}

/// One row of a rankings page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub tag: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub elo_rating: Option<u32>,
    #[serde(default)]
    pub trophies: Option<u32>,
}

impl RankingEntry {
    /// Rating for archetype tracking: elo when present, trophies otherwise.
    pub fn rating(&self) -> u32 {
        self.elo_rating.or(self.trophies).unwrap_or(0)
    }
}

/// One battle-log entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleLogEntry {
    #[serde(rename = "type", default)]
    pub match_type: String,
    #[serde(default)]
    pub team: Vec<TeamEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntry {
    #[serde(default)]
    pub cards: Vec<ApiPlayerCard>,
}

impl TeamEntry {
    /// The entry's deck as 8 card ids, when it has exactly a full deck.
    pub fn deck(&self) -> Option<[u32; DECK_SIZE]> {
        let ids: Vec<u32> = self.cards.iter().map(|c| c.id).collect();
        ids.try_into().ok()
    }
}
