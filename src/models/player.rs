//! Player profile models.

use serde::{Deserialize, Serialize};

use super::{PlayerTag, Rarity};

/// A card a player owns, as reported by the profile endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedCard {
    /// Card identifier; matches a `CardDefinition` id
    pub id: u32,

    /// Card name
    pub name: String,

    /// Raw progression level as reported by the source (may be 0)
    pub level: u32,

    /// Rarity as reported alongside the card, when present
    pub rarity: Option<Rarity>,

    /// Evolution level; >0 means the evolution is unlocked
    pub evolution_level: Option<u32>,
}

impl OwnedCard {
    /// Whether the evolution is unlocked for this card.
    pub fn evolution_unlocked(&self) -> bool {
        self.evolution_level.is_some_and(|lvl| lvl > 0)
    }
}

/// A player's profile, replaced wholesale on each search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Canonical player tag
    pub tag: PlayerTag,

    /// Display name
    pub name: String,

    /// Current trophy count
    pub trophies: u32,

    /// Experience level
    pub exp_level: u32,

    /// Full card collection, in source order
    pub cards: Vec<OwnedCard>,

    /// Currently equipped deck, as card ids
    pub current_deck: Vec<u32>,
}

impl PlayerProfile {
    /// Find an owned card by id.
    pub fn card(&self, id: u32) -> Option<&OwnedCard> {
        self.cards.iter().find(|c| c.id == id)
    }
}
