//! Card catalog models.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Card rarity tiers.
///
/// The upstream API spells these lowercase; `"hero"` is a legacy alias for
/// champion that still shows up in some responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
    #[serde(alias = "hero")]
    Champion,
}

impl Rarity {
    /// Parse a rarity name case-insensitively. Unknown names fall back to
    /// common, matching how the source game treats unrecognized rarities.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "rare" => Rarity::Rare,
            "epic" => Rarity::Epic,
            "legendary" => Rarity::Legendary,
            "champion" | "hero" => Rarity::Champion,
            _ => Rarity::Common,
        }
    }

    /// Base display level for this rarity.
    ///
    /// Different rarities start at different absolute levels in the source
    /// game; the base anchors them onto one comparable scale.
    pub fn base_level(self) -> u32 {
        match self {
            Rarity::Common => 1,
            Rarity::Rare => 3,
            Rarity::Epic => 6,
            Rarity::Legendary => 9,
            Rarity::Champion => 11,
        }
    }
}

/// A card definition from the game catalog.
///
/// Immutable once loaded; fetched from the catalog endpoint once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Unique card identifier
    pub id: u32,

    /// Card name
    pub name: String,

    /// Rarity tier
    pub rarity: Rarity,

    /// Elixir cost (0-10)
    pub elixir_cost: u8,

    /// Maximum raw level
    pub max_level: u32,

    /// Regular icon URL
    pub icon_url: Option<String>,

    /// Evolution icon URL; present iff the card has an evolution
    pub evolution_icon_url: Option<String>,
}

impl CardDefinition {
    /// Whether this card can be evolved.
    pub fn has_evolution(&self) -> bool {
        self.evolution_icon_url.is_some()
    }

    /// Icon to show for a missing evolution: the evolution art when the
    /// catalog has it, the regular art otherwise.
    pub fn evolution_display_icon(&self) -> Option<String> {
        self.evolution_icon_url
            .clone()
            .or_else(|| self.icon_url.clone())
    }
}

/// Lookup table over the full card catalog, keyed by card id.
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    by_id: HashMap<u32, CardDefinition>,
}

impl CardCatalog {
    /// Build a catalog from a list of definitions. Later duplicates of an
    /// id replace earlier ones.
    pub fn new(cards: Vec<CardDefinition>) -> Self {
        Self {
            by_id: cards.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Look up a card by id.
    pub fn get(&self, id: u32) -> Option<&CardDefinition> {
        self.by_id.get(&id)
    }

    /// Rarity for a card id, if the catalog knows it.
    pub fn rarity(&self, id: u32) -> Option<Rarity> {
        self.by_id.get(&id).map(|c| c.rarity)
    }

    /// Number of cards in the catalog.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterate over all definitions (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &CardDefinition> {
        self.by_id.values()
    }
}
