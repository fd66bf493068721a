//! Deck and archetype models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cards in a deck.
pub const DECK_SIZE: usize = 8;

/// Number of leading deck slots eligible for the evolution mechanic.
pub const EVOLUTION_SLOTS: usize = 2;

/// A deck recovered from one sampled top player.
///
/// Card order reflects the original slot positions 0-7, which matters for
/// evolution eligibility. Transient; consumed by aggregation immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampledDeck {
    /// The 8 card ids in slot order
    pub cards: [u32; DECK_SIZE],

    /// Originating player's rating (elo, falling back to trophies)
    pub rating: u32,
}

/// Canonical archetype identity: the 8 card ids sorted ascending and joined.
///
/// Invariant under permutation of the input deck, so two decks with the same
/// card set always collide regardless of slot order.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchetypeKey(String);

impl ArchetypeKey {
    pub fn from_cards(cards: &[u32; DECK_SIZE]) -> Self {
        let mut sorted = *cards;
        sorted.sort_unstable();
        let joined = sorted
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchetypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ArchetypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArchetypeKey({})", self.0)
    }
}

/// A unique 8-card combination observed among sampled decks.
///
/// The representative card list keeps the slot order of the first deck seen,
/// which fixes which two slots count as evolution slots for scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archetype {
    /// Canonical identity
    pub key: ArchetypeKey,

    /// Representative card ids in first-seen slot order
    pub cards: [u32; DECK_SIZE],

    /// How many sampled decks collapsed into this archetype
    pub count: u32,

    /// Highest rating seen among those decks
    pub max_rating: u32,
}

impl Archetype {
    /// Create an archetype from its first observed deck.
    pub fn from_deck(deck: &SampledDeck) -> Self {
        Self {
            key: ArchetypeKey::from_cards(&deck.cards),
            cards: deck.cards,
            count: 1,
            max_rating: deck.rating,
        }
    }

    /// Fold another occurrence of the same card set into this archetype.
    pub fn record(&mut self, rating: u32) {
        self.count += 1;
        self.max_rating = self.max_rating.max(rating);
    }

    /// Whether the deck satisfies every filter (filters AND together).
    pub fn matches(&self, filters: &[DeckFilter]) -> bool {
        filters.iter().all(|f| match f.constraint {
            SlotConstraint::EvolutionSlot => self.cards[..EVOLUTION_SLOTS].contains(&f.card_id),
            SlotConstraint::Anywhere => self.cards.contains(&f.card_id),
        })
    }
}

/// Where a filtered card must appear in a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotConstraint {
    /// Slot 0 or 1 only
    EvolutionSlot,
    /// Any of the 8 slots
    Anywhere,
}

/// A single card-inclusion filter for browsing scored archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckFilter {
    pub card_id: u32,
    pub constraint: SlotConstraint,
}

/// An evolution the player is missing for an evolution-slot card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingEvolution {
    /// Card name
    pub name: String,

    /// Evolution icon (regular icon when no evolution art is known)
    pub icon: Option<String>,
}

/// An archetype annotated with how well a collection matches it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredArchetype {
    /// The underlying archetype
    #[serde(flatten)]
    pub archetype: Archetype,

    /// Composite affinity score
    pub score: f64,

    /// Average display level across the 8 slots
    pub avg_level: f64,

    /// Slots the player owns at display level 15 or above
    pub elite_count: u32,

    /// True iff every slot is owned at display level 14 or above
    pub is_best_synergy: bool,

    /// Evolution-slot cards whose evolution the player lacks
    pub missing_evolutions: Vec<MissingEvolution>,
}

impl ScoredArchetype {
    /// Whether the deck satisfies every filter.
    pub fn matches(&self, filters: &[DeckFilter]) -> bool {
        self.archetype.matches(filters)
    }
}
