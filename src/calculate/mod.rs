//! Affinity calculation engine.
//!
//! Pure functions over the card catalog and a player profile:
//! - Display-level normalization across rarities
//! - Per-archetype affinity scoring
//! - Ranking of scored archetypes

use serde::{Deserialize, Serialize};

use crate::models::{
    Archetype, CardCatalog, MissingEvolution, OwnedCard, PlayerProfile, Rarity, ScoredArchetype,
    DECK_SIZE, EVOLUTION_SLOTS,
};

/// Display level at which a card counts as elite (effectively maxed).
pub const ELITE_LEVEL: u32 = 15;

/// Minimum display level every slot must reach for the best-synergy flag.
pub const SYNERGY_LEVEL: u32 = 14;

/// Display level contributed by a card the player does not own.
pub const UNOWNED_LEVEL: u32 = 1;

/// Weights of the affinity score components.
///
/// The defaults are the source game's heuristics: elite ownership dominates
/// (100 per card, max 800), average level is a fine-grained tiebreak, each
/// missing evolution is a meaningful penalty, and popularity among sampled
/// top players is a minor tiebreak only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Points per elite card
    #[serde(default = "default_elite")]
    pub elite: f64,

    /// Penalty per missing evolution
    #[serde(default = "default_missing_evolution")]
    pub missing_evolution: f64,

    /// Points per sampled occurrence of the archetype
    #[serde(default = "default_popularity")]
    pub popularity: f64,
}

fn default_elite() -> f64 {
    100.0
}

fn default_missing_evolution() -> f64 {
    10.0
}

fn default_popularity() -> f64 {
    0.1
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            elite: default_elite(),
            missing_evolution: default_missing_evolution(),
            popularity: default_popularity(),
        }
    }
}

impl ScoreWeights {
    /// Rough score ceiling (all 8 slots elite, perfect average level),
    /// usable by consumers to render the score as a percentage.
    pub fn theoretical_max(&self) -> f64 {
        self.elite * DECK_SIZE as f64 + ELITE_LEVEL as f64
    }
}

/// Unified display level for an owned card.
///
/// `raw level + rarity base - 1`, where the rarity comes from the catalog
/// when the card is known there, from the owned card itself otherwise, and
/// defaults to common when neither has one. A raw level of 0 yields
/// `base - 1`, preserving the source behavior for never-seen cards.
pub fn display_level(owned: &OwnedCard, catalog: &CardCatalog) -> u32 {
    let rarity = catalog
        .rarity(owned.id)
        .or(owned.rarity)
        .unwrap_or(Rarity::Common);
    owned.level + rarity.base_level() - 1
}

/// Score one archetype against a player's collection.
///
/// Walks the archetype's 8 slots in stored representative order. Owned slots
/// contribute their display level; unowned slots contribute
/// [`UNOWNED_LEVEL`] and clear the synergy flag. Only slots 0 and 1 are
/// checked for missing evolutions, and only when the catalog says the card
/// has one.
pub fn score_archetype(
    archetype: &Archetype,
    profile: &PlayerProfile,
    catalog: &CardCatalog,
    weights: &ScoreWeights,
) -> ScoredArchetype {
    let mut total_level = 0u32;
    let mut elite_count = 0u32;
    let mut all_at_least_synergy = true;
    let mut missing_evolutions = Vec::new();

    for (slot, &card_id) in archetype.cards.iter().enumerate() {
        let owned = profile.card(card_id);

        match owned {
            Some(card) => {
                let level = display_level(card, catalog);
                total_level += level;
                if level >= ELITE_LEVEL {
                    elite_count += 1;
                }
                if level < SYNERGY_LEVEL {
                    all_at_least_synergy = false;
                }
            }
            None => {
                total_level += UNOWNED_LEVEL;
                all_at_least_synergy = false;
            }
        }

        if slot < EVOLUTION_SLOTS {
            if let Some(def) = catalog.get(card_id) {
                let unlocked = owned.is_some_and(|c| c.evolution_unlocked());
                if def.has_evolution() && !unlocked {
                    missing_evolutions.push(MissingEvolution {
                        name: def.name.clone(),
                        icon: def.evolution_display_icon(),
                    });
                }
            }
        }
    }

    let avg_level = total_level as f64 / DECK_SIZE as f64;
    let score = elite_count as f64 * weights.elite + avg_level
        - missing_evolutions.len() as f64 * weights.missing_evolution
        + archetype.count as f64 * weights.popularity;

    ScoredArchetype {
        archetype: archetype.clone(),
        score,
        avg_level,
        elite_count,
        is_best_synergy: all_at_least_synergy,
        missing_evolutions,
    }
}

/// Sort scored archetypes descending by score.
pub fn rank(mut scored: Vec<ScoredArchetype>) -> Vec<ScoredArchetype> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}
