//! Archetype aggregator.
//!
//! Deduplicates sampled decks into archetypes by canonical card-set
//! identity, counting occurrences and tracking the best rating seen.

use std::collections::HashMap;

use crate::models::{Archetype, ArchetypeKey, SampledDeck};

/// Collapse sampled decks into archetypes.
///
/// Decks with the same card multiset collide regardless of slot order; the
/// first-seen deck's slot order becomes the archetype's representative
/// ordering, which fixes its evolution slots.
pub fn aggregate(decks: impl IntoIterator<Item = SampledDeck>) -> HashMap<ArchetypeKey, Archetype> {
    let mut archetypes: HashMap<ArchetypeKey, Archetype> = HashMap::new();

    for deck in decks {
        let key = ArchetypeKey::from_cards(&deck.cards);
        archetypes
            .entry(key)
            .and_modify(|archetype| archetype.record(deck.rating))
            .or_insert_with(|| Archetype::from_deck(&deck));
    }

    archetypes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn deck(cards: [u32; 8], rating: u32) -> SampledDeck {
        SampledDeck { cards, rating }
    }

    #[test]
    fn test_distinct_decks_stay_distinct() {
        let archetypes = aggregate(vec![
            deck([1, 2, 3, 4, 5, 6, 7, 8], 1800),
            deck([1, 2, 3, 4, 5, 6, 7, 9], 1900),
        ]);

        assert_eq!(archetypes.len(), 2);
    }

    #[test]
    fn test_permuted_decks_collide() {
        let archetypes = aggregate(vec![
            deck([1, 2, 3, 4, 5, 6, 7, 8], 1800),
            deck([8, 7, 6, 5, 4, 3, 2, 1], 2000),
        ]);

        assert_eq!(archetypes.len(), 1);
        let archetype = archetypes.values().next().unwrap();
        assert_eq!(archetype.count, 2);
        assert_eq!(archetype.max_rating, 2000);
        // First-seen slot order is the representative ordering.
        assert_eq!(archetype.cards, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_max_rating_never_decreases() {
        let archetypes = aggregate(vec![
            deck([1, 2, 3, 4, 5, 6, 7, 8], 2100),
            deck([1, 2, 3, 4, 5, 6, 7, 8], 1500),
        ]);

        assert_eq!(archetypes.values().next().unwrap().max_rating, 2100);
    }

    #[test]
    fn test_idempotent_counts_regardless_of_order() {
        let decks = vec![
            deck([1, 2, 3, 4, 5, 6, 7, 8], 1800),
            deck([8, 7, 6, 5, 4, 3, 2, 1], 2000),
            deck([1, 2, 3, 4, 5, 6, 7, 9], 1700),
        ];
        let mut reversed = decks.clone();
        reversed.reverse();

        let forward = aggregate(decks);
        let backward = aggregate(reversed);

        assert_eq!(forward.len(), backward.len());
        for (key, archetype) in &forward {
            let other = &backward[key];
            assert_eq!(archetype.count, other.count);
            assert_eq!(archetype.max_rating, other.max_rating);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::new()).is_empty());
    }
}
