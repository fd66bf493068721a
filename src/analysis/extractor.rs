//! Deck extractor.
//!
//! Recovers the most recently played deck for each sampled player,
//! preferring battle-log data over the currently equipped deck. Fetches run
//! in fixed-size batches so peak outbound concurrency stays bounded.

use futures::future::join_all;
use tracing::{debug, info};

use crate::client::wire::{BattleLogEntry, RankingEntry};
use crate::client::RoyaleApi;
use crate::models::{PlayerTag, SampledDeck, DECK_SIZE};

use super::ProgressSender;

/// Battle-log match types that count as a real ladder game.
const RANKED_MATCH_TYPES: [&str; 2] = ["pathOfLegend", "PvP"];

/// Pick the deck from the most recent ranked or versus match in a battle
/// log: the 8 cards of the first team entry of that match.
pub fn deck_from_battle_log(log: &[BattleLogEntry]) -> Option<[u32; DECK_SIZE]> {
    log.iter()
        .find(|entry| RANKED_MATCH_TYPES.contains(&entry.match_type.as_str()))
        .and_then(|entry| entry.team.first())
        .and_then(|team| team.deck())
}

/// Recover one player's deck, or `None` when neither source yields one.
///
/// Any fetch failure degrades to "no data point"; a player that cannot be
/// resolved is simply excluded from aggregation.
async fn extract_deck(api: &dyn RoyaleApi, entry: &RankingEntry) -> Option<SampledDeck> {
    let tag = PlayerTag::parse(&entry.tag).ok()?;

    let from_log = match api.fetch_battle_log(&tag).await {
        Ok(log) => deck_from_battle_log(&log),
        Err(e) => {
            debug!("Battle log fetch failed for {}: {}", tag, e);
            None
        }
    };

    let cards = match from_log {
        Some(cards) => Some(cards),
        None => api.fetch_current_deck(&tag).await.ok().flatten(),
    };

    cards.map(|cards| SampledDeck {
        cards,
        rating: entry.rating(),
    })
}

/// Collect decks for all sampled players in sequential batches of
/// `batch_size` concurrent fetches, reporting progress (0-100) after each
/// batch settles.
pub async fn collect_decks(
    api: &dyn RoyaleApi,
    players: &[RankingEntry],
    batch_size: usize,
    progress: Option<&ProgressSender>,
) -> Vec<SampledDeck> {
    let total = players.len();
    let mut decks = Vec::new();
    let mut processed = 0usize;

    for batch in players.chunks(batch_size.max(1)) {
        let results = join_all(batch.iter().map(|entry| extract_deck(api, entry))).await;
        decks.extend(results.into_iter().flatten());

        processed += batch.len();
        let pct = (processed as f64 / total as f64 * 100.0).round() as u8;
        if let Some(sender) = progress {
            sender.send_replace(pct);
        }
        debug!("Deck extraction {}% ({}/{})", pct, processed, total);
    }

    info!("Recovered {} decks from {} players", decks.len(), total);
    decks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockApi;
    use tokio::sync::watch;

    fn log_entry(match_type: &str, cards: &[u32]) -> BattleLogEntry {
        let cards_json: Vec<String> = cards.iter().map(|id| format!(r#"{{"id": {id}}}"#)).collect();
        serde_json::from_str(&format!(
            r#"{{"type": "{match_type}", "team": [{{"cards": [{}]}}]}}"#,
            cards_json.join(",")
        ))
        .unwrap()
    }

    fn ranking(tag: &str) -> RankingEntry {
        serde_json::from_str(&format!(r#"{{"tag": "{tag}", "eloRating": 1900}}"#)).unwrap()
    }

    #[test]
    fn test_deck_from_battle_log_skips_other_modes() {
        let log = vec![
            log_entry("boatBattle", &[9, 9, 9, 9, 9, 9, 9, 9]),
            log_entry("PvP", &[1, 2, 3, 4, 5, 6, 7, 8]),
            log_entry("pathOfLegend", &[8, 7, 6, 5, 4, 3, 2, 1]),
        ];

        assert_eq!(deck_from_battle_log(&log), Some([1, 2, 3, 4, 5, 6, 7, 8]));
    }

    #[test]
    fn test_deck_from_battle_log_rejects_partial_decks() {
        let log = vec![log_entry("PvP", &[1, 2, 3])];
        assert_eq!(deck_from_battle_log(&log), None);
    }

    #[test]
    fn test_deck_from_battle_log_empty() {
        assert_eq!(deck_from_battle_log(&[]), None);
    }

    #[tokio::test]
    async fn test_battle_log_preferred_over_current_deck() {
        let mut api = MockApi::new();
        api.battle_logs.insert(
            "#AAA".to_string(),
            vec![log_entry("pathOfLegend", &[1, 2, 3, 4, 5, 6, 7, 8])],
        );
        api.current_decks
            .insert("#AAA".to_string(), [9, 9, 9, 9, 9, 9, 9, 8]);

        let decks = collect_decks(&api, &[ranking("#AAA")], 8, None).await;
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].cards, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(decks[0].rating, 1900);
    }

    #[tokio::test]
    async fn test_current_deck_fallback() {
        let mut api = MockApi::new();
        // No battle log at all; the log fetch fails and the current deck wins.
        api.current_decks
            .insert("#BBB".to_string(), [1, 2, 3, 4, 5, 6, 7, 8]);

        let decks = collect_decks(&api, &[ranking("#BBB")], 8, None).await;
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].cards, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[tokio::test]
    async fn test_unresolvable_player_is_skipped() {
        let api = MockApi::new();
        let decks = collect_decks(&api, &[ranking("#CCC")], 8, None).await;
        assert!(decks.is_empty());
    }

    #[tokio::test]
    async fn test_progress_is_monotone_and_reaches_100() {
        let mut api = MockApi::new();
        let players: Vec<RankingEntry> = (0..20).map(|i| ranking(&format!("#P{i}"))).collect();
        for player in &players {
            api.current_decks
                .insert(player.tag.clone(), [1, 2, 3, 4, 5, 6, 7, 8]);
        }

        let (tx, rx) = watch::channel(0u8);
        let decks = collect_decks(&api, &players, 8, Some(&tx)).await;

        assert_eq!(decks.len(), 20);
        assert_eq!(*rx.borrow(), 100);
    }

    #[tokio::test]
    async fn test_batching_processes_everyone() {
        let mut api = MockApi::new();
        let players: Vec<RankingEntry> = (0..17).map(|i| ranking(&format!("#Q{i}"))).collect();
        for (i, player) in players.iter().enumerate() {
            // Half via battle log, half via current deck.
            if i % 2 == 0 {
                api.battle_logs.insert(
                    player.tag.clone(),
                    vec![log_entry("PvP", &[1, 2, 3, 4, 5, 6, 7, 8])],
                );
            } else {
                api.current_decks
                    .insert(player.tag.clone(), [8, 7, 6, 5, 4, 3, 2, 1]);
            }
        }

        let decks = collect_decks(&api, &players, 4, None).await;
        assert_eq!(decks.len(), 17);
    }
}
