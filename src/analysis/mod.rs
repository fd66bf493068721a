//! Meta analysis engine.
//!
//! Coordinates one analysis run:
//! 1. Sample top-ranked players from the leaderboard (with endpoint fallback)
//! 2. Recover each player's most recent deck in bounded batches
//! 3. Deduplicate decks into archetypes
//! 4. Score every archetype against the player's collection
//! 5. Rank the results by affinity score

pub mod aggregate;
pub mod extractor;
pub mod fallback;
pub mod sampler;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use crate::calculate::{self, ScoreWeights};
use crate::client::{ClientError, RoyaleApi};
use crate::models::{CardCatalog, PlayerProfile, ScoredArchetype, TagError};

/// Default number of top players examined per run.
pub const DEFAULT_SAMPLE_SIZE: usize = 200;

/// Default number of concurrent deck fetches per batch.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Channel half used to report deck-extraction progress (0-100).
pub type ProgressSender = watch::Sender<u8>;

/// Errors that can end an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Every leaderboard endpoint candidate errored or came back empty.
    /// Fatal to this run only; previously computed results stay valid.
    #[error("Could not sync leaderboard data from any known endpoint")]
    SyncFailed,

    /// Rejected player-tag input; raised before any network call.
    #[error(transparent)]
    InvalidTag(#[from] TagError),

    /// A fetch the run cannot start without (catalog or profile).
    #[error("API error: {0}")]
    Client(#[from] ClientError),

    /// A newer run started while this one was in flight; its results must
    /// not be committed.
    #[error("Analysis superseded by a newer run")]
    Superseded,
}

/// Outcome of a completed analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Scored archetypes, best affinity first
    pub archetypes: Vec<ScoredArchetype>,

    /// How many top players were sampled
    pub sampled_players: usize,

    /// How many decks were actually recovered
    pub decks_recovered: usize,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

/// The meta analysis engine.
///
/// Holds the session-wide card catalog plus tuning knobs, and issues
/// generation tokens so a superseded run can never overwrite a newer one.
pub struct MetaAnalyzer {
    api: Arc<dyn RoyaleApi>,
    catalog: CardCatalog,
    weights: ScoreWeights,
    sample_size: usize,
    batch_size: usize,
    generation: AtomicU64,
}

impl MetaAnalyzer {
    /// Create an analyzer with default sample size, batch size, and weights.
    pub fn new(api: Arc<dyn RoyaleApi>, catalog: CardCatalog) -> Self {
        Self {
            api,
            catalog,
            weights: ScoreWeights::default(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            generation: AtomicU64::new(0),
        }
    }

    /// Builder method to override the score weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Builder method to override the sample size.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Builder method to override the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// The session catalog this analyzer scores against.
    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    /// Start a new run: bumps the generation and returns this run's token.
    /// Any run holding an older token becomes stale.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a run's token is still the newest one.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Execute one analysis run against `profile`.
    ///
    /// Progress (0-100) is published through `progress` as deck extraction
    /// advances. If a newer run began in the meantime, the result is
    /// discarded and [`AnalysisError::Superseded`] is returned instead.
    pub async fn run(
        &self,
        generation: u64,
        profile: &PlayerProfile,
        progress: Option<&ProgressSender>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let started_at = Utc::now();
        let start = std::time::Instant::now();
        info!(
            "Starting meta analysis for {} (sample {}, batches of {})",
            profile.tag, self.sample_size, self.batch_size
        );

        let players = sampler::sample_top_players(self.api.as_ref(), self.sample_size).await?;
        let sampled_players = players.len();

        let decks =
            extractor::collect_decks(self.api.as_ref(), &players, self.batch_size, progress).await;
        let decks_recovered = decks.len();

        let archetypes = aggregate::aggregate(decks);
        let scored: Vec<ScoredArchetype> = archetypes
            .values()
            .map(|archetype| {
                calculate::score_archetype(archetype, profile, &self.catalog, &self.weights)
            })
            .collect();
        let ranked = calculate::rank(scored);

        // In-flight batches were allowed to drain; a stale run must still
        // not commit anything.
        if !self.is_current(generation) {
            info!("Discarding stale analysis run (generation {})", generation);
            return Err(AnalysisError::Superseded);
        }

        if let Some(sender) = progress {
            sender.send_replace(100);
        }

        let duration = start.elapsed();
        info!(
            "Analysis completed: {} archetypes from {} decks ({} players) in {:?}",
            ranked.len(),
            decks_recovered,
            sampled_players,
            duration
        );

        Ok(AnalysisReport {
            archetypes: ranked,
            sampled_players,
            decks_recovered,
            started_at,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockApi, RankingsBehavior};
    use crate::client::wire::RankingEntry;
    use crate::models::{CardDefinition, OwnedCard, PlayerTag, Rarity};

    fn definition(id: u32) -> CardDefinition {
        CardDefinition {
            id,
            name: format!("Card {id}"),
            rarity: Rarity::Common,
            elixir_cost: 3,
            max_level: 14,
            icon_url: None,
            evolution_icon_url: None,
        }
    }

    fn ranking(tag: &str, elo: u32) -> RankingEntry {
        serde_json::from_str(&format!(r#"{{"tag": "{tag}", "eloRating": {elo}}}"#)).unwrap()
    }

    fn profile() -> PlayerProfile {
        PlayerProfile {
            tag: PlayerTag::parse("#ME1").unwrap(),
            name: "Me".to_string(),
            trophies: 6000,
            exp_level: 40,
            cards: (1..=8)
                .map(|id| OwnedCard {
                    id,
                    name: format!("Card {id}"),
                    level: 14,
                    rarity: Some(Rarity::Common),
                    evolution_level: None,
                })
                .collect(),
            current_deck: Vec::new(),
        }
    }

    fn scripted_api() -> MockApi {
        let mut api = MockApi::new();
        api.catalog = (1..=16).map(definition).collect();
        api.rankings.insert(
            "/locations/global/pathoflegend/players?limit=10".to_string(),
            RankingsBehavior::Items(vec![
                ranking("#AAA", 2000),
                ranking("#BBB", 1950),
                ranking("#CCC", 1900),
            ]),
        );
        // #AAA and #BBB play the same card set in different slot orders;
        // #CCC plays something else.
        api.current_decks
            .insert("#AAA".to_string(), [1, 2, 3, 4, 5, 6, 7, 8]);
        api.current_decks
            .insert("#BBB".to_string(), [8, 7, 6, 5, 4, 3, 2, 1]);
        api.current_decks
            .insert("#CCC".to_string(), [9, 10, 11, 12, 13, 14, 15, 16]);
        api
    }

    fn analyzer(api: MockApi) -> MetaAnalyzer {
        let catalog = CardCatalog::new(api.catalog.clone());
        MetaAnalyzer::new(Arc::new(api), catalog)
            .with_sample_size(10)
            .with_batch_size(2)
    }

    #[tokio::test]
    async fn test_full_run_ranks_owned_deck_first() {
        let analyzer = analyzer(scripted_api());
        let generation = analyzer.begin();

        let report = analyzer.run(generation, &profile(), None).await.unwrap();

        assert_eq!(report.sampled_players, 3);
        assert_eq!(report.decks_recovered, 3);
        // Two archetypes: the permuted pair collapsed into one.
        assert_eq!(report.archetypes.len(), 2);

        let best = &report.archetypes[0];
        assert_eq!(best.archetype.count, 2);
        assert_eq!(best.archetype.max_rating, 2000);
        // Fully owned at display 14 → synergy, no elites.
        assert!(best.is_best_synergy);
        assert_eq!(best.elite_count, 0);
        assert_eq!(best.avg_level, 14.0);

        let worst = &report.archetypes[1];
        assert!(!worst.is_best_synergy);
        assert_eq!(worst.avg_level, 1.0);
        assert!(best.score > worst.score);
    }

    #[tokio::test]
    async fn test_superseded_run_is_discarded() {
        let analyzer = analyzer(scripted_api());
        let stale = analyzer.begin();
        let _newer = analyzer.begin();

        let result = analyzer.run(stale, &profile(), None).await;
        assert!(matches!(result, Err(AnalysisError::Superseded)));
    }

    #[tokio::test]
    async fn test_sync_failure_propagates() {
        let mut api = MockApi::new();
        api.catalog = (1..=8).map(definition).collect();
        let analyzer = analyzer(api);

        let generation = analyzer.begin();
        let result = analyzer.run(generation, &profile(), None).await;
        assert!(matches!(result, Err(AnalysisError::SyncFailed)));
    }

    #[tokio::test]
    async fn test_progress_reaches_100() {
        let analyzer = analyzer(scripted_api());
        let generation = analyzer.begin();
        let (tx, rx) = watch::channel(0u8);

        analyzer
            .run(generation, &profile(), Some(&tx))
            .await
            .unwrap();

        assert_eq!(*rx.borrow(), 100);
    }
}
