//! Ranking sampler.
//!
//! Collects a bounded sample of top-ranked players, trying several known
//! leaderboard endpoint shapes in priority order until one yields data.

use tracing::{debug, info};

use crate::client::wire::RankingEntry;
use crate::client::RoyaleApi;

use super::fallback::first_success;
use super::AnalysisError;

/// The legacy rankings endpoints cap their page size at 100.
const LEGACY_PAGE_LIMIT: usize = 100;

/// Candidate leaderboard paths in priority order.
///
/// The season-scoped variant is only included when a season id is known; a
/// failed season lookup just narrows the chain, it never fails the run.
pub fn candidate_paths(season_id: Option<&str>, sample_size: usize) -> Vec<String> {
    let legacy_limit = sample_size.min(LEGACY_PAGE_LIMIT);

    let mut paths = vec![format!(
        "/locations/global/pathoflegend/players?limit={sample_size}"
    )];
    if let Some(season) = season_id {
        paths.push(format!(
            "/locations/global/pathoflegend/seasons/{season}/rankings/players?limit={sample_size}"
        ));
    }
    paths.push(format!(
        "/locations/global/rankings/pathoflegend?limit={legacy_limit}"
    ));
    paths.push(format!(
        "/locations/global/rankings/players?limit={legacy_limit}"
    ));
    paths
}

/// Sample at most `sample_size` top players, preserving upstream rank order.
///
/// Fails with [`AnalysisError::SyncFailed`] only when every candidate
/// endpoint errors or comes back empty.
pub async fn sample_top_players(
    api: &dyn RoyaleApi,
    sample_size: usize,
) -> Result<Vec<RankingEntry>, AnalysisError> {
    let season_id = match api.fetch_seasons().await {
        Ok(seasons) => seasons.last().cloned(),
        Err(e) => {
            debug!("Season lookup failed, proceeding without it: {}", e);
            None
        }
    };

    let paths = candidate_paths(season_id.as_deref(), sample_size);

    let mut items = first_success(
        paths,
        |path: String| async move { api.fetch_rankings_page(&path).await },
        |items: &Vec<RankingEntry>| !items.is_empty(),
    )
    .await
    .ok_or(AnalysisError::SyncFailed)?;

    items.truncate(sample_size);
    info!("Sampled {} top players", items.len());
    Ok(items)
}
