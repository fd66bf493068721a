//! Shared server state.
//!
//! Session-wide caches live here with an explicit lifecycle: the card
//! catalog is loaded once per session, the cached profile is replaced
//! wholesale on each successful search, and analysis results survive until
//! a newer run completes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tracing::info;

use crate::analysis::{AnalysisReport, MetaAnalyzer};
use crate::client::{ClientError, RoyaleApi};
use crate::config::AnalysisConfig;
use crate::models::{CardCatalog, PlayerProfile};

/// How many recent player tags to remember (in-memory only).
const HISTORY_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// State of the current (or most recent) analysis run.
///
/// A failed rerun keeps the previous report so the UI can retry without
/// losing what it already has.
#[derive(Default)]
pub struct AnalysisSlot {
    pub status: AnalysisStatus,
    pub generation: u64,
    pub progress: Option<watch::Receiver<u8>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub report: Option<AnalysisReport>,
}

impl AnalysisSlot {
    /// Current progress percentage (0-100).
    pub fn progress_pct(&self) -> u8 {
        match self.status {
            AnalysisStatus::Completed => 100,
            _ => self.progress.as_ref().map(|rx| *rx.borrow()).unwrap_or(0),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn RoyaleApi>,
    pub analysis_config: AnalysisConfig,
    pub analyzer: Arc<RwLock<Option<Arc<MetaAnalyzer>>>>,
    pub profile: Arc<RwLock<Option<PlayerProfile>>>,
    pub analysis: Arc<RwLock<AnalysisSlot>>,
    pub history: Arc<RwLock<Vec<String>>>,
}

impl AppState {
    pub fn new(api: Arc<dyn RoyaleApi>, analysis_config: AnalysisConfig) -> Self {
        Self {
            api,
            analysis_config,
            analyzer: Arc::new(RwLock::new(None)),
            profile: Arc::new(RwLock::new(None)),
            analysis: Arc::new(RwLock::new(AnalysisSlot::default())),
            history: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The session analyzer, loading the card catalog on first use.
    pub async fn analyzer(&self) -> Result<Arc<MetaAnalyzer>, ClientError> {
        if let Some(analyzer) = self.analyzer.read().await.as_ref() {
            return Ok(Arc::clone(analyzer));
        }

        let mut slot = self.analyzer.write().await;
        // Another task may have won the race while we waited for the lock.
        if let Some(analyzer) = slot.as_ref() {
            return Ok(Arc::clone(analyzer));
        }

        let cards = self.api.fetch_card_catalog().await?;
        info!("Loaded card catalog ({} cards)", cards.len());
        let catalog = CardCatalog::new(cards);

        let analyzer = Arc::new(
            MetaAnalyzer::new(Arc::clone(&self.api), catalog)
                .with_sample_size(self.analysis_config.sample_size)
                .with_batch_size(self.analysis_config.batch_size)
                .with_weights(self.analysis_config.weights),
        );
        *slot = Some(Arc::clone(&analyzer));
        Ok(analyzer)
    }

    /// Remember a searched tag, most recent first, deduplicated.
    pub async fn remember_tag(&self, tag: &str) {
        let mut history = self.history.write().await;
        history.retain(|t| t != tag);
        history.insert(0, tag.to_string());
        history.truncate(HISTORY_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockApi;

    fn state() -> AppState {
        AppState::new(Arc::new(MockApi::new()), AnalysisConfig::default())
    }

    #[tokio::test]
    async fn test_remember_tag_dedupes_and_caps() {
        let state = state();

        for tag in ["#A1", "#B2", "#C3", "#A1", "#D4", "#E5", "#F6"] {
            state.remember_tag(tag).await;
        }

        let history = state.history.read().await;
        assert_eq!(*history, vec!["#F6", "#E5", "#D4", "#A1", "#C3"]);
    }

    #[tokio::test]
    async fn test_analyzer_loads_catalog_once() {
        let state = state();

        let first = state.analyzer().await.unwrap();
        let second = state.analyzer().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_slot_progress_defaults_to_zero() {
        let slot = AnalysisSlot::default();
        assert_eq!(slot.status, AnalysisStatus::Idle);
        assert_eq!(slot.progress_pct(), 0);
    }

    #[test]
    fn test_completed_slot_reports_full_progress() {
        let slot = AnalysisSlot {
            status: AnalysisStatus::Completed,
            ..Default::default()
        };
        assert_eq!(slot.progress_pct(), 100);
    }
}
