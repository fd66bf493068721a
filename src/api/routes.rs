//! Route handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;

use crate::analysis::AnalysisError;
use crate::calculate;
use crate::models::{DeckFilter, PlayerProfile, PlayerTag, ScoredArchetype, SlotConstraint};

use super::state::{AnalysisStatus, AppState};
use super::ApiError;

/// Default number of scored archetypes returned per request.
const DEFAULT_RESULT_LIMIT: usize = 50;

// ── Player search ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProfileCardView {
    pub id: u32,
    pub name: String,
    pub level: u32,
    pub display_level: u32,
    pub evolution_unlocked: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub tag: String,
    pub name: String,
    pub trophies: u32,
    pub exp_level: u32,
    pub cards: Vec<ProfileCardView>,
}

impl ProfileResponse {
    fn build(profile: &PlayerProfile, catalog: &crate::models::CardCatalog) -> Self {
        Self {
            tag: profile.tag.as_str().to_string(),
            name: profile.name.clone(),
            trophies: profile.trophies,
            exp_level: profile.exp_level,
            cards: profile
                .cards
                .iter()
                .map(|card| ProfileCardView {
                    id: card.id,
                    name: card.name.clone(),
                    level: card.level,
                    display_level: calculate::display_level(card, catalog),
                    evolution_unlocked: card.evolution_unlocked(),
                })
                .collect(),
        }
    }
}

/// Fetch a player profile and cache it for analysis.
///
/// A failed search clears any stale cached profile before surfacing the
/// error.
pub async fn get_player(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let tag = PlayerTag::parse(&tag).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // Catalog first: display levels need rarity data.
    let analyzer = state.analyzer().await?;

    match state.api.fetch_profile(&tag).await {
        Ok(profile) => {
            state.remember_tag(profile.tag.as_str()).await;
            let response = ProfileResponse::build(&profile, analyzer.catalog());
            *state.profile.write().await = Some(profile);
            Ok(Json(response))
        }
        Err(e) => {
            *state.profile.write().await = None;
            Err(e.into())
        }
    }
}

// ── Analysis lifecycle ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StartAnalysisResponse {
    pub generation: u64,
}

/// Kick off a meta analysis run for the cached profile.
///
/// Responds immediately; progress and results are polled separately. A
/// rerun supersedes any run still in flight.
pub async fn start_analysis(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<StartAnalysisResponse>), ApiError> {
    let profile = state.profile.read().await.clone().ok_or_else(|| {
        ApiError::BadRequest("No profile loaded; search for a player first".to_string())
    })?;
    let analyzer = state.analyzer().await?;

    let generation = analyzer.begin();
    let (tx, rx) = watch::channel(0u8);

    {
        let mut slot = state.analysis.write().await;
        slot.status = AnalysisStatus::Running;
        slot.generation = generation;
        slot.progress = Some(rx);
        slot.started_at = Some(Utc::now());
        slot.completed_at = None;
        slot.error = None;
        // The previous report stays available until this run completes.
    }

    let analysis = Arc::clone(&state.analysis);
    tokio::spawn(async move {
        let result = analyzer.run(generation, &profile, Some(&tx)).await;

        let mut slot = analysis.write().await;
        if slot.generation != generation {
            return;
        }

        match result {
            Ok(report) => {
                slot.status = AnalysisStatus::Completed;
                slot.completed_at = Some(Utc::now());
                slot.report = Some(report);
            }
            Err(AnalysisError::Superseded) => {}
            Err(e) => {
                warn!("Meta analysis failed: {}", e);
                slot.status = AnalysisStatus::Failed;
                slot.completed_at = Some(Utc::now());
                slot.error = Some(e.to_string());
            }
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(StartAnalysisResponse { generation }),
    ))
}

#[derive(Debug, Serialize)]
pub struct AnalysisStatusResponse {
    pub status: AnalysisStatus,
    pub progress: u8,
    pub generation: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub archetype_count: Option<usize>,
}

pub async fn analysis_status(State(state): State<AppState>) -> Json<AnalysisStatusResponse> {
    let slot = state.analysis.read().await;
    Json(AnalysisStatusResponse {
        status: slot.status,
        progress: slot.progress_pct(),
        generation: slot.generation,
        started_at: slot.started_at,
        completed_at: slot.completed_at,
        error: slot.error.clone(),
        archetype_count: slot.report.as_ref().map(|r| r.archetypes.len()),
    })
}

// ── Results & filtering ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResultsParams {
    /// Comma-separated card ids that must appear anywhere in the deck
    pub card: Option<String>,

    /// Comma-separated card ids that must occupy an evolution slot
    pub evo: Option<String>,

    /// Maximum number of archetypes to return
    pub limit: Option<usize>,
}

fn parse_ids(raw: &str) -> Result<Vec<u32>, ApiError> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("Invalid card id: {s}")))
        })
        .collect()
}

fn parse_filters(params: &ResultsParams) -> Result<Vec<DeckFilter>, ApiError> {
    let mut filters = Vec::new();
    if let Some(raw) = &params.card {
        for card_id in parse_ids(raw)? {
            filters.push(DeckFilter {
                card_id,
                constraint: SlotConstraint::Anywhere,
            });
        }
    }
    if let Some(raw) = &params.evo {
        for card_id in parse_ids(raw)? {
            filters.push(DeckFilter {
                card_id,
                constraint: SlotConstraint::EvolutionSlot,
            });
        }
    }
    Ok(filters)
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    /// Total archetypes before filtering/truncation
    pub total: usize,

    /// Rough score ceiling, for rendering scores as percentages
    pub max_score: f64,

    pub archetypes: Vec<ScoredArchetype>,
}

/// Scored archetypes, best affinity first, optionally filtered by card
/// inclusion (filters AND together).
pub async fn analysis_results(
    State(state): State<AppState>,
    Query(params): Query<ResultsParams>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let filters = parse_filters(&params)?;
    let limit = params.limit.unwrap_or(DEFAULT_RESULT_LIMIT);

    let slot = state.analysis.read().await;
    let report = slot
        .report
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("No analysis results yet".to_string()))?;

    let archetypes: Vec<ScoredArchetype> = report
        .archetypes
        .iter()
        .filter(|a| a.matches(&filters))
        .take(limit)
        .cloned()
        .collect();

    Ok(Json(ResultsResponse {
        total: report.archetypes.len(),
        max_score: state.analysis_config.weights.theoretical_max(),
        archetypes,
    }))
}

// ── History ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub tags: Vec<String>,
}

pub async fn history(State(state): State<AppState>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        tags: state.history.read().await.clone(),
    })
}
