//! Statistics and insight handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use warroom_core::{aggregate, insights, RankedLocation, TripAggregates, TripDataset};

use crate::{AppError, AppState, MAX_HOTSPOT_LIMIT};

/// Load the configured dataset and compute its aggregates
pub(crate) async fn load_aggregates(
    state: &AppState,
) -> Result<(Arc<TripDataset>, TripAggregates), AppError> {
    let dataset = state.cache.load(&state.config.source).await?;
    let agg = aggregate(&dataset);
    Ok((dataset, agg))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub source: String,
    pub total_trips: Option<usize>,
    pub skipped_rows: Option<usize>,
    pub textgen: String,
    pub textgen_host: String,
    pub textgen_reachable: bool,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, total_trips, skipped_rows) = match state.cache.load(&state.config.source).await {
        Ok(dataset) => ("ok", Some(dataset.len()), Some(dataset.skipped)),
        Err(_) => ("degraded", None, None),
    };

    Json(HealthResponse {
        status,
        source: state.config.source.clone(),
        total_trips,
        skipped_rows,
        textgen: state.responder.backend_label(),
        textgen_host: state.responder.backend_host().to_string(),
        textgen_reachable: state.responder.backend_healthy().await,
    })
}

#[derive(Debug, Serialize)]
pub struct GroupSizeEntry {
    pub label: &'static str,
    pub trips: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub source: String,
    pub total_trips: u64,
    pub total_passengers: u64,
    pub avg_group_size: f64,
    pub peak_hour: Option<u8>,
    pub peak_hour_trips: u64,
    pub hourly: Vec<u64>,
    pub group_sizes: Vec<GroupSizeEntry>,
    pub most_common_group_size: Option<u32>,
    pub skipped_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// GET /api/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, AppError> {
    let (dataset, agg) = load_aggregates(&state).await?;

    let group_sizes = warroom_core::GroupSizeBucket::all()
        .iter()
        .map(|bucket| GroupSizeEntry {
            label: bucket.label(),
            trips: agg.group_sizes[bucket.index()],
        })
        .collect();

    Ok(Json(StatsResponse {
        source: dataset.source.clone(),
        total_trips: agg.total_trips,
        total_passengers: agg.total_passengers,
        avg_group_size: agg.avg_group_size,
        peak_hour: agg.peak_hour,
        peak_hour_trips: agg.peak_hour_count(),
        hourly: agg.hourly.to_vec(),
        group_sizes,
        most_common_group_size: agg.most_common_group_size,
        skipped_rows: dataset.skipped,
        notice: (dataset.source == warroom_core::dataset::SAMPLE_SOURCE).then(|| {
            "Serving the embedded sample dataset; set WARROOM_DATA_URL for live data".to_string()
        }),
    }))
}

#[derive(Debug, Deserialize)]
pub struct HotspotParams {
    /// Ranking length, default 5
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HotspotsResponse {
    pub pickups: Vec<RankedLocation>,
    pub dropoffs: Vec<RankedLocation>,
    pub zones: Vec<RankedLocation>,
    pub dropoff_zones: Vec<RankedLocation>,
}

/// GET /api/hotspots?limit=N
pub async fn get_hotspots(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HotspotParams>,
) -> Result<Json<HotspotsResponse>, AppError> {
    let limit = params.limit.unwrap_or(5);
    if limit == 0 || limit > MAX_HOTSPOT_LIMIT {
        return Err(AppError::bad_request(&format!(
            "limit must be between 1 and {}",
            MAX_HOTSPOT_LIMIT
        )));
    }

    let (_, agg) = load_aggregates(&state).await?;

    Ok(Json(HotspotsResponse {
        pickups: agg.top_pickups(limit).into_iter().map(Into::into).collect(),
        dropoffs: agg
            .top_dropoffs(limit)
            .into_iter()
            .map(Into::into)
            .collect(),
        zones: agg.top_zones(limit).into_iter().map(Into::into).collect(),
        dropoff_zones: agg
            .top_dropoff_zones(limit)
            .into_iter()
            .map(Into::into)
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
    pub briefing: String,
}

/// GET /api/insights
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InsightsResponse>, AppError> {
    let (_, agg) = load_aggregates(&state).await?;
    Ok(Json(InsightsResponse {
        insights: insights::summarize(&agg),
        briefing: insights::briefing(&agg),
    }))
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub source: String,
    pub total_trips: usize,
    pub skipped_rows: usize,
}

/// POST /api/reload
///
/// Fetches a fresh copy from the source. A failed fetch keeps the
/// cached dataset in place.
pub async fn reload_dataset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, AppError> {
    let dataset = state.cache.refresh(&state.config.source).await?;
    info!(source = %dataset.source, trips = dataset.len(), "Dataset reloaded");

    Ok(Json(ReloadResponse {
        source: dataset.source.clone(),
        total_trips: dataset.len(),
        skipped_rows: dataset.skipped,
    }))
}
