//! HTTP routes
//!
//! Everything the map and globe front ends consume: catalog listing,
//! per-object ground tracks, orbit paths and positions, and live sessions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use debris_catalog::{build_trajectory, geojson, loader, CatalogError, CatalogStats, ReentrySite, Trajectory};
use orbital_mechanics::{position_at, GroundTrack, LiveFrame, ObjectClass, OrbitPath, SamplingConfig, ViewFit};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::live::LiveError;
use crate::AppState;

/// Upper bound on requested revolutions per track
const MAX_REVOLUTIONS: f64 = 50.0;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize, Deserialize)]
pub struct ObjectSummary {
    pub norad_id: Option<u64>,
    pub name: String,
    pub class: ObjectClass,
    pub has_tle: bool,
    pub reentry_date: Option<String>,
    pub reentry_site: Option<ReentrySite>,
}

#[derive(Deserialize, Default)]
pub struct TrackQuery {
    pub revolutions: Option<f64>,
}

#[derive(Serialize, Deserialize)]
pub struct GroundTrackResponse {
    pub norad_id: Option<u64>,
    pub name: String,
    /// False when there is nothing to draw ("no track available")
    pub available: bool,
    pub ground_track: GroundTrack,
    pub view_fit: ViewFit,
    pub notice: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct OrbitPathResponse {
    pub norad_id: Option<u64>,
    pub name: String,
    pub available: bool,
    pub orbit_path: OrbitPath,
    pub notice: Option<String>,
}

#[derive(Deserialize)]
pub struct PositionQuery {
    pub time: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
pub struct PositionResponse {
    pub norad_id: u64,
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
}

#[derive(Deserialize, Default)]
pub struct LiveRequest {
    pub start: Option<DateTime<Utc>>,
    pub max_objects: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct LiveStarted {
    pub id: Uuid,
    pub objects: usize,
    pub tick_interval_ms: u64,
    pub sim_step_ms: i64,
    /// Session ends after this long without a frame read
    pub idle_timeout_ms: u64,
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/objects", get(list_objects))
        .route("/stats", get(catalog_stats))
        .route("/objects/:norad_id/trajectory", get(get_trajectory))
        .route("/objects/:norad_id/ground-track", get(get_ground_track))
        .route("/objects/:norad_id/orbit-path", get(get_orbit_path))
        .route("/objects/:norad_id/geojson", get(get_geojson))
        .route("/objects/:norad_id/position", get(get_position))
        .route("/live", post(start_live))
        .route("/live/:id", get(get_live_frame).delete(stop_live));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn catalog_error(e: CatalogError) -> (StatusCode, String) {
    let status = match &e {
        CatalogError::UnknownObject(_) => StatusCode::NOT_FOUND,
        CatalogError::MissingElementSet { .. } | CatalogError::Orbital(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogError::Io(_) | CatalogError::Json(_) | CatalogError::UnrecognizedLayout => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

fn live_error(e: LiveError) -> (StatusCode, String) {
    let status = match &e {
        LiveError::TooManySessions(_) => StatusCode::TOO_MANY_REQUESTS,
        LiveError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

fn sampling_for(base: &SamplingConfig, query: &TrackQuery) -> Result<SamplingConfig, (StatusCode, String)> {
    match query.revolutions {
        None => Ok(*base),
        Some(r) if r.is_finite() && r > 0.0 && r <= MAX_REVOLUTIONS => Ok(SamplingConfig {
            revolutions: r,
            ..*base
        }),
        Some(r) => Err((
            StatusCode::BAD_REQUEST,
            format!("revolutions must be in (0, {}], got {}", MAX_REVOLUTIONS, r),
        )),
    }
}

fn trajectory_for(state: &AppState, norad_id: u64, query: &TrackQuery) -> Result<Trajectory, (StatusCode, String)> {
    let sampling = sampling_for(&state.sampling, query)?;
    let record = loader::find_by_norad(&state.catalog, norad_id).map_err(catalog_error)?;
    build_trajectory(record, &sampling).map_err(catalog_error)
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "debris-gateway",
        "objects": state.catalog.len(),
        "live_sessions": state.live.len().await,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /objects - Catalog listing
async fn list_objects(State(state): State<AppState>) -> Json<Vec<ObjectSummary>> {
    let objects = state
        .catalog
        .iter()
        .map(|r| ObjectSummary {
            norad_id: r.norad_id,
            name: r.name.clone().unwrap_or_else(|| "Unknown".to_string()),
            class: r.object_class(),
            has_tle: r.has_element_set(),
            reentry_date: r.reentry_date.clone(),
            reentry_site: r.reentry_site,
        })
        .collect();
    Json(objects)
}

/// GET /stats - Catalog summary counts
async fn catalog_stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(CatalogStats::from_records(state.catalog.iter()))
}

/// GET /objects/:norad_id/trajectory - Ground track, orbit path and view fit
async fn get_trajectory(
    State(state): State<AppState>,
    Path(norad_id): Path<u64>,
    Query(query): Query<TrackQuery>,
) -> ApiResult<Trajectory> {
    trajectory_for(&state, norad_id, &query).map(Json)
}

/// GET /objects/:norad_id/ground-track - Segmented 2D track
async fn get_ground_track(
    State(state): State<AppState>,
    Path(norad_id): Path<u64>,
    Query(query): Query<TrackQuery>,
) -> ApiResult<GroundTrackResponse> {
    let trajectory = trajectory_for(&state, norad_id, &query)?;
    Ok(Json(GroundTrackResponse {
        norad_id: trajectory.norad_id,
        name: trajectory.name,
        available: !trajectory.ground_track.is_empty(),
        view_fit: trajectory.view_fit,
        notice: trajectory.tle_age.map(|age| age.notice()),
        ground_track: trajectory.ground_track,
    }))
}

/// GET /objects/:norad_id/orbit-path - 3D polyline in scene coordinates
async fn get_orbit_path(
    State(state): State<AppState>,
    Path(norad_id): Path<u64>,
    Query(query): Query<TrackQuery>,
) -> ApiResult<OrbitPathResponse> {
    let trajectory = trajectory_for(&state, norad_id, &query)?;
    Ok(Json(OrbitPathResponse {
        norad_id: trajectory.norad_id,
        name: trajectory.name,
        available: trajectory.orbit_path.is_drawable(),
        notice: trajectory.tle_age.map(|age| age.notice()),
        orbit_path: trajectory.orbit_path,
    }))
}

/// GET /objects/:norad_id/geojson - Track and reentry site as GeoJSON
async fn get_geojson(
    State(state): State<AppState>,
    Path(norad_id): Path<u64>,
    Query(query): Query<TrackQuery>,
) -> ApiResult<serde_json::Value> {
    let trajectory = trajectory_for(&state, norad_id, &query)?;
    Ok(Json(geojson::to_geojson(&trajectory)))
}

/// GET /objects/:norad_id/position?time= - Geodetic position at one instant
async fn get_position(
    State(state): State<AppState>,
    Path(norad_id): Path<u64>,
    Query(query): Query<PositionQuery>,
) -> ApiResult<PositionResponse> {
    let record = loader::find_by_norad(&state.catalog, norad_id).map_err(catalog_error)?;
    let satellite = record.satellite_record().map_err(catalog_error)?;
    let time = query.time.unwrap_or_else(Utc::now);

    let point = position_at(&satellite, time)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, format!("No position at {}: {}", time, e)))?;

    Ok(Json(PositionResponse {
        norad_id,
        time,
        latitude: point.latitude,
        longitude: point.longitude,
        altitude_km: point.altitude_km,
    }))
}

/// POST /live - Start a live animation over the catalog
async fn start_live(
    State(state): State<AppState>,
    request: Option<Json<LiveRequest>>,
) -> Result<(StatusCode, Json<LiveStarted>), (StatusCode, String)> {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let mut config = state.live_config;
    if let Some(max) = request.max_objects {
        config.max_objects = max.min(state.live_config.max_objects);
    }
    let start = request.start.unwrap_or_else(Utc::now);

    let session = debris_catalog::live::start_session(state.catalog.iter(), start, config);
    let (id, objects) = state
        .live
        .start(session, config.tick_interval())
        .await
        .map_err(live_error)?;

    Ok((
        StatusCode::CREATED,
        Json(LiveStarted {
            id,
            objects,
            tick_interval_ms: config.tick_interval_ms,
            sim_step_ms: config.sim_step_ms,
            idle_timeout_ms: state.live.limits().idle_timeout.as_millis() as u64,
        }),
    ))
}

/// GET /live/:id - Latest frame of a running session
async fn get_live_frame(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<LiveFrame> {
    state
        .live
        .latest(&id)
        .await
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("No live session {}", id)))
}

/// DELETE /live/:id - Stop a session
async fn stop_live(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.live.stop(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
