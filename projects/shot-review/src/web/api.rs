use crate::analysis::PayloadError;
use crate::cli::ServeArgs;
use crate::overlay::geometry::{display_rect, DisplayRect};
use crate::overlay::marker::MarkerGeometry;
use crate::overlay::session::marker_at;
use crate::overlay::types::{ContainerLayout, TrackingSample};
use crate::review_store::{list_payloads, list_reviews, ReviewExists, ReviewMetadata};
use crate::shots::{ShotCard, ShotList, ShotSummary};
use crate::web::registry::{get_review, LoadedReview};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Serialize)]
pub struct PayloadInfo {
    pub name: String,
    pub path: String,
}

#[derive(Serialize)]
pub struct ReviewInfo {
    pub name: String,
    pub metadata: ReviewMetadata,
}

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub payload_path: String,
}

#[derive(Deserialize)]
pub struct ShotsQuery {
    /// Highlighted shot (0-based)
    pub active: Option<usize>,
}

#[derive(Serialize)]
pub struct ShotsResponse {
    pub active: usize,
    pub shots: Vec<ShotCard>,
    pub summary: ShotSummary,
}

#[derive(Deserialize)]
pub struct OverlayQuery {
    pub t: f64,
    pub width: f64,
    pub height: f64,
}

/// One overlay frame; `marker` is null while nothing should be drawn.
#[derive(Serialize)]
pub struct OverlayFrame {
    pub time: f64,
    pub sample: Option<TrackingSample>,
    pub display: Option<DisplayRect>,
    pub marker: Option<MarkerGeometry>,
    pub indicator_path: Option<String>,
}

impl OverlayFrame {
    pub fn compute(loaded: &LoadedReview, container: &ContainerLayout, time: f64) -> Self {
        let video = &loaded.review.payload.metadata;
        let marker = marker_at(&loaded.index, video, container, time);
        Self {
            time,
            sample: loaded.index.nearest(time).copied(),
            display: display_rect(video, container),
            indicator_path: marker.as_ref().map(|m| m.indicator_path()),
            marker,
        }
    }
}

pub(crate) fn lookup_review(
    args: &ServeArgs,
    review_id: &str,
) -> Result<Arc<LoadedReview>, StatusCode> {
    let review_root = std::path::Path::new(&args.review_root);
    match get_review(review_root, review_id) {
        Ok(Some(loaded)) => Ok(loaded),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::warn!("Failed to load review {}: {:#}", review_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_payloads(State(args): State<Arc<ServeArgs>>) -> Json<Vec<PayloadInfo>> {
    let payload_root = std::path::Path::new(&args.payload_root);
    let payloads = list_payloads(payload_root);
    let info_list = payloads
        .into_iter()
        .map(|payload_path| {
            let name = payload_path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();
            let path_str = payload_path.to_string_lossy().to_string();
            PayloadInfo {
                name,
                path: path_str,
            }
        })
        .collect();

    Json(info_list)
}

pub async fn get_reviews(State(args): State<Arc<ServeArgs>>) -> Json<Vec<ReviewInfo>> {
    let review_root = std::path::Path::new(&args.review_root);
    let reviews = list_reviews(review_root).unwrap_or_default();
    let info_list = reviews
        .into_iter()
        .map(|(name, metadata)| ReviewInfo { name, metadata })
        .collect();

    Json(info_list)
}

pub async fn create_review_handler(
    State(args): State<Arc<ServeArgs>>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<ReviewMetadata>, StatusCode> {
    let review_root = std::path::Path::new(&args.review_root);
    let mut payload_path = PathBuf::from(&request.payload_path);
    if payload_path.is_relative() {
        payload_path = std::path::Path::new(&args.payload_root).join(payload_path);
    }

    match crate::review_store::create_review(review_root, &payload_path) {
        Ok(metadata) => Ok(Json(metadata)),
        Err(e) => {
            tracing::warn!("Failed to create review from {:?}: {:#}", payload_path, e);
            Err(status_for_create_error(&e))
        }
    }
}

fn status_for_create_error(error: &anyhow::Error) -> StatusCode {
    if error.downcast_ref::<ReviewExists>().is_some() {
        return StatusCode::CONFLICT;
    }
    match error.downcast_ref::<PayloadError>() {
        Some(PayloadError::Read { .. }) => StatusCode::NOT_FOUND,
        Some(PayloadError::AnalysisFailed { .. }) => StatusCode::BAD_GATEWAY,
        Some(PayloadError::Json(_)) | Some(PayloadError::NotAnObject) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn get_shots_handler(
    State(args): State<Arc<ServeArgs>>,
    Path(review_id): Path<String>,
    Query(query): Query<ShotsQuery>,
) -> Result<Json<ShotsResponse>, StatusCode> {
    let loaded = lookup_review(&args, &review_id)?;
    let mut list = ShotList::new(loaded.review.payload.shots().to_vec());
    if let Some(active) = query.active {
        if !list.select(active) {
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    Ok(Json(ShotsResponse {
        active: list.active(),
        shots: list.cards(),
        summary: list.summary(),
    }))
}

pub async fn get_overlay_handler(
    State(args): State<Arc<ServeArgs>>,
    Path(review_id): Path<String>,
    Query(query): Query<OverlayQuery>,
) -> Result<Json<OverlayFrame>, StatusCode> {
    let loaded = lookup_review(&args, &review_id)?;
    let container = ContainerLayout::new(query.width.max(0.0), query.height.max(0.0));
    Ok(Json(OverlayFrame::compute(&loaded, &container, query.t)))
}
