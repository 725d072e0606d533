// Overlay playback stream
//
// Plays a review's overlay track over Server-Sent Events, one frame per
// progress interval, so a client without a local engine can follow along.

use crate::cli::ServeArgs;
use crate::overlay::types::ContainerLayout;
use crate::replay::{tick_count, tick_times, PROGRESS_INTERVAL};
use crate::web::api::{lookup_review, OverlayFrame};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

const MIN_SPEED: f64 = 0.1;
const MAX_SPEED: f64 = 64.0;
/// One hour of frames at the progress cadence
const MAX_STREAM_FRAMES: usize = 72_000;

#[derive(Deserialize)]
pub struct StreamQuery {
    pub width: f64,
    pub height: f64,
    /// Playback rate; 1.0 is real time
    pub speed: Option<f64>,
    pub start: Option<f64>,
}

pub async fn stream_overlay_handler(
    State(args): State<Arc<ServeArgs>>,
    Path(review_id): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let loaded = lookup_review(&args, &review_id)?;
    let container = ContainerLayout::new(query.width.max(0.0), query.height.max(0.0));
    let speed = query
        .speed
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(1.0)
        .clamp(MIN_SPEED, MAX_SPEED);
    let (first, last) = loaded.index.time_span().unwrap_or((0.0, 0.0));
    let start = match query.start {
        None => first,
        Some(s) if s.is_finite() && s >= first && s <= last => s,
        Some(s) => {
            tracing::warn!(
                "Rejected stream start {} for {} (tracking spans {}..{})",
                s,
                review_id,
                first,
                last
            );
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // media time advances `speed` progress intervals per wall-clock interval
    let tick = PROGRESS_INTERVAL.mul_f64(speed);
    let frames = tick_count(start, last, tick);
    if frames > MAX_STREAM_FRAMES {
        tracing::warn!(
            "Rejected stream for {}: {} frames exceeds {}",
            review_id,
            frames,
            MAX_STREAM_FRAMES
        );
        return Err(StatusCode::BAD_REQUEST);
    }
    let times = tick_times(start, last, tick);
    tracing::info!(
        "Streaming overlay for {} ({} frames at {}x)",
        review_id,
        frames,
        speed
    );

    let stream = async_stream::stream! {
        let mut ticks = IntervalStream::new(tokio::time::interval(PROGRESS_INTERVAL));
        for t in times {
            if ticks.next().await.is_none() {
                break;
            }
            let frame = OverlayFrame::compute(&loaded, &container, t);
            let data = serde_json::to_string(&frame).unwrap_or_default();
            yield Ok(Event::default().event("frame").data(data));
        }
        yield Ok(Event::default().event("complete").data("{}"));
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
