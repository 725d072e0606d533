// Simulated playback
//
// Steps an overlay session through a payload's timeline at the player's
// progress cadence and hands every tick's marker to a sink (CSV writer,
// stdout, tests).

use crate::analysis::AnalysisPayload;
use crate::overlay::marker::MarkerGeometry;
use crate::overlay::session::{OverlayRenderer, OverlaySession};
use crate::overlay::types::ContainerLayout;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::time::{Duration, Instant};

/// Interval between playback progress notifications
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(50);

pub struct ReplayConfig {
    pub container: ContainerLayout,
    pub tick: Duration,
    pub start: f64,
    /// Playback end in seconds; defaults to the last tracking timestamp
    pub end: Option<f64>,
    pub show_progress: bool,
}

impl ReplayConfig {
    pub fn new(container: ContainerLayout) -> Self {
        Self {
            container,
            tick: PROGRESS_INTERVAL,
            start: 0.0,
            end: None,
            show_progress: false,
        }
    }
}

pub struct ReplayStats {
    pub ticks: usize,
    pub visible: usize,
    pub duration: Duration,
}

/// A trait for consuming replayed overlay frames.
pub trait TickSink {
    fn on_tick(&mut self, time: f64, marker: Option<&MarkerGeometry>) -> Result<()>;
}

/// Blanket implementation so any closure with the right signature
/// automatically implements TickSink.
impl<F> TickSink for F
where
    F: FnMut(f64, Option<&MarkerGeometry>) -> Result<()>,
{
    fn on_tick(&mut self, time: f64, marker: Option<&MarkerGeometry>) -> Result<()> {
        self(time, marker)
    }
}

/// Renderer that only advances the progress bar and counts drawn frames.
struct ProgressRenderer {
    pb: ProgressBar,
    visible: usize,
}

impl OverlayRenderer for ProgressRenderer {
    fn render(&mut self, marker: Option<&MarkerGeometry>) {
        if marker.is_some() {
            self.visible += 1;
        }
    }
}

/// Upper bound on ticks in a single replay (about 2.7 hours at 50 ms)
pub const MAX_REPLAY_TICKS: usize = 200_000;

/// Number of ticks from `start` to `end` inclusive, `tick` apart.
/// Saturates instead of overflowing on huge spans.
pub fn tick_count(start: f64, end: f64, tick: Duration) -> usize {
    let step = tick.as_secs_f64();
    if step <= 0.0 || !start.is_finite() || !end.is_finite() || end < start {
        return 1;
    }
    // float to usize casts saturate
    (((end - start) / step + 1e-9).floor() as usize).saturating_add(1)
}

/// Tick times from `start` to `end` inclusive, `tick` apart. Lazy, so the
/// caller decides how many it can afford via [`tick_count`].
pub fn tick_times(start: f64, end: f64, tick: Duration) -> impl Iterator<Item = f64> {
    let step = tick.as_secs_f64();
    (0..tick_count(start, end, tick)).map(move |i| start + i as f64 * step)
}

/// Last finite tracking timestamp, if any.
fn last_timestamp(payload: &AnalysisPayload) -> Option<f64> {
    payload
        .tracking
        .iter()
        .map(|s| s.timestamp)
        .filter(|t| t.is_finite())
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))))
}

pub fn replay<S>(payload: &AnalysisPayload, config: &ReplayConfig, mut sink: S) -> Result<ReplayStats>
where
    S: TickSink,
{
    let start_time = Instant::now();
    let end = config
        .end
        .or_else(|| last_timestamp(payload))
        .unwrap_or(config.start);
    let count = tick_count(config.start, end, config.tick);
    if count > MAX_REPLAY_TICKS {
        anyhow::bail!(
            "Replay from {}s to {}s needs {} ticks (limit {})",
            config.start,
            end,
            count,
            MAX_REPLAY_TICKS
        );
    }

    let pb = if config.show_progress {
        let pb = ProgressBar::new(count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ticks ({per_sec:.1.yellow})")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut session = OverlaySession::new(
        payload.metadata,
        payload.tracking.clone().into(),
        ProgressRenderer { pb, visible: 0 },
    );

    session.on_layout(config.container);
    // the layout pass renders once before playback starts
    let layout_visible = usize::from(session.marker().is_some());

    for t in tick_times(config.start, end, config.tick) {
        session.on_progress(t);
        sink.on_tick(t, session.marker())?;
        session.renderer().pb.inc(1);
    }

    let renderer = session.into_renderer();
    renderer.pb.finish_with_message("Done");
    tracing::debug!(
        "Replayed {} ticks, marker visible on {}",
        count,
        renderer.visible - layout_visible
    );

    Ok(ReplayStats {
        ticks: count,
        visible: renderer.visible - layout_visible,
        duration: start_time.elapsed(),
    })
}

/// One CSV row per tick; marker columns are empty when nothing is drawn.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReplayRow {
    pub time: f64,
    pub anchor_x: Option<f64>,
    pub anchor_y: Option<f64>,
    pub tip_x: Option<f64>,
    pub tip_y: Option<f64>,
    pub plate_x: Option<f64>,
    pub plate_y: Option<f64>,
    pub plate_w: Option<f64>,
    pub plate_h: Option<f64>,
}

impl ReplayRow {
    pub fn new(time: f64, marker: Option<&MarkerGeometry>) -> Self {
        Self {
            time,
            anchor_x: marker.map(|m| m.anchor.x),
            anchor_y: marker.map(|m| m.anchor.y),
            tip_x: marker.map(|m| m.tip().x),
            tip_y: marker.map(|m| m.tip().y),
            plate_x: marker.map(|m| m.plate.x),
            plate_y: marker.map(|m| m.plate.y),
            plate_w: marker.map(|m| m.plate.w),
            plate_h: marker.map(|m| m.plate.h),
        }
    }
}

/// Replay into CSV on `out`.
pub fn replay_to_csv<W: io::Write>(
    payload: &AnalysisPayload,
    config: &ReplayConfig,
    out: W,
) -> Result<ReplayStats> {
    let mut writer = csv::Writer::from_writer(out);
    let stats = replay(payload, config, |time: f64, marker: Option<&MarkerGeometry>| -> Result<()> {
        writer.serialize(ReplayRow::new(time, marker))?;
        Ok(())
    })?;
    writer.flush()?;
    Ok(stats)
}
