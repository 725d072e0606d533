// Overlay session: couples playback progress and layout changes to the
// marker pipeline (match -> map -> build) and hands the result to a renderer.

use crate::overlay::geometry::map_point;
use crate::overlay::marker::{build_marker, MarkerGeometry};
use crate::overlay::matcher::SampleIndex;
use crate::overlay::types::{ContainerLayout, TrackingSample, VideoMetadata};
use std::sync::Arc;

/// Rendering surface for the overlay layer. `None` means draw nothing.
pub trait OverlayRenderer {
    fn render(&mut self, marker: Option<&MarkerGeometry>);
}

/// Blanket implementation so closures can act as renderers.
impl<F> OverlayRenderer for F
where
    F: FnMut(Option<&MarkerGeometry>),
{
    fn render(&mut self, marker: Option<&MarkerGeometry>) {
        self(marker)
    }
}

/// Compute the marker for one playback position. `None` is the not-ready
/// state: no tracking data, unmeasured container or unsized video.
pub fn marker_at(
    index: &SampleIndex,
    video: &VideoMetadata,
    container: &ContainerLayout,
    time: f64,
) -> Option<MarkerGeometry> {
    let sample = index.nearest(time)?;
    let anchor = map_point(video, container, sample.head())?;
    Some(build_marker(anchor))
}

/// Per-video playback state. Tracking data and metadata are fixed for the
/// session's lifetime; loading another video means building a new session.
pub struct OverlaySession<R: OverlayRenderer> {
    video: VideoMetadata,
    index: SampleIndex,
    current_time: f64,
    container: ContainerLayout,
    renderer: R,
    last_marker: Option<MarkerGeometry>,
}

impl<R: OverlayRenderer> OverlaySession<R> {
    pub fn new(video: VideoMetadata, tracking: Arc<[TrackingSample]>, renderer: R) -> Self {
        if !video.is_renderable() {
            tracing::debug!(
                "Video has no usable size ({}x{}), overlay disabled",
                video.width,
                video.height
            );
        }
        Self {
            video,
            index: SampleIndex::new(tracking),
            current_time: 0.0,
            container: ContainerLayout::default(),
            renderer,
            last_marker: None,
        }
    }

    /// Playback progress notification.
    pub fn on_progress(&mut self, current_time: f64) {
        self.current_time = current_time;
        self.recompute();
    }

    /// Layout notification. Replaces the previous container size.
    pub fn on_layout(&mut self, container: ContainerLayout) {
        self.container = container;
        self.recompute();
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn container(&self) -> ContainerLayout {
        self.container
    }

    pub fn video(&self) -> &VideoMetadata {
        &self.video
    }

    pub fn index(&self) -> &SampleIndex {
        &self.index
    }

    pub fn marker(&self) -> Option<&MarkerGeometry> {
        self.last_marker.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    fn recompute(&mut self) {
        self.last_marker = marker_at(&self.index, &self.video, &self.container, self.current_time);
        self.renderer.render(self.last_marker.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::types::ScreenPoint;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Option<MarkerGeometry>>,
    }

    impl OverlayRenderer for Recorder {
        fn render(&mut self, marker: Option<&MarkerGeometry>) {
            self.frames.push(marker.cloned());
        }
    }

    fn tracking() -> Arc<[TrackingSample]> {
        vec![
            TrackingSample::new(0.0, 0.5, 0.5),
            TrackingSample::new(2.0, 0.2, 0.3),
        ]
        .into()
    }

    #[test]
    fn test_end_to_end_marker() {
        let mut session = OverlaySession::new(
            VideoMetadata::new(1920, 1080),
            tracking(),
            Recorder::default(),
        );
        session.on_layout(ContainerLayout::new(800.0, 450.0));
        session.on_progress(1.9);

        let marker = session.marker().unwrap();
        assert!((marker.anchor.x - 160.0).abs() < 1e-9);
        assert!((marker.anchor.y - 135.0).abs() < 1e-9);
        assert!((marker.tip().y - 75.0).abs() < 1e-9);
        assert!(marker.plate.bottom() < marker.tip().y);
        assert_eq!(session.current_time(), 1.9);
    }

    #[test]
    fn test_every_update_renders() {
        let mut session = OverlaySession::new(
            VideoMetadata::new(1920, 1080),
            tracking(),
            Recorder::default(),
        );
        // container not measured yet
        session.on_progress(0.1);
        session.on_layout(ContainerLayout::new(800.0, 450.0));
        session.on_progress(0.2);
        session.on_layout(ContainerLayout::new(0.0, 0.0));

        let frames = &session.renderer().frames;
        assert_eq!(frames.len(), 4);
        assert!(frames[0].is_none());
        let anchor: ScreenPoint = frames[1].as_ref().unwrap().anchor;
        assert!((anchor.x - 400.0).abs() < 1e-9);
        assert!((anchor.y - 225.0).abs() < 1e-9);
        assert!(frames[2].is_some());
        assert!(frames[3].is_none());
        assert!(session.marker().is_none());
    }

    #[test]
    fn test_empty_tracking_renders_nothing() {
        let mut session = OverlaySession::new(
            VideoMetadata::new(1920, 1080),
            Vec::<TrackingSample>::new().into(),
            Recorder::default(),
        );
        session.on_layout(ContainerLayout::new(800.0, 450.0));
        session.on_progress(3.0);
        assert!(session.into_renderer().frames.iter().all(|f| f.is_none()));
    }

    #[test]
    fn test_unsized_video_renders_nothing() {
        let mut session =
            OverlaySession::new(VideoMetadata::new(0, 0), tracking(), Recorder::default());
        session.on_layout(ContainerLayout::new(800.0, 450.0));
        session.on_progress(0.0);
        assert!(session.marker().is_none());
    }

    #[test]
    fn test_closure_renderer() {
        let mut seen = 0;
        {
            let mut session = OverlaySession::new(
                VideoMetadata::new(1920, 1080),
                tracking(),
                |m: Option<&MarkerGeometry>| {
                    if m.is_some() {
                        seen += 1;
                    }
                },
            );
            session.on_layout(ContainerLayout::new(1920.0, 1080.0));
            session.on_progress(2.0);
        }
        assert_eq!(seen, 2);
    }
}
