// Playback-synchronized overlay engine

pub mod geometry;
pub mod marker;
pub mod matcher;
pub mod session;
pub mod types;

pub use geometry::{display_rect, map_point, DisplayRect};
pub use marker::{build_marker, MarkerGeometry};
pub use matcher::{nearest_index, nearest_sample, SampleIndex};
pub use session::{marker_at, OverlayRenderer, OverlaySession};
pub use types::{
    ContainerLayout, NormalizedPoint, ScreenPoint, ScreenRect, TrackingSample, VideoMetadata,
};
