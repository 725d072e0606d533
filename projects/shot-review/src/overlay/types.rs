// Overlay value types
//
// Plain data shared by the matcher, the geometry mapper and the marker
// builder. Tracking coordinates are normalized to the video frame; screen
// coordinates are in container units.

use serde::{Deserialize, Deserializer, Serialize};

/// Intrinsic pixel dimensions of the source video, as reported by the
/// analysis service (or by the player when it can).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct VideoMetadata {
    #[serde(default, deserialize_with = "de_dimension")]
    pub width: u32,
    #[serde(default, deserialize_with = "de_dimension")]
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
}

impl VideoMetadata {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fps: None,
        }
    }

    /// A zero dimension disables overlay rendering entirely.
    pub fn is_renderable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_renderable() {
            Some(self.width as f64 / self.height as f64)
        } else {
            None
        }
    }
}

/// Null, negative and non-finite dimensions all read as 0.
fn de_dimension<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v as u32)
        .unwrap_or(0))
}

/// Size of the viewport hosting the video. May be zero during the first
/// layout pass.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerLayout {
    pub width: f64,
    pub height: f64,
}

impl ContainerLayout {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_measured(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// One timestamped head-position estimate.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TrackingSample {
    pub timestamp: f64,
    pub head_x: f64,
    pub head_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
}

impl TrackingSample {
    pub fn new(timestamp: f64, head_x: f64, head_y: f64) -> Self {
        Self {
            timestamp,
            head_x,
            head_y,
            frame: None,
        }
    }

    /// Head position with out-of-range values clamped into [0, 1].
    pub fn head(&self) -> NormalizedPoint {
        NormalizedPoint::clamped(self.head_x, self.head_y)
    }
}

/// A point in normalized frame coordinates [0, 1]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn clamped(x: f64, y: f64) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }
}

/// NaN collapses to 0 so a bad sample still lands inside the frame.
fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// A point in container (screen) units
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in container units
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl ScreenRect {
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_is_clamped() {
        let sample = TrackingSample::new(0.0, 1.4, -0.2);
        let head = sample.head();
        assert_eq!(head.x, 1.0);
        assert_eq!(head.y, 0.0);

        let nan = TrackingSample::new(0.0, f64::NAN, 0.5).head();
        assert_eq!(nan.x, 0.0);
        assert_eq!(nan.y, 0.5);
    }

    #[test]
    fn test_zero_dimensions_not_renderable() {
        assert!(!VideoMetadata::new(0, 1080).is_renderable());
        assert!(!VideoMetadata::new(1920, 0).is_renderable());
        assert_eq!(VideoMetadata::new(0, 1080).aspect_ratio(), None);
        assert!(!ContainerLayout::new(800.0, 0.0).is_measured());
        assert!(ContainerLayout::new(800.0, 450.0).is_measured());
    }

    #[test]
    fn test_metadata_missing_fields_default_to_zero() {
        let meta: VideoMetadata = serde_json::from_str(r#"{"fps": 30.0}"#).unwrap();
        assert_eq!(meta.width, 0);
        assert_eq!(meta.height, 0);
        assert_eq!(meta.fps, Some(30.0));

        let meta: VideoMetadata =
            serde_json::from_str(r#"{"width": null, "height": 720}"#).unwrap();
        assert_eq!(meta.width, 0);
        assert_eq!(meta.height, 720);
    }
}
