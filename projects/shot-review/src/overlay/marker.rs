// Player marker geometry
//
// A downward-pointing triangle whose tip floats a fixed distance above the
// tracked head, topped by a label plate. Sizes are fixed screen units and do
// not follow the video scale.

use crate::overlay::types::{ScreenPoint, ScreenRect};
use serde::Serialize;

pub const MARKER_LABEL: &str = "PLAYER";
pub const TIP_GAP: f64 = 60.0;
pub const INDICATOR_WIDTH: f64 = 20.0;
pub const INDICATOR_HEIGHT: f64 = 20.0;
pub const PLATE_WIDTH: f64 = 80.0;
pub const PLATE_HEIGHT: f64 = 30.0;

/// Drawable marker for one overlay frame
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MarkerGeometry {
    /// Mapped head position the marker points at
    pub anchor: ScreenPoint,
    /// Triangle vertices: tip, then base left, base right
    pub indicator: [ScreenPoint; 3],
    pub plate: ScreenRect,
    pub label: &'static str,
    /// Where the label text is centered
    pub label_center: ScreenPoint,
}

impl MarkerGeometry {
    pub fn tip(&self) -> ScreenPoint {
        self.indicator[0]
    }

    /// SVG path data for the indicator triangle.
    pub fn indicator_path(&self) -> String {
        let [tip, left, right] = self.indicator;
        format!(
            "M {:.2} {:.2} L {:.2} {:.2} L {:.2} {:.2} Z",
            left.x, left.y, right.x, right.y, tip.x, tip.y
        )
    }
}

pub fn build_marker(anchor: ScreenPoint) -> MarkerGeometry {
    let tip = ScreenPoint::new(anchor.x, anchor.y - TIP_GAP);
    let base_y = tip.y - INDICATOR_HEIGHT;
    let half_base = INDICATOR_WIDTH / 2.0;

    let plate = ScreenRect {
        x: anchor.x - PLATE_WIDTH / 2.0,
        y: base_y - PLATE_HEIGHT,
        w: PLATE_WIDTH,
        h: PLATE_HEIGHT,
    };

    MarkerGeometry {
        anchor,
        indicator: [
            tip,
            ScreenPoint::new(anchor.x - half_base, base_y),
            ScreenPoint::new(anchor.x + half_base, base_y),
        ],
        plate,
        label: MARKER_LABEL,
        label_center: plate.center(),
    }
}
