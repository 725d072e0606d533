use crate::overlay::types::{ContainerLayout, NormalizedPoint, ScreenPoint, ScreenRect, VideoMetadata};

/// Rectangle the video occupies inside its container under a "contain" fit:
/// scaled to fit entirely, aspect ratio preserved, centered, with blank bars
/// filling the leftover space.
pub type DisplayRect = ScreenRect;

/// Compute the video's display rectangle inside the container.
/// Returns `None` while the container is unmeasured or the video has no size.
pub fn display_rect(video: &VideoMetadata, container: &ContainerLayout) -> Option<DisplayRect> {
    if container.width == 0.0 || container.height == 0.0 || video.width == 0 {
        return None;
    }
    let video_ratio = video.aspect_ratio()?;
    let container_ratio = container.width / container.height;

    if video_ratio > container_ratio {
        // Relatively wider video: full width, bars above and below
        let display_height = container.width / video_ratio;
        Some(ScreenRect {
            x: 0.0,
            y: (container.height - display_height) / 2.0,
            w: container.width,
            h: display_height,
        })
    } else {
        // Relatively taller (or equal): full height, bars left and right
        let display_width = container.height * video_ratio;
        Some(ScreenRect {
            x: (container.width - display_width) / 2.0,
            y: 0.0,
            w: display_width,
            h: container.height,
        })
    }
}

/// Map a normalized frame coordinate to container coordinates.
pub fn map_point(
    video: &VideoMetadata,
    container: &ContainerLayout,
    point: NormalizedPoint,
) -> Option<ScreenPoint> {
    let rect = display_rect(video, container)?;
    Some(ScreenPoint {
        x: rect.x + point.x * rect.w,
        y: rect.y + point.y * rect.h,
    })
}
