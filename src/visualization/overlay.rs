use crate::config::{MarkerStyle, RenderConfig};
use crate::geometry::Point;
use crate::matching::MatchReport;
use image::{Rgba, RgbaImage};

/// Draw a ring marker for every point onto a copy of `image`.
pub fn draw_keypoints(image: &RgbaImage, points: &[Point], style: &MarkerStyle) -> RgbaImage {
    let mut out = image.clone();
    draw_keypoints_mut(&mut out, points, style);
    out
}

pub fn draw_keypoints_mut(image: &mut RgbaImage, points: &[Point], style: &MarkerStyle) {
    for point in points {
        if !point.is_finite() {
            tracing::debug!(?point, "skipping non-finite keypoint");
            continue;
        }
        draw_ring(image, *point, style);
    }
}

/// Photo keypoints plus the reference pose mapped into the photo.
pub fn draw_overlay(image: &RgbaImage, report: &MatchReport, render: &RenderConfig) -> RgbaImage {
    let mut out = image.clone();
    draw_keypoints_mut(&mut out, &report.photo_points, &render.photo);
    draw_keypoints_mut(&mut out, &report.overlay, &render.overlay);
    out
}

fn draw_ring(image: &mut RgbaImage, center: Point, style: &MarkerStyle) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let radius = style.radius as f64;
    let half = style.thickness as f64 / 2.0;
    let outer = radius + half;

    let x_min = (center.x - outer).floor().max(0.0);
    let y_min = (center.y - outer).floor().max(0.0);
    let x_max = (center.x + outer).ceil().min((width - 1) as f64);
    let y_max = (center.y + outer).ceil().min((height - 1) as f64);
    if x_min > x_max || y_min > y_max {
        return;
    }

    let color = Rgba(style.color);
    for y in y_min as u32..=y_max as u32 {
        for x in x_min as u32..=x_max as u32 {
            let d = (x as f64 - center.x).hypot(y as f64 - center.y);
            if (d - radius).abs() <= half {
                image.put_pixel(x, y, color);
            }
        }
    }
}
