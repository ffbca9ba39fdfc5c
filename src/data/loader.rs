use crate::geometry::Point;
use anyhow::Context;
use image::{open, RgbaImage};
use std::path::Path;

pub fn load_image<P: AsRef<Path>>(path: P) -> crate::Result<RgbaImage> {
    let path = path.as_ref();
    let img = open(path).with_context(|| format!("failed to open image {}", path.display()))?;
    Ok(img.to_rgba8())
}

pub fn save_image<P: AsRef<Path>>(image: &RgbaImage, path: P) -> crate::Result<()> {
    let path = path.as_ref();
    image
        .save(path)
        .with_context(|| format!("failed to write image {}", path.display()))
}

/// Fails when a keypoint lies outside `img`, which means the keypoints were
/// detected in a different photo.
pub fn validate_points_within(img: &RgbaImage, points: &[Point]) -> crate::Result<()> {
    let (width, height) = (img.width() as f64, img.height() as f64);
    if let Some((index, p)) = points
        .iter()
        .enumerate()
        .find(|(_, p)| !(p.x >= 0.0 && p.x < width && p.y >= 0.0 && p.y < height))
    {
        anyhow::bail!(
            "keypoint {} at ({:.1}, {:.1}) lies outside the {}x{} image",
            index,
            p.x,
            p.y,
            img.width(),
            img.height()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.png");
        let img = RgbaImage::from_pixel(16, 12, image::Rgba([10, 20, 30, 255]));

        save_image(&img, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.dimensions(), (16, 12));
        assert_eq!(loaded.get_pixel(3, 4), &image::Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_points_outside_image_rejected() {
        let img = RgbaImage::new(8, 32);
        let inside = [Point::new(0.0, 0.0), Point::new(7.5, 31.2)];
        assert!(validate_points_within(&img, &inside).is_ok());

        let err = validate_points_within(&img, &[Point::new(3.0, 3.0), Point::new(8.0, 4.0)])
            .unwrap_err();
        assert!(err.to_string().starts_with("keypoint 1 "));
        assert!(validate_points_within(&img, &[Point::new(-0.5, 4.0)]).is_err());
    }
}
