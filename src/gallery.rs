use anyhow::{Context, Result};
use image::RgbImage;
use std::path::Path;

/// Fixed column count of the review grid.
pub const GRID_COLUMNS: usize = 3;

/// Grid coordinates for the n-th photo (0-indexed), capture order preserved.
pub fn grid_position(index: usize) -> (usize, usize) {
    (index / GRID_COLUMNS, index % GRID_COLUMNS)
}

/// Scale an image to fit within the given bounds, preserving aspect ratio.
/// Images already inside the bounds are returned unscaled.
pub fn thumbnail(image: &RgbImage, max_width: u32, max_height: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width <= max_width && height <= max_height {
        return image.clone();
    }

    let width_ratio = max_width as f32 / width as f32;
    let height_ratio = max_height as f32 / height as f32;
    let ratio = width_ratio.min(height_ratio);

    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);

    image::imageops::resize(
        image,
        new_width,
        new_height,
        image::imageops::FilterType::Triangle,
    )
}

/// Load a captured photo from disk and scale it for the review grid.
pub fn load_thumbnail<P: AsRef<Path>>(path: P, max_width: u32, max_height: u32) -> Result<RgbImage> {
    let path = path.as_ref();
    let img = image::open(path)
        .with_context(|| format!("Failed to load photo from {}", path.display()))?;

    Ok(thumbnail(&img.to_rgb8(), max_width, max_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn test_grid_positions_for_six_photos() {
        let positions: Vec<_> = (0..6).map(grid_position).collect();
        assert_eq!(
            positions,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
    }

    #[test]
    fn test_grid_wraps_after_three_columns() {
        assert_eq!(grid_position(7), (2, 1));
    }

    #[test]
    fn test_thumbnail_fits_bounds_and_keeps_aspect() {
        let image: RgbImage = ImageBuffer::from_pixel(800, 400, Rgb([1, 2, 3]));
        let thumb = thumbnail(&image, 200, 150);

        assert!(thumb.width() <= 200);
        assert!(thumb.height() <= 150);

        let original_ratio = 800.0 / 400.0;
        let thumb_ratio = thumb.width() as f32 / thumb.height() as f32;
        assert!((original_ratio - thumb_ratio).abs() < 0.05);
    }

    #[test]
    fn test_small_image_not_upscaled() {
        let image: RgbImage = ImageBuffer::from_pixel(100, 80, Rgb([1, 2, 3]));
        let thumb = thumbnail(&image, 200, 150);
        assert_eq!(thumb.dimensions(), (100, 80));
    }
}
