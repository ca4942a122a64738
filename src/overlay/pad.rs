//! Block-alignment padding for overlay images.
//!
//! The camera's overlay renderer only accepts RGB buffers whose width is a
//! multiple of 32 and height a multiple of 16. Images of any size are pasted
//! into the top-left corner of a black buffer of the next aligned size; the
//! original dimensions are kept so only the image itself is displayed.

use super::OverlayError;
use crate::hardware::{OverlayImage, Resolution};
use image::{imageops, DynamicImage, RgbImage};
use std::path::Path;

/// Required width alignment in pixels.
pub const WIDTH_BLOCK: u32 = 32;
/// Required height alignment in pixels.
pub const HEIGHT_BLOCK: u32 = 16;

/// Rounds dimensions up to the overlay block alignment.
#[inline]
pub fn padded_dimensions(width: u32, height: u32) -> (u32, u32) {
    (
        width.div_ceil(WIDTH_BLOCK) * WIDTH_BLOCK,
        height.div_ceil(HEIGHT_BLOCK) * HEIGHT_BLOCK,
    )
}

/// Pads a decoded image into an overlay buffer.
pub fn pad_image(image: &DynamicImage) -> OverlayImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let (padded_width, padded_height) = padded_dimensions(width, height);

    let mut canvas = RgbImage::new(padded_width, padded_height);
    imageops::replace(&mut canvas, &rgb, 0, 0);

    OverlayImage {
        pixels: canvas.into_raw(),
        padded: Resolution::new(padded_width, padded_height),
        visible: Resolution::new(width, height),
    }
}

/// Loads an image file and pads it for display.
pub fn load_padded(path: &Path) -> Result<OverlayImage, OverlayError> {
    let image = image::open(path).map_err(|e| OverlayError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(pad_image(&image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_aligned_dimensions_unchanged() {
        assert_eq!(padded_dimensions(800, 480), (800, 480));
        assert_eq!(padded_dimensions(32, 16), (32, 16));
    }

    #[test]
    fn test_dimensions_round_up() {
        assert_eq!(padded_dimensions(1, 1), (32, 16));
        assert_eq!(padded_dimensions(33, 17), (64, 32));
        assert_eq!(padded_dimensions(1920, 1080), (1920, 1088));
    }

    #[test]
    fn test_pad_preserves_pixels_and_visible_size() {
        let source = RgbImage::from_pixel(10, 5, image::Rgb([200, 100, 50]));
        let overlay = pad_image(&DynamicImage::ImageRgb8(source));

        assert_eq!(overlay.visible, Resolution::new(10, 5));
        assert_eq!(overlay.padded, Resolution::new(32, 16));
        assert_eq!(overlay.pixels.len(), 32 * 16 * 3);
        // Top-left pixel is the image, the padding is black
        assert_eq!(&overlay.pixels[0..3], &[200, 100, 50]);
        let outside = (10 * 3) as usize;
        assert_eq!(&overlay.pixels[outside..outside + 3], &[0, 0, 0]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_padded(Path::new("/definitely/not/here.png"));
        assert!(matches!(result, Err(OverlayError::Load { .. })));
    }

    proptest! {
        #[test]
        fn padded_is_smallest_aligned_cover(width in 1u32..4096, height in 1u32..4096) {
            let (w, h) = padded_dimensions(width, height);
            prop_assert_eq!(w % WIDTH_BLOCK, 0);
            prop_assert_eq!(h % HEIGHT_BLOCK, 0);
            prop_assert!(w >= width && w - width < WIDTH_BLOCK);
            prop_assert!(h >= height && h - height < HEIGHT_BLOCK);
        }
    }
}
