use egui::ColorImage;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Height of the countdown banner strip burned into preview frames.
pub const BANNER_HEIGHT: u32 = 48;

const BANNER_COLOR: Rgb<u8> = Rgb([24, 24, 24]);

/// A preview frame ready for the display surface: converted pixels plus the
/// countdown caption painted on top of the banner strip.
pub struct DisplayFrame {
    pub image: ColorImage,
    pub caption: String,
}

/// Burn the banner strip into the top of the frame. Frames shorter than the
/// banner are left untouched.
pub fn burn_banner(frame: &mut RgbImage) {
    if frame.height() < BANNER_HEIGHT || frame.width() == 0 {
        return;
    }

    let rect = Rect::at(0, 0).of_size(frame.width(), BANNER_HEIGHT);
    draw_filled_rect_mut(frame, rect, BANNER_COLOR);
}

/// Convert an RGB frame into egui's display format.
pub fn to_color_image(frame: &RgbImage) -> ColorImage {
    let size = [frame.width() as usize, frame.height() as usize];
    let pixels = frame.as_flat_samples();
    ColorImage::from_rgb(size, pixels.as_slice())
}

pub fn caption(countdown_remaining: u32) -> String {
    format!("Time Remaining: {} sec", countdown_remaining)
}

/// Render one preview frame: banner burn, caption, display conversion.
pub fn render_display_frame(mut frame: RgbImage, countdown_remaining: u32) -> DisplayFrame {
    burn_banner(&mut frame);
    DisplayFrame {
        image: to_color_image(&frame),
        caption: caption(countdown_remaining),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    fn white_frame(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_banner_covers_top_strip_only() {
        let mut frame = white_frame(320, 240);
        burn_banner(&mut frame);

        assert_eq!(*frame.get_pixel(0, 0), BANNER_COLOR);
        assert_eq!(*frame.get_pixel(319, BANNER_HEIGHT - 1), BANNER_COLOR);
        assert_eq!(*frame.get_pixel(0, BANNER_HEIGHT), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_banner_skips_tiny_frames() {
        let mut frame = white_frame(32, 16);
        burn_banner(&mut frame);
        assert_eq!(*frame.get_pixel(0, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_display_conversion() {
        let frame = white_frame(64, 48);
        let color_image = to_color_image(&frame);
        assert_eq!(color_image.size, [64, 48]);
    }

    #[test]
    fn test_render_display_frame() {
        let display = render_display_frame(white_frame(320, 240), 7);
        assert_eq!(display.caption, "Time Remaining: 7 sec");
        assert_eq!(display.image.size, [320, 240]);
    }
}
