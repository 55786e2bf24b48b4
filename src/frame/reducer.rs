use image::{ImageBuffer, Rgb, Rgba};

use crate::frame::types::{CanonicalBuffer, ReducedBuffer};
use crate::project::RgbColor;

/// Converts composited RGBA buffers to the one-bit transparency model of the output
/// container.
///
/// Palette quantization is left to the encoder. Every frame of a render goes through the
/// same reducer settings, so all frames share one colour model.
#[derive(Debug, Clone, Copy)]
pub struct TransparencyReducer {
    pub transparent: bool,
    pub alpha_threshold: u8,
    pub background: RgbColor,
}

impl TransparencyReducer {
    pub fn new(transparent: bool, alpha_threshold: u8, background: RgbColor) -> Self {
        Self { transparent, alpha_threshold, background }
    }

    pub fn reduce(&self, buffer: &CanonicalBuffer) -> ReducedBuffer {
        if self.transparent {
            ReducedBuffer::BinaryAlpha(self.binarize(buffer))
        } else {
            ReducedBuffer::Rgb(self.flatten(buffer))
        }
    }

    /// Alpha-over onto the background colour, dropping the alpha channel
    fn flatten(&self, buffer: &CanonicalBuffer) -> image::RgbImage {
        let bg = self.background.0;
        let source = buffer.as_image();

        ImageBuffer::from_fn(buffer.width(), buffer.height(), |x, y| {
            let [r, g, b, a] = source.get_pixel(x, y).0;
            Rgb([over(r, bg[0], a), over(g, bg[1], a), over(b, bg[2], a)])
        })
    }

    /// Pixels under the threshold become `[0, 0, 0, 0]`, the rest fully opaque
    fn binarize(&self, buffer: &CanonicalBuffer) -> image::RgbaImage {
        let threshold = self.alpha_threshold;
        let source = buffer.as_image();

        ImageBuffer::from_fn(buffer.width(), buffer.height(), |x, y| {
            let [r, g, b, a] = source.get_pixel(x, y).0;
            if a < threshold {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([r, g, b, 255])
            }
        })
    }
}

/// `fg * a + bg * (255 - a)`, divided by 255 with round-half-up
fn over(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    let sum = u32::from(fg) * a + u32::from(bg) * (255 - a);
    ((sum * 2 + 255) / 510) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> CanonicalBuffer {
        CanonicalBuffer::from_fn(16, 16, |x, y| {
            [(x * 16) as u8, (y * 16) as u8, 77, (x * 16 + y) as u8]
        })
    }

    #[test]
    fn test_transparent_output_is_binary() {
        let reducer = TransparencyReducer::new(true, 128, RgbColor::WHITE);
        match reducer.reduce(&gradient()) {
            ReducedBuffer::BinaryAlpha(image) => {
                assert!(image.pixels().all(|p| p[3] == 0 || p[3] == 255));
                // Below threshold collapses to the designated transparent colour
                assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 0]);
                // At threshold stays visible with its own colour
                assert_eq!(image.get_pixel(8, 0).0, [128, 0, 77, 255]);
            }
            other => panic!("expected binary alpha, got {:?}", other.dimensions()),
        }
    }

    #[test]
    fn test_flatten_has_no_alpha() {
        let reducer = TransparencyReducer::new(false, 128, RgbColor([10, 20, 30]));
        let reduced = reducer.reduce(&gradient());
        assert!(!reduced.has_alpha());
        assert_eq!(reduced.as_raw().len(), 16 * 16 * 3);
    }

    #[test]
    fn test_flatten_composites_over_background() {
        let mut buffer = CanonicalBuffer::new_filled(2, 1, [255, 0, 0, 255]);
        buffer.set_pixel(1, 0, [255, 0, 0, 0]);
        let reducer = TransparencyReducer::new(false, 128, RgbColor([0, 0, 255]));

        match reducer.reduce(&buffer) {
            ReducedBuffer::Rgb(image) => {
                assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);
                assert_eq!(image.get_pixel(1, 0).0, [0, 0, 255]);
            }
            other => panic!("expected rgb, got {:?}", other.dimensions()),
        }
    }

    #[test]
    fn test_over_rounds_half_up() {
        // 255 * 128 / 255 = 128 exactly; 255 * 1 / 255 = 1
        assert_eq!(over(255, 0, 128), 128);
        assert_eq!(over(255, 0, 1), 1);
        // 100 * 0.5 + 0 ~ 50.2 -> 50
        assert_eq!(over(100, 0, 128), 50);
        assert_eq!(over(0, 200, 0), 200);
    }
}
