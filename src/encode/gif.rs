use std::io::Write;

use ::gif::{DisposalMethod, Encoder, EncodingError, Frame, Repeat};
use tracing::debug;

use crate::encode::{EncodeOptions, FrameEncoder};
use crate::error::{EncodeError, Result};
use crate::frame::{ReducedBuffer, RenderedFrame};

/// Animated GIF output using a per-frame NeuQuant palette
#[derive(Debug, Clone)]
pub struct GifEncoder {
    speed: i32,
}

impl GifEncoder {
    /// `speed` trades palette quality for encode time, 1 (best) to 30 (fastest)
    pub fn new(speed: i32) -> Self {
        Self { speed: speed.clamp(1, 30) }
    }

    /// Milliseconds to GIF centiseconds, rounded half-up and never 0
    pub fn delay_centiseconds(duration_ms: u32) -> u16 {
        let cs = (u64::from(duration_ms) + 5) / 10;
        cs.clamp(1, u64::from(u16::MAX)) as u16
    }

    fn canvas_of(frames: &[RenderedFrame], transparent: bool) -> Result<(u16, u16)> {
        let first = frames.first().ok_or(EncodeError::NoFrames)?;
        let (width, height) = first.buffer.dimensions();

        for (index, frame) in frames.iter().enumerate() {
            if frame.buffer.has_alpha() != transparent {
                return Err(EncodeError::ColorModelMismatch { index, transparent }.into());
            }

            let (w, h) = frame.buffer.dimensions();
            if (w, h) != (width, height) {
                return Err(EncodeError::InconsistentFrame {
                    index,
                    width: w,
                    height: h,
                    expected_width: width,
                    expected_height: height,
                }.into());
            }
        }

        match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
            _ => Err(EncodeError::CanvasTooLarge { width, height }.into()),
        }
    }

    fn write_all<W: Write>(
        &self,
        sink: W,
        frames: &[RenderedFrame],
        options: &EncodeOptions,
    ) -> Result<()> {
        let (width, height) = Self::canvas_of(frames, options.transparent)?;

        let mut encoder = Encoder::new(sink, width, height, &[]).map_err(encode_failed)?;
        let repeat = match options.loop_count {
            0 => Repeat::Infinite,
            n => Repeat::Finite(n),
        };
        encoder.set_repeat(repeat).map_err(encode_failed)?;

        for frame in frames {
            let mut gif_frame = self.to_gif_frame(frame, width, height);
            gif_frame.delay = Self::delay_centiseconds(frame.duration_ms);
            gif_frame.dispose = DisposalMethod::Background;
            encoder.write_frame(&gif_frame).map_err(encode_failed)?;
        }

        // trailer is written on drop
        Ok(())
    }

    fn to_gif_frame(&self, frame: &RenderedFrame, width: u16, height: u16) -> Frame<'static> {
        match &frame.buffer {
            ReducedBuffer::Rgb(image) => Frame::from_rgb_speed(width, height, image.as_raw(), self.speed),
            ReducedBuffer::BinaryAlpha(image) => {
                // alpha-0 pixels become the frame's transparent palette index
                let mut pixels = image.as_raw().clone();
                Frame::from_rgba_speed(width, height, &mut pixels, self.speed)
            }
        }
    }
}

impl Default for GifEncoder {
    fn default() -> Self {
        Self::new(10)
    }
}

impl FrameEncoder for GifEncoder {
    fn name(&self) -> &str {
        "gif"
    }

    fn encode(&self, frames: &[RenderedFrame], options: &EncodeOptions) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_all(&mut bytes, frames, options)?;
        debug!("Encoded {} frames into {} bytes", frames.len(), bytes.len());
        Ok(bytes)
    }

    fn estimate_size(&self, frames: &[RenderedFrame]) -> Result<u64> {
        let options = EncodeOptions {
            loop_count: 0,
            transparent: frames.first().map_or(false, |f| f.buffer.has_alpha()),
        };
        let mut counter = ByteCounter::default();
        self.write_all(&mut counter, frames, &options)?;
        Ok(counter.count)
    }
}

/// A sink that only counts what is written to it
#[derive(Debug, Default)]
struct ByteCounter {
    count: u64,
}

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.count += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn encode_failed(error: EncodingError) -> crate::ForgeError {
    EncodeError::Failed { reason: error.to_string() }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;
    use image::{ImageBuffer, Rgb, Rgba};

    fn rgb_frame(width: u32, height: u32, color: [u8; 3], duration_ms: u32) -> RenderedFrame {
        RenderedFrame::new(
            ReducedBuffer::Rgb(ImageBuffer::from_pixel(width, height, Rgb(color))),
            duration_ms,
        )
    }

    fn decode(bytes: &[u8]) -> Vec<(u16, Vec<u8>, Option<u8>)> {
        let mut options = ::gif::DecodeOptions::new();
        options.set_color_output(::gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(bytes).unwrap();
        let mut frames = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            frames.push((frame.delay, frame.buffer.to_vec(), frame.transparent));
        }
        frames
    }

    /// Palette quantization may move a colour slightly
    fn assert_close(got: &[u8], want: &[u8]) {
        for (g, w) in got.iter().zip(want) {
            assert!((*g as i32 - *w as i32).abs() <= 4, "{:?} vs {:?}", got, want);
        }
    }

    #[test]
    fn test_delay_conversion() {
        assert_eq!(GifEncoder::delay_centiseconds(100), 10);
        assert_eq!(GifEncoder::delay_centiseconds(33), 3);
        assert_eq!(GifEncoder::delay_centiseconds(35), 4);
        assert_eq!(GifEncoder::delay_centiseconds(1), 1);
        assert_eq!(GifEncoder::delay_centiseconds(0), 1);
        assert_eq!(GifEncoder::delay_centiseconds(u32::MAX), u16::MAX);
    }

    #[test]
    fn test_encode_frames_in_order() {
        let frames = vec![
            rgb_frame(4, 3, [255, 0, 0], 100),
            rgb_frame(4, 3, [0, 0, 255], 250),
        ];
        let bytes = GifEncoder::default().encode(&frames, &EncodeOptions::default()).unwrap();
        assert_eq!(&bytes[..6], b"GIF89a");

        let decoded = decode(&bytes);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].0, 10);
        assert_eq!(decoded[1].0, 25);
        assert_close(&decoded[0].1[..3], &[255, 0, 0]);
        assert_close(&decoded[1].1[..3], &[0, 0, 255]);
    }

    #[test]
    fn test_binary_alpha_keeps_transparency() {
        let image = ImageBuffer::from_fn(4, 4, |x, _| {
            if x < 2 { Rgba([0, 0, 0, 0]) } else { Rgba([10, 200, 30, 255]) }
        });
        let frames = vec![RenderedFrame::new(ReducedBuffer::BinaryAlpha(image), 50)];
        let options = EncodeOptions { loop_count: 0, transparent: true };
        let bytes = GifEncoder::default().encode(&frames, &options).unwrap();

        let decoded = decode(&bytes);
        assert!(decoded[0].2.is_some());
        // first pixel transparent, third opaque
        assert_eq!(decoded[0].1[3], 0);
        assert_eq!(decoded[0].1[11], 255);
    }

    #[test]
    fn test_estimate_close_to_actual_size() {
        let frames: Vec<RenderedFrame> = (0..5)
            .map(|i| rgb_frame(16, 16, [i * 40, 100, 255 - i * 40], 80))
            .collect();
        let encoder = GifEncoder::default();
        let actual = encoder.encode(&frames, &EncodeOptions::default()).unwrap().len() as u64;
        let estimate = encoder.estimate_size(&frames).unwrap();
        assert_eq!(estimate, actual);
    }

    #[test]
    fn test_rejects_empty_and_mismatched_frames() {
        let encoder = GifEncoder::default();
        assert!(matches!(
            encoder.encode(&[], &EncodeOptions::default()),
            Err(ForgeError::Encode(EncodeError::NoFrames))
        ));

        let frames = vec![rgb_frame(4, 4, [0, 0, 0], 10), rgb_frame(4, 5, [0, 0, 0], 10)];
        assert!(matches!(
            encoder.encode(&frames, &EncodeOptions::default()),
            Err(ForgeError::Encode(EncodeError::InconsistentFrame { index: 1, .. }))
        ));
    }

    #[test]
    fn test_transparent_flag_must_match_frames() {
        let encoder = GifEncoder::default();
        let flattened = vec![rgb_frame(4, 4, [1, 2, 3], 10)];
        assert!(matches!(
            encoder.encode(&flattened, &EncodeOptions { loop_count: 0, transparent: true }),
            Err(ForgeError::Encode(EncodeError::ColorModelMismatch { index: 0, transparent: true }))
        ));

        let alpha = RenderedFrame::new(ReducedBuffer::BinaryAlpha(ImageBuffer::from_pixel(4, 4, Rgba([0, 0, 0, 0]))), 10);
        let mixed = vec![alpha.clone(), rgb_frame(4, 4, [1, 2, 3], 10)];
        assert!(matches!(
            encoder.estimate_size(&mixed),
            Err(ForgeError::Encode(EncodeError::ColorModelMismatch { index: 1, transparent: true }))
        ));
        assert!(encoder.estimate_size(&[alpha]).is_ok());
    }

    #[test]
    fn test_canvas_too_large() {
        let frames = vec![rgb_frame(70_000, 1, [0, 0, 0], 10)];
        assert!(matches!(
            GifEncoder::default().encode(&frames, &EncodeOptions::default()),
            Err(ForgeError::Encode(EncodeError::CanvasTooLarge { .. }))
        ));
    }
}
