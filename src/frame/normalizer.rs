use std::io::Cursor;

use image::{imageops, GenericImageView, ImageError, ImageFormat};
use tracing::debug;

use crate::config::ResampleFilter;
use crate::error::{DecodeError, QuotaError, Result};
use crate::frame::types::CanonicalBuffer;

/// A decoded source image fitted to the canvas
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub buffer: CanonicalBuffer,

    /// The source had at least one pixel with alpha below 255
    pub has_transparency: bool,

    /// Size of the source before resizing
    pub source_dimensions: (u32, u32),
}

/// Decodes uploaded images into canonical RGBA buffers of the canvas size
pub struct ImageNormalizer {
    filter: ResampleFilter,
    max_dimension: u32,
}

impl ImageNormalizer {
    pub fn new(filter: ResampleFilter, max_dimension: u32) -> Self {
        Self { filter, max_dimension }
    }

    /// Read an image's dimensions from its header without decoding the pixels
    pub fn probe(label: &str, bytes: &[u8]) -> Result<(u32, u32)> {
        let format = Self::detect_format(label, bytes)?;
        Self::header_dimensions(label, bytes, format)
    }

    /// Decode `bytes` and stretch the image to exactly `width` x `height`
    pub fn normalize(
        &self,
        label: &str,
        bytes: &[u8],
        width: u32,
        height: u32,
    ) -> Result<NormalizedImage> {
        let format = Self::detect_format(label, bytes)?;

        // Reject oversized sources from the header, before any pixel allocation
        let declared = Self::header_dimensions(label, bytes, format)?;
        self.check_dimensions(declared)?;

        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| Self::decode_error(label, e))?;

        let source_dimensions = image.dimensions();
        self.check_dimensions(source_dimensions)?;

        let rgba = image.to_rgba8();
        let has_transparency = image.color().has_alpha() && rgba.pixels().any(|p| p[3] < 255);

        let fitted = if rgba.dimensions() == (width, height) {
            rgba
        } else {
            imageops::resize(&rgba, width, height, self.filter.to_filter_type())
        };

        debug!("Normalized {} ({:?}, {}x{} -> {}x{}, transparency: {})",
               label, format, source_dimensions.0, source_dimensions.1,
               width, height, has_transparency);

        Ok(NormalizedImage {
            buffer: CanonicalBuffer::new(fitted),
            has_transparency,
            source_dimensions,
        })
    }

    fn check_dimensions(&self, (width, height): (u32, u32)) -> Result<()> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(QuotaError::DimensionsTooLarge { width, height, max: self.max_dimension }.into());
        }
        Ok(())
    }

    fn header_dimensions(label: &str, bytes: &[u8], format: ImageFormat) -> Result<(u32, u32)> {
        let reader = image::io::Reader::with_format(Cursor::new(bytes), format);
        reader.into_dimensions().map_err(|e| Self::decode_error(label, e))
    }

    fn detect_format(label: &str, bytes: &[u8]) -> Result<ImageFormat> {
        let format = image::guess_format(bytes).map_err(|_| DecodeError::UnsupportedFormat {
            frame: label.to_string(),
            format: "unknown".to_string(),
        })?;

        match format {
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP => Ok(format),
            other => Err(DecodeError::UnsupportedFormat {
                frame: label.to_string(),
                format: format!("{:?}", other),
            }.into()),
        }
    }

    fn decode_error(label: &str, error: ImageError) -> crate::ForgeError {
        match error {
            ImageError::Unsupported(e) => DecodeError::UnsupportedFormat {
                frame: label.to_string(),
                format: e.to_string(),
            }.into(),
            other => DecodeError::Corrupt {
                frame: label.to_string(),
                reason: other.to_string(),
            }.into(),
        }
    }
}
