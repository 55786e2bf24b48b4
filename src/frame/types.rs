use image::{ImageBuffer, Rgba, RgbaImage, RgbImage};

/// A fixed-size RGBA pixel grid used for all compositing
///
/// This is a thin wrapper around an RGBA image buffer. Every buffer taking part in one
/// render has the same dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalBuffer {
    buffer: RgbaImage,
}

impl CanonicalBuffer {
    /// Create a new buffer from an RGBA image
    pub fn new(buffer: RgbaImage) -> Self {
        Self { buffer }
    }

    /// Create a buffer of the given dimensions filled with one colour
    pub fn new_filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(width, height, Rgba(color)),
        }
    }

    /// Create a fully transparent buffer
    pub fn new_transparent(width: u32, height: u32) -> Self {
        Self::new_filled(width, height, [0, 0, 0, 0])
    }

    /// Build a buffer pixel by pixel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        Self {
            buffer: ImageBuffer::from_fn(width, height, |x, y| Rgba(f(x, y))),
        }
    }

    /// Create a buffer from raw row-major RGBA bytes
    pub fn from_rgba_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        self.buffer.put_pixel(x, y, Rgba(color));
    }

    /// Raw row-major RGBA bytes
    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn into_image(self) -> RgbaImage {
        self.buffer
    }

    /// Whether any pixel is less than fully opaque
    pub fn has_transparency(&self) -> bool {
        self.buffer.pixels().any(|p| p[3] < 255)
    }

    /// Bytes held by a buffer of the given size
    pub fn byte_size(width: u32, height: u32) -> u64 {
        u64::from(width) * u64::from(height) * 4
    }
}

/// A frame in the colour model the encoder consumes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReducedBuffer {
    /// Flattened onto the background colour, no alpha channel
    Rgb(RgbImage),

    /// Alpha is either 0 or 255. Transparent pixels are `[0, 0, 0, 0]`.
    BinaryAlpha(RgbaImage),
}

impl ReducedBuffer {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Rgb(image) => image.dimensions(),
            Self::BinaryAlpha(image) => image.dimensions(),
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::BinaryAlpha(_))
    }

    /// Raw row-major bytes, 3 or 4 per pixel depending on the variant
    pub fn as_raw(&self) -> &[u8] {
        match self {
            Self::Rgb(image) => image.as_raw(),
            Self::BinaryAlpha(image) => image.as_raw(),
        }
    }
}

/// One output frame and how long it is shown
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFrame {
    pub buffer: ReducedBuffer,
    pub duration_ms: u32,
}

impl RenderedFrame {
    pub fn new(buffer: ReducedBuffer, duration_ms: u32) -> Self {
        Self { buffer, duration_ms }
    }
}
